//! Mock HTTP tests for GeminiClient.
//!
//! These tests cover:
//! - Request paths, headers and bodies
//! - Operation status fetches
//! - Error responses
//! - Video downloads

use nano_bananary::gemini::{
    build_edit_request, build_video_request, AspectRatio, GeminiClient, GenerationError,
    ImageEditRequest, InlineImage, SignedVideoUrl, VideoRequest, DEFAULT_IMAGE_MODEL,
    DEFAULT_VIDEO_MODEL,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::with_base_url("test-api-key".to_string(), server.uri()).unwrap()
}

// === generateContent ===

#[tokio::test]
async fn test_generate_content_sends_api_key_header() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", DEFAULT_IMAGE_MODEL)))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{"content": {"parts": [{"inlineData": {"mimeType": "image/png", "data": "OUT"}}]}}]
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = build_edit_request(&ImageEditRequest::new(
        InlineImage::new("SRC", "image/jpeg"),
        "add a hat",
    ));
    let response = client(&mock_server)
        .generate_content(DEFAULT_IMAGE_MODEL, &request)
        .await
        .unwrap();

    assert_eq!(response.candidates.len(), 1);
}

#[tokio::test]
async fn test_generate_content_sends_parts_in_order() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", DEFAULT_IMAGE_MODEL)))
        .and(body_json(serde_json::json!({
            "contents": [{
                "parts": [
                    {"inlineData": {"mimeType": "image/jpeg", "data": "SRC"}},
                    {"inlineData": {"mimeType": "image/png", "data": "MASK"}},
                    {"inlineData": {"mimeType": "image/webp", "data": "REF"}},
                    {"text": "Apply the following instruction only to the masked area of the image: \"add a hat\". Preserve the unmasked area."}
                ]
            }],
            "generationConfig": {"responseModalities": ["IMAGE", "TEXT"]}
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"candidates": []})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = build_edit_request(
        &ImageEditRequest::new(InlineImage::new("SRC", "image/jpeg"), "add a hat")
            .with_mask("MASK")
            .with_secondary(InlineImage::new("REF", "image/webp")),
    );
    let result = client(&mock_server)
        .generate_content(DEFAULT_IMAGE_MODEL, &request)
        .await;

    assert!(result.is_ok());
}

#[tokio::test]
async fn test_error_status_returns_api_error_with_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", DEFAULT_IMAGE_MODEL)))
        .respond_with(ResponseTemplate::new(429).set_body_string(
            r#"{"error":{"code":429,"message":"Quota exceeded","status":"RESOURCE_EXHAUSTED"}}"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request =
        build_edit_request(&ImageEditRequest::new(InlineImage::new("S", "image/png"), "x"));
    let err = client(&mock_server)
        .generate_content(DEFAULT_IMAGE_MODEL, &request)
        .await
        .unwrap_err();

    match err {
        GenerationError::Api { status, body } => {
            assert_eq!(status, 429);
            assert!(body.contains("RESOURCE_EXHAUSTED"));
        }
        other => panic!("Expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_json_returns_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:generateContent", DEFAULT_IMAGE_MODEL)))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let request =
        build_edit_request(&ImageEditRequest::new(InlineImage::new("S", "image/png"), "x"));
    let err = client(&mock_server)
        .generate_content(DEFAULT_IMAGE_MODEL, &request)
        .await
        .unwrap_err();

    assert!(matches!(err, GenerationError::InvalidResponse(_)));
}

// === predictLongRunning / operations ===

#[tokio::test]
async fn test_generate_videos_returns_operation() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(format!("/models/{}:predictLongRunning", DEFAULT_VIDEO_MODEL)))
        .and(header("x-goog-api-key", "test-api-key"))
        .and(body_json(serde_json::json!({
            "instances": [{
                "prompt": "a paper boat",
                "image": {"bytesBase64Encoded": "SEED", "mimeType": "image/png"}
            }],
            "parameters": {"aspectRatio": "9:16", "sampleCount": 1}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "models/veo-2.0-generate-001/operations/op-1"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let request = build_video_request(
        &VideoRequest::new("a paper boat", AspectRatio::Portrait)
            .with_image(InlineImage::new("SEED", "image/png")),
    );
    let operation = client(&mock_server)
        .generate_videos(DEFAULT_VIDEO_MODEL, &request)
        .await
        .unwrap();

    assert_eq!(operation.name, "models/veo-2.0-generate-001/operations/op-1");
    assert!(!operation.done);
}

#[tokio::test]
async fn test_get_operation_fetches_by_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/models/veo-2.0-generate-001/operations/op-2"))
        .and(header("x-goog-api-key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "models/veo-2.0-generate-001/operations/op-2",
            "done": true,
            "response": {"generatedVideos": [{"video": {"uri": "https://v/file"}}]}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let operation = client(&mock_server)
        .get_operation("models/veo-2.0-generate-001/operations/op-2")
        .await
        .unwrap();

    assert!(operation.done);
    assert!(operation.payload.contains_key("response"));
}

// === Video download ===

#[tokio::test]
async fn test_download_video_writes_file() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/video.mp4"))
        .and(query_param("key", "test-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"MP4DATA".to_vec()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("nested").join("out.mp4");
    let url = SignedVideoUrl::sign(
        &format!("{}/files/video.mp4", mock_server.uri()),
        "test-api-key",
    );

    let written = client(&mock_server).download_video(&url, &dest).await.unwrap();

    assert_eq!(written, dest);
    assert_eq!(std::fs::read(&dest).unwrap(), b"MP4DATA");
}

#[tokio::test]
async fn test_download_video_not_found_is_api_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/files/missing.mp4"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
        .mount(&mock_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("out.mp4");
    let url = SignedVideoUrl::sign(&format!("{}/files/missing.mp4", mock_server.uri()), "k");

    let err = client(&mock_server).download_video(&url, &dest).await.unwrap_err();

    assert!(matches!(err, GenerationError::Api { status: 404, .. }));
    assert!(!dest.exists());
}
