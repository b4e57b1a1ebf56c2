//! Video generation request construction and result extraction.

use serde_json::Value;

use super::error::GenerationError;
use super::request::{SignedVideoUrl, VideoRequest};
use super::types::{
    Operation, PredictLongRunningRequest, VideoImage, VideoInstance, VideoParameters,
};

/// Number of videos requested per generation.
const VIDEOS_PER_REQUEST: u32 = 1;

/// Maximum number of characters of the raw response quoted in errors.
const RESPONSE_EXCERPT_CHARS: usize = 500;

/// Places where a completed operation has been seen to carry the video URI,
/// in lookup order. The API has moved this field between versions.
const VIDEO_URI_POINTERS: &[&str] = &[
    "/response/generatedVideos/0/video/uri",
    "/response/videos/0/uri",
    "/result/generatedVideos/0/video/uri",
    "/metadata/generatedVideos/0/video/uri",
    "/response/generateVideoResponse/generatedSamples/0/video/uri",
];

pub const FALLBACK_OPERATION_ERROR: &str = "Video generation failed during operation.";

/// Build the `predictLongRunning` body for a video request.
pub fn build_video_request(request: &VideoRequest) -> PredictLongRunningRequest {
    PredictLongRunningRequest {
        instances: vec![VideoInstance {
            prompt: request.prompt.clone(),
            image: request.image.as_ref().map(|image| VideoImage {
                bytes_base64_encoded: image.data.clone(),
                mime_type: image.mime_type.clone(),
            }),
        }],
        parameters: VideoParameters {
            aspect_ratio: request.aspect_ratio.as_str().to_string(),
            sample_count: VIDEOS_PER_REQUEST,
        },
    }
}

/// Find the video URI of a completed operation, trying each known shape.
pub fn extract_video_uri(operation: &Operation) -> Option<&str> {
    // Pointers are rooted at the operation, whose unknown fields live in `payload`.
    VIDEO_URI_POINTERS.iter().find_map(|pointer| {
        let (top, rest) = pointer[1..].split_once('/')?;
        operation
            .payload
            .get(top)?
            .pointer(&format!("/{}", rest))
            .and_then(Value::as_str)
            .filter(|uri| !uri.is_empty())
    })
}

/// Turn a completed operation into a signed video URL.
///
/// # Errors
///
/// Returns `OperationFailed` if the operation carries an error payload and
/// `NoVideoLink` if no known shape holds a URI.
pub fn resolve_completed(
    operation: &Operation,
    api_key: &str,
) -> Result<SignedVideoUrl, GenerationError> {
    if let Some(error) = &operation.error {
        let message = error
            .message
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| FALLBACK_OPERATION_ERROR.to_string());
        return Err(GenerationError::OperationFailed(message));
    }

    match extract_video_uri(operation) {
        Some(uri) => Ok(SignedVideoUrl::sign(uri, api_key)),
        None => {
            let response = response_excerpt(operation);
            log::error!("Completed operation {} has no video URI: {}", operation.name, response);
            Err(GenerationError::NoVideoLink { response })
        }
    }
}

/// Pretty-printed `response` field (or the whole operation when absent),
/// cut to the first 500 characters.
fn response_excerpt(operation: &Operation) -> String {
    let dump = match operation.payload.get("response") {
        Some(response) => serde_json::to_string_pretty(response),
        None => serde_json::to_string_pretty(operation),
    }
    .unwrap_or_default();

    dump.chars().take(RESPONSE_EXCERPT_CHARS).collect()
}
