//! GeminiClient - handles communication with the Gemini REST API.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::AsyncWriteExt;

use super::error::GenerationError;
use super::request::SignedVideoUrl;
use super::types::{
    GenerateContentRequest, GenerateContentResponse, Operation, PredictLongRunningRequest,
};

/// Default base URL for the Gemini API.
pub const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default model for image editing.
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";

/// Default model for video generation.
pub const DEFAULT_VIDEO_MODEL: &str = "veo-2.0-generate-001";

/// Header carrying the API key.
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Default timeout for HTTP requests (120 seconds, image edits are slow).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default connection timeout (10 seconds).
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Gemini API, bound to one API key.
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiClient {
    /// Create a new GeminiClient against the public API.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::MissingCredential` if `api_key` is blank.
    pub fn with_api_key(api_key: String) -> Result<Self, GenerationError> {
        Self::with_options(api_key, GEMINI_API_BASE_URL.to_string(), DEFAULT_TIMEOUT)
    }

    /// Create a new GeminiClient with a custom base URL.
    ///
    /// Useful for testing against a mock server.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, GenerationError> {
        Self::with_options(api_key, base_url, DEFAULT_TIMEOUT)
    }

    /// Create a new GeminiClient with a custom base URL and request timeout.
    pub fn with_options(
        api_key: String,
        base_url: String,
        timeout: Duration,
    ) -> Result<Self, GenerationError> {
        if api_key.trim().is_empty() {
            return Err(GenerationError::MissingCredential);
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()?;

        Ok(Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Get the API key.
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Run a single `generateContent` call.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Api` with the raw body on a non-success
    /// status, `GenerationError::HttpError` if the request fails, or
    /// `GenerationError::InvalidResponse` if the body cannot be parsed.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GenerationError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        self.post_json(&url, request).await
    }

    /// Submit a video generation job and return its operation handle.
    pub async fn generate_videos(
        &self,
        model: &str,
        request: &PredictLongRunningRequest,
    ) -> Result<Operation, GenerationError> {
        let url = format!("{}/models/{}:predictLongRunning", self.base_url, model);
        self.post_json(&url, request).await
    }

    /// Fetch the current state of a long-running operation.
    ///
    /// `name` is the handle returned at submission, e.g.
    /// `models/veo-2.0-generate-001/operations/abc123`.
    pub async fn get_operation(&self, name: &str) -> Result<Operation, GenerationError> {
        let url = format!("{}/{}", self.base_url, name.trim_start_matches('/'));
        let request = self
            .http_client
            .get(&url)
            .header(API_KEY_HEADER, &self.api_key);
        Self::read_json(request).await
    }

    /// Download a generated video to disk.
    ///
    /// Streams the body to `dest` without holding the whole video in memory,
    /// creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::HttpError` if the download request fails,
    /// `GenerationError::IoError` if writing to disk fails, or
    /// `GenerationError::Api` if the server returns an error response.
    pub async fn download_video(
        &self,
        url: &SignedVideoUrl,
        dest: &Path,
    ) -> Result<PathBuf, GenerationError> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        log::info!("Downloading video from {}", url.unsigned());
        // reqwest errors carry the request URL, which here includes the key.
        let response = self
            .http_client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| GenerationError::HttpError(e.without_url()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();

        use futures_util::StreamExt;
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result.map_err(|e| GenerationError::HttpError(e.without_url()))?;
            file.write_all(&chunk).await?;
        }

        file.flush().await?;

        Ok(dest.to_path_buf())
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T, GenerationError> {
        let request = self
            .http_client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body);
        Self::read_json(request).await
    }

    async fn read_json<T: DeserializeOwned>(
        request: reqwest::RequestBuilder,
    ) -> Result<T, GenerationError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            log::warn!("Gemini API returned {}", status);
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
