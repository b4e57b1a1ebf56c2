//! GenerationError and the normalization applied before errors reach the UI.

use std::time::Duration;

use super::types::{ErrorBody, ErrorEnvelope};

/// Google API status for quota and rate limiting.
const STATUS_RESOURCE_EXHAUSTED: &str = "RESOURCE_EXHAUSTED";

/// Google API status used for unclassified server failures.
const STATUS_UNKNOWN: &str = "UNKNOWN";

const CODE_INTERNAL_SERVER_ERROR: i64 = 500;

/// Errors that can occur during image editing and video generation.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("API Key is not configured. Please set your Gemini API Key in Settings.")]
    MissingCredential,

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Non-success HTTP status with the raw response body.
    #[error("API request failed with status {status}: {body}")]
    Api { status: u16, body: String },

    /// Message unwrapped from a structured API error envelope.
    #[error("{0}")]
    Remote(String),

    #[error("You've likely exceeded the request limit. Please wait a moment before trying again.")]
    RateLimited,

    #[error("An unexpected server error occurred. This might be a temporary issue. Please try again in a few moments.")]
    ServerError,

    /// The model answered with text only.
    #[error("The model responded: \"{0}\"")]
    ModelResponded(String),

    #[error("The request was blocked for safety reasons. Categories: {categories}. Please modify your prompt or image.")]
    SafetyBlocked { categories: String },

    #[error("The model did not return an image. It might have refused the request. Please try a different image or prompt.")]
    NoImage,

    /// The long-running operation completed with an error payload.
    #[error("{0}")]
    OperationFailed(String),

    #[error("Video generation completed, but no download link was found. Response: {response}")]
    NoVideoLink {
        /// Truncated dump of the completed operation.
        response: String,
    },

    #[error("Invalid API response: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    #[error("Video generation did not finish after {attempts} status checks ({elapsed:?})")]
    PollTimeout { attempts: u32, elapsed: Duration },

    #[error("Video generation was cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("An unknown error occurred {0}.")]
    Unknown(&'static str),
}

impl GenerationError {
    /// Whether the caller should send the user to the settings screen.
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, GenerationError::MissingCredential)
    }

    /// Normalize an error raised while editing an image.
    ///
    /// Unwraps JSON error envelopes and maps quota exhaustion and internal
    /// server failures to actionable messages.
    pub fn normalize_for_image(self) -> Self {
        self.normalize(true, "while communicating with the API")
    }

    /// Normalize an error raised while generating a video.
    ///
    /// Only unwraps JSON error envelopes.
    pub fn normalize_for_video(self) -> Self {
        self.normalize(false, "during video generation")
    }

    fn normalize(self, remap_status: bool, context: &'static str) -> Self {
        let raw = match &self {
            GenerationError::Api { body, .. } => body.as_str(),
            GenerationError::Remote(message) | GenerationError::OperationFailed(message) => {
                message.as_str()
            }
            _ => return self,
        };

        if let Some(body) = parse_error_envelope(raw) {
            if remap_status {
                if body.status.as_deref() == Some(STATUS_RESOURCE_EXHAUSTED) {
                    return GenerationError::RateLimited;
                }
                if body.code == Some(CODE_INTERNAL_SERVER_ERROR)
                    || body.status.as_deref() == Some(STATUS_UNKNOWN)
                {
                    return GenerationError::ServerError;
                }
            }
            let message = body.message.unwrap_or_default();
            return match self {
                GenerationError::OperationFailed(_) => GenerationError::OperationFailed(message),
                _ => GenerationError::Remote(message),
            };
        }

        if raw.trim().is_empty() {
            return GenerationError::Unknown(context);
        }

        self
    }
}

/// Parse `text` as `{"error": {"message": ...}}`. Envelopes without a message
/// are not considered structured.
pub(crate) fn parse_error_envelope(text: &str) -> Option<ErrorBody> {
    let envelope: ErrorEnvelope = serde_json::from_str(text).ok()?;
    match envelope.error.message.as_deref() {
        Some(message) if !message.is_empty() => Some(envelope.error),
        _ => None,
    }
}
