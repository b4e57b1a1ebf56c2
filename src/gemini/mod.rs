//! Gemini generative API integration.
//!
//! Image edits are a single `generateContent` call. Video generation submits a
//! long-running operation, polls it until done, and signs the resulting URL
//! with the API key so it can be played directly.

mod client;
mod error;
mod image;
mod poll;
mod request;
mod types;
mod video;

pub use client::{
    GeminiClient, DEFAULT_IMAGE_MODEL, DEFAULT_TIMEOUT, DEFAULT_VIDEO_MODEL, GEMINI_API_BASE_URL,
};
pub use error::GenerationError;
pub use image::{build_edit_request, masked_instruction, parse_edit_response, MASK_MIME_TYPE};
pub use poll::{poll_until_done, PollPolicy, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL};
pub use request::{
    AspectRatio, EditedImage, GenerationOutput, GenerationRequest, ImageEditRequest, InlineImage,
    SignedVideoUrl, VideoRequest,
};
pub use types::{
    Candidate, Content, GenerateContentRequest, GenerateContentResponse, InlineData, Operation,
    OperationError, Part, PredictLongRunningRequest, SafetyRating,
};
pub use video::{build_video_request, extract_video_uri, resolve_completed};
