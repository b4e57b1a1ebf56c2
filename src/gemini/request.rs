//! Generation requests and results as seen by callers.

use std::fmt;

/// A base64-encoded image with its MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub data: String,
    pub mime_type: String,
}

impl InlineImage {
    pub fn new(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// Edit an existing image following a text instruction.
#[derive(Debug, Clone)]
pub struct ImageEditRequest {
    pub image: InlineImage,
    /// Sent as-is unless a mask is present. May be empty.
    pub instruction: String,
    /// Base64 PNG restricting the edit to its painted region.
    pub mask: Option<String>,
    /// Optional reference image, e.g. an object to insert.
    pub secondary: Option<InlineImage>,
}

impl ImageEditRequest {
    pub fn new(image: InlineImage, instruction: impl Into<String>) -> Self {
        Self {
            image,
            instruction: instruction.into(),
            mask: None,
            secondary: None,
        }
    }

    pub fn with_mask(mut self, mask: impl Into<String>) -> Self {
        self.mask = Some(mask.into());
        self
    }

    pub fn with_secondary(mut self, secondary: InlineImage) -> Self {
        self.secondary = Some(secondary);
        self
    }
}

/// Aspect ratio of a generated video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AspectRatio {
    #[default]
    Landscape,
    Portrait,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "16:9" => Ok(AspectRatio::Landscape),
            "9:16" => Ok(AspectRatio::Portrait),
            other => Err(format!(
                "Unsupported aspect ratio '{}'. Use 16:9 or 9:16",
                other
            )),
        }
    }
}

/// Generate a video from a text prompt and an optional first frame.
#[derive(Debug, Clone)]
pub struct VideoRequest {
    pub prompt: String,
    pub image: Option<InlineImage>,
    pub aspect_ratio: AspectRatio,
}

impl VideoRequest {
    pub fn new(prompt: impl Into<String>, aspect_ratio: AspectRatio) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
            aspect_ratio,
        }
    }

    pub fn with_image(mut self, image: InlineImage) -> Self {
        self.image = Some(image);
        self
    }
}

/// Any request the session can run.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    ImageEdit(ImageEditRequest),
    Video(VideoRequest),
}

/// A successful image edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditedImage {
    /// `data:<mime>;base64,<data>`
    pub image_url: String,
    /// Text parts of the response joined by newlines.
    pub text: Option<String>,
}

impl EditedImage {
    /// MIME type and base64 payload of the data URI.
    pub fn parts(&self) -> Option<(&str, &str)> {
        let rest = self.image_url.strip_prefix("data:")?;
        let (mime, data) = rest.split_once(";base64,")?;
        Some((mime, data))
    }
}

/// A playable video URL carrying the API key as a query parameter.
///
/// `Debug` hides the key; `Display` and `as_str` expose the full URL, which
/// must not be logged or persisted.
#[derive(Clone, PartialEq, Eq)]
pub struct SignedVideoUrl {
    url: String,
    base_len: usize,
}

impl SignedVideoUrl {
    /// Append `key=<api_key>` to `locator`, using `&` when it already has a
    /// query string.
    pub fn sign(locator: &str, api_key: &str) -> Self {
        let separator = if locator.contains('?') { '&' } else { '?' };
        Self {
            url: format!("{}{}key={}", locator, separator, api_key),
            base_len: locator.len(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    /// The locator without the key.
    pub fn unsigned(&self) -> &str {
        &self.url[..self.base_len]
    }

    pub fn into_string(self) -> String {
        self.url
    }
}

impl fmt::Display for SignedVideoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

impl fmt::Debug for SignedVideoUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignedVideoUrl")
            .field("url", &format_args!("{}<key redacted>", self.unsigned()))
            .finish()
    }
}

/// Result of [`GenerationRequest`].
#[derive(Debug, Clone)]
pub enum GenerationOutput {
    Image(EditedImage),
    Video(SignedVideoUrl),
}
