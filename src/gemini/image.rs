//! Image edit request construction and response validation.

use super::error::GenerationError;
use super::request::{EditedImage, ImageEditRequest};
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, Part,
};

/// Masks are always sent as PNG.
pub const MASK_MIME_TYPE: &str = "image/png";

/// Finish reason reported when a response was blocked by safety filters.
const FINISH_REASON_SAFETY: &str = "SAFETY";

/// Response modalities requested for image edits.
const RESPONSE_MODALITIES: &[&str] = &["IMAGE", "TEXT"];

/// Rewrite an instruction so it only applies to the masked region.
pub fn masked_instruction(instruction: &str) -> String {
    format!(
        "Apply the following instruction only to the masked area of the image: \"{}\". Preserve the unmasked area.",
        instruction
    )
}

/// Build the `generateContent` body for an image edit.
///
/// Parts are ordered: source image, mask, secondary image, instruction.
pub fn build_edit_request(request: &ImageEditRequest) -> GenerateContentRequest {
    let mut parts = vec![Part::inline(
        request.image.data.clone(),
        request.image.mime_type.clone(),
    )];

    let instruction = match &request.mask {
        Some(mask) => {
            parts.push(Part::inline(mask.clone(), MASK_MIME_TYPE));
            masked_instruction(&request.instruction)
        }
        None => request.instruction.clone(),
    };

    if let Some(secondary) = &request.secondary {
        parts.push(Part::inline(
            secondary.data.clone(),
            secondary.mime_type.clone(),
        ));
    }

    parts.push(Part::text(instruction));

    GenerateContentRequest {
        contents: vec![Content { role: None, parts }],
        generation_config: GenerationConfig {
            response_modalities: RESPONSE_MODALITIES.iter().map(|m| m.to_string()).collect(),
        },
    }
}

/// Turn a `generateContent` response into an edited image.
///
/// # Errors
///
/// A response without an image part always fails:
/// - `ModelResponded` when the model returned text instead,
/// - `SafetyBlocked` when the first candidate finished for safety reasons,
/// - `NoImage` otherwise.
pub fn parse_edit_response(
    response: &GenerateContentResponse,
) -> Result<EditedImage, GenerationError> {
    let candidate = response.candidates.first();
    let parts = candidate
        .and_then(|c| c.content.as_ref())
        .map(|content| content.parts.as_slice())
        .unwrap_or_default();

    let mut text: Option<String> = None;
    let mut image_url: Option<String> = None;

    for part in parts {
        if let Some(part_text) = part.text.as_deref().filter(|t| !t.is_empty()) {
            text = Some(match text {
                Some(existing) => format!("{}\n{}", existing, part_text),
                None => part_text.to_string(),
            });
        } else if let Some(inline) = &part.inline_data {
            image_url = Some(format!("data:{};base64,{}", inline.mime_type, inline.data));
        }
    }

    if let Some(image_url) = image_url {
        return Ok(EditedImage { image_url, text });
    }

    if let Some(text) = text {
        return Err(GenerationError::ModelResponded(text));
    }

    if let Some(candidate) = candidate {
        if candidate.finish_reason.as_deref() == Some(FINISH_REASON_SAFETY) {
            let blocked: Vec<&str> = candidate
                .safety_ratings
                .iter()
                .filter(|r| r.blocked)
                .map(|r| r.category.as_str())
                .collect();
            let categories = if blocked.is_empty() {
                "Unknown".to_string()
            } else {
                blocked.join(", ")
            };
            return Err(GenerationError::SafetyBlocked { categories });
        }
    }

    Err(GenerationError::NoImage)
}
