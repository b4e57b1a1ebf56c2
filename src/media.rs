//! Loading images from disk as inline payloads and writing results back.

use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::gemini::{EditedImage, InlineImage};

/// Extensions accepted as image input, with their MIME types.
const IMAGE_TYPES: &[(&str, &str)] = &[
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("heic", "image/heic"),
    ("heif", "image/heif"),
];

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported image type '{}' (expected png, jpg, webp, gif, heic)", .0.display())]
    UnsupportedType(PathBuf),

    #[error("Edited image is not a base64 data URI")]
    NotDataUri,

    #[error("Edited image data is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
}

/// MIME type for an image path, judged by its extension.
pub fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    IMAGE_TYPES
        .iter()
        .find(|(candidate, _)| *candidate == ext)
        .map(|(_, mime)| *mime)
}

/// File extension to use when saving an image of the given MIME type.
pub fn extension_for_mime(mime: &str) -> &'static str {
    IMAGE_TYPES
        .iter()
        .find(|(_, candidate)| *candidate == mime)
        .map(|(ext, _)| *ext)
        .unwrap_or("png")
}

/// Read an image file and base64-encode it.
pub fn load_inline_image(path: &Path) -> Result<InlineImage, MediaError> {
    let mime = mime_for_path(path).ok_or_else(|| MediaError::UnsupportedType(path.to_path_buf()))?;
    let bytes = std::fs::read(path).map_err(|e| MediaError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::debug!("Loaded {} ({} bytes, {})", path.display(), bytes.len(), mime);
    Ok(InlineImage::new(STANDARD.encode(bytes), mime))
}

/// Read a mask file and base64-encode it. Masks are always sent as PNG.
pub fn load_mask(path: &Path) -> Result<String, MediaError> {
    let bytes = std::fs::read(path).map_err(|e| MediaError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(STANDARD.encode(bytes))
}

/// Decode an edited image and write it to `dest`, creating parent
/// directories as needed.
pub fn save_edited_image(image: &EditedImage, dest: &Path) -> Result<PathBuf, MediaError> {
    let (_, data) = image.parts().ok_or(MediaError::NotDataUri)?;
    let bytes = STANDARD.decode(data)?;

    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| MediaError::Write {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    std::fs::write(dest, bytes).map_err(|e| MediaError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;
    Ok(dest.to_path_buf())
}
