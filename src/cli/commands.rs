//! Subcommand handlers for key management, image edits and video generation.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use super::args::KeyAction;
use super::enums::Aspect;
use crate::config::Config;
use crate::credentials::CredentialStore;
use crate::gemini::{GenerationError, ImageEditRequest, VideoRequest};
use crate::media;
use crate::session::GenerationSession;
use crate::settings::{SettingsPanel, GET_API_KEY_URL, SAVED_MESSAGE};

/// Appended to errors caused by a missing key.
fn missing_key_hint() -> String {
    format!(
        "\n\nSave your key with:\n    nano-bananary key set <KEY>\n\nGet an API key at: {}",
        GET_API_KEY_URL
    )
}

fn describe(e: GenerationError) -> String {
    if e.is_missing_credential() {
        format!("{}{}", e, missing_key_hint())
    } else {
        e.to_string()
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create async runtime: {}", e))
}

/// Handle `key` subcommand actions.
pub fn handle_key_action(action: KeyAction, config: &Config) -> Result<(), String> {
    let store = CredentialStore::from_config(&config.credentials).map_err(|e| e.to_string())?;
    let mut panel = SettingsPanel::open(store);

    match action {
        KeyAction::Set { key } => {
            let key = match key {
                Some(k) => k,
                None => read_key_from_stdin()?,
            };
            panel.set_draft(key);

            let rt = runtime()?;
            rt.block_on(panel.save_and_close(|| println!("{}", SAVED_MESSAGE)))
                .map_err(|e| e.to_string())?;
        }
        KeyAction::Show { reveal } => {
            if panel.draft().is_empty() {
                println!("No API key stored.");
                println!("Get an API key at: {}", GET_API_KEY_URL);
                return Ok(());
            }
            if reveal {
                panel.toggle_visibility();
            }
            println!("{}", panel.display_value());
        }
        KeyAction::Status => {
            if panel.can_save() {
                println!("API key: configured");
            } else {
                println!("API key: not configured");
                println!("Get an API key at: {}", GET_API_KEY_URL);
            }
        }
    }

    Ok(())
}

fn read_key_from_stdin() -> Result<String, String> {
    eprint!("Enter your Gemini API key: ");
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| format!("Failed to read API key from stdin: {}", e))?;
    Ok(line)
}

/// Default output path for an edit: `<stem>-edited.<ext>` beside the input.
pub fn default_edit_output(image: &Path, extension: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    image.with_file_name(format!("{}-edited.{}", stem, extension))
}

/// Run an image edit and write the result to disk.
pub fn run_edit(
    config: &Config,
    image: &Path,
    prompt: &str,
    mask: Option<&Path>,
    reference: Option<&Path>,
    output: Option<&Path>,
) -> Result<(), String> {
    let session = GenerationSession::from_config(config).map_err(|e| e.to_string())?;

    let mut request =
        ImageEditRequest::new(media::load_inline_image(image).map_err(|e| e.to_string())?, prompt);
    if let Some(mask) = mask {
        request = request.with_mask(media::load_mask(mask).map_err(|e| e.to_string())?);
    }
    if let Some(reference) = reference {
        request =
            request.with_secondary(media::load_inline_image(reference).map_err(|e| e.to_string())?);
    }

    let rt = runtime()?;
    let edited = rt.block_on(session.edit_image(request)).map_err(describe)?;

    let dest = match output {
        Some(path) => path.to_path_buf(),
        None => {
            let mime = edited.parts().map(|(mime, _)| mime).unwrap_or("image/png");
            default_edit_output(image, media::extension_for_mime(mime))
        }
    };
    let written = media::save_edited_image(&edited, &dest).map_err(|e| e.to_string())?;

    println!("Saved edited image to {}", written.display());
    if let Some(text) = &edited.text {
        println!();
        println!("{}", text);
    }
    Ok(())
}

/// Run a video generation, printing progress as it goes.
///
/// Ctrl+C stops submission, polling or the download; a submitted job keeps
/// running on the server.
pub fn run_video(
    config: &Config,
    prompt: &str,
    image: Option<&Path>,
    aspect: Aspect,
    output: Option<&Path>,
) -> Result<(), String> {
    let session = GenerationSession::from_config(config).map_err(|e| e.to_string())?;

    let mut request = VideoRequest::new(prompt, aspect.into());
    if let Some(image) = image {
        request = request.with_image(media::load_inline_image(image).map_err(|e| e.to_string())?);
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\nReceived Ctrl+C, cancelling...");
        on_interrupt.cancel();
    })
    .map_err(|e| format!("Failed to set Ctrl+C handler: {}", e))?;

    let rt = runtime()?;
    rt.block_on(async {
        let url = session
            .generate_video(request, |message| eprintln!("{}", message), &cancel)
            .await
            .map_err(describe)?;

        match output {
            Some(dest) => {
                let path = session
                    .download_video(&url, dest, &cancel)
                    .await
                    .map_err(describe)?;
                println!("Saved video to {}", path.display());
            }
            None => println!("{}", url),
        }
        Ok(())
    })
}
