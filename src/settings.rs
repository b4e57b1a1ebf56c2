//! Headless controller for viewing and editing the stored API key.
//!
//! The panel holds a draft value and a visibility toggle. Rendering is left
//! to the front end; the `key` subcommands drive it from the command line.

use std::time::Duration;

use crate::credentials::{CredentialError, CredentialStore};

/// Validation message shown when saving a blank key.
pub const API_KEY_REQUIRED_MESSAGE: &str = "Please enter your API key.";

/// Confirmation shown after a successful save.
pub const SAVED_MESSAGE: &str = "API Key saved successfully!";

/// Where users can obtain a Gemini API key.
pub const GET_API_KEY_URL: &str = "https://aistudio.google.com/apikey";

/// Pause between a successful save and closing the panel.
pub const SAVE_CONFIRM_DELAY: Duration = Duration::from_secs(1);

/// Characters of the key left visible at each end when masked.
const MASK_VISIBLE_CHARS: usize = 4;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Please enter your API key.")]
    KeyRequired,

    #[error(transparent)]
    Save(#[from] CredentialError),
}

/// Draft state for the API key settings.
pub struct SettingsPanel {
    store: CredentialStore,
    draft: String,
    revealed: bool,
}

impl SettingsPanel {
    /// Open the panel, prefilled with the stored key.
    pub fn open(store: CredentialStore) -> Self {
        let draft = store.get().unwrap_or_default();
        Self {
            store,
            draft,
            revealed: false,
        }
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, value: impl Into<String>) {
        self.draft = value.into();
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// Flip between showing the raw key and the masked one.
    pub fn toggle_visibility(&mut self) {
        self.revealed = !self.revealed;
    }

    /// The draft as it should be displayed.
    pub fn display_value(&self) -> String {
        if self.revealed {
            self.draft.clone()
        } else {
            mask_key(&self.draft)
        }
    }

    /// Whether the save action should be enabled.
    pub fn can_save(&self) -> bool {
        !self.draft.trim().is_empty()
    }

    /// Validate and persist the draft.
    ///
    /// The trimmed value is what gets stored. A blank draft is rejected
    /// without touching the store.
    pub fn save(&mut self) -> Result<(), SettingsError> {
        let value = self.draft.trim();
        if value.is_empty() {
            return Err(SettingsError::KeyRequired);
        }

        self.store.set(value)?;
        self.draft = value.to_string();
        log::info!("API key saved");
        Ok(())
    }

    /// Save, wait `SAVE_CONFIRM_DELAY`, then notify the caller.
    ///
    /// `on_saved` is not called when saving fails.
    pub async fn save_and_close(
        &mut self,
        on_saved: impl FnOnce(),
    ) -> Result<(), SettingsError> {
        self.save()?;
        tokio::time::sleep(SAVE_CONFIRM_DELAY).await;
        on_saved();
        Ok(())
    }
}

/// Mask a key for display, keeping a few characters at each end.
///
/// Short keys are fully masked.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= MASK_VISIBLE_CHARS * 2 {
        return "*".repeat(chars.len());
    }

    let head: String = chars[..MASK_VISIBLE_CHARS].iter().collect();
    let tail: String = chars[chars.len() - MASK_VISIBLE_CHARS..].iter().collect();
    format!(
        "{}{}{}",
        head,
        "*".repeat(chars.len() - MASK_VISIBLE_CHARS * 2),
        tail
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::MemoryBackend;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_open_prefills_stored_key() {
        let store = CredentialStore::in_memory();
        store.set("AIzaStored").unwrap();
        let panel = SettingsPanel::open(store);
        assert_eq!(panel.draft(), "AIzaStored");
        assert!(!panel.is_revealed());
    }

    #[test]
    fn test_open_on_empty_store_has_blank_draft() {
        let panel = SettingsPanel::open(CredentialStore::in_memory());
        assert_eq!(panel.draft(), "");
        assert!(!panel.can_save());
    }

    #[test]
    fn test_save_trims_value() {
        let store = CredentialStore::in_memory();
        let mut panel = SettingsPanel::open(store.clone());
        panel.set_draft("  AIzaPadded \n");
        panel.save().unwrap();
        assert_eq!(store.get(), Some("AIzaPadded".to_string()));
        assert_eq!(panel.draft(), "AIzaPadded");
    }

    #[test]
    fn test_blank_draft_is_rejected_without_writing() {
        let store = CredentialStore::in_memory();
        store.set("previous").unwrap();
        let mut panel = SettingsPanel::open(store.clone());
        panel.set_draft("   ");

        let err = panel.save().unwrap_err();
        assert!(matches!(err, SettingsError::KeyRequired));
        assert_eq!(err.to_string(), API_KEY_REQUIRED_MESSAGE);
        assert_eq!(store.get(), Some("previous".to_string()));
    }

    #[test]
    fn test_store_failure_surfaces() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set_failing(true);
        let store = CredentialStore::new(None, backend);
        let mut panel = SettingsPanel::open(store);
        panel.set_draft("key");

        let err = panel.save().unwrap_err();
        assert!(matches!(err, SettingsError::Save(CredentialError::Unavailable { .. })));
        assert!(err.to_string().starts_with("Failed to save API key"));
    }

    #[test]
    fn test_toggle_visibility_switches_display() {
        let mut panel = SettingsPanel::open(CredentialStore::in_memory());
        panel.set_draft("AIzaSyABCDEFGH");
        assert_eq!(panel.display_value(), "AIza******EFGH");

        panel.toggle_visibility();
        assert_eq!(panel.display_value(), "AIzaSyABCDEFGH");

        panel.toggle_visibility();
        assert!(!panel.is_revealed());
    }

    #[test]
    fn test_mask_key_short_values() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key("12345678"), "********");
        assert_eq!(mask_key("123456789"), "1234*6789");
    }

    #[tokio::test]
    async fn test_save_and_close_waits_before_notifying() {
        let store = CredentialStore::in_memory();
        let mut panel = SettingsPanel::open(store.clone());
        panel.set_draft("AIzaNew");

        let closed = AtomicBool::new(false);
        let started = std::time::Instant::now();
        panel
            .save_and_close(|| closed.store(true, Ordering::SeqCst))
            .await
            .unwrap();

        assert!(closed.load(Ordering::SeqCst));
        assert!(started.elapsed() >= SAVE_CONFIRM_DELAY);
        assert_eq!(store.get(), Some("AIzaNew".to_string()));
    }

    #[tokio::test]
    async fn test_save_and_close_skips_callback_on_error() {
        let mut panel = SettingsPanel::open(CredentialStore::in_memory());
        let mut closed = false;
        let result = panel.save_and_close(|| closed = true).await;
        assert!(result.is_err());
        assert!(!closed);
    }
}
