//! CredentialStore - reads and writes the API key across a primary and a
//! mirror backend.

use std::sync::Arc;

use super::backend::{BackendKind, CredentialBackend, DesktopStore, LocalStorage, MemoryBackend};
use super::error::CredentialError;
use crate::config::CredentialsConfig;

/// Access to the single stored API key.
///
/// Reads prefer the primary backend and fall back to the secondary one.
/// Writes go to both, so the secondary always mirrors the latest value.
#[derive(Clone)]
pub struct CredentialStore {
    primary: Option<Arc<dyn CredentialBackend>>,
    secondary: Arc<dyn CredentialBackend>,
}

impl CredentialStore {
    /// Build a store from explicit backends.
    pub fn new(
        primary: Option<Arc<dyn CredentialBackend>>,
        secondary: Arc<dyn CredentialBackend>,
    ) -> Self {
        Self { primary, secondary }
    }

    /// Build the store selected by configuration.
    ///
    /// `Desktop` uses the settings document as primary with local storage as
    /// mirror; `Browser` uses local storage alone. A configured `store_dir`
    /// replaces both platform directories.
    pub fn from_config(config: &CredentialsConfig) -> Result<Self, CredentialError> {
        let local: Arc<dyn CredentialBackend> = match &config.store_dir {
            Some(dir) => Arc::new(LocalStorage::new(dir.join("local-storage"))),
            None => Arc::new(LocalStorage::with_default_dir()?),
        };

        let primary = match config.backend {
            BackendKind::Desktop => {
                let desktop: Arc<dyn CredentialBackend> = match &config.store_dir {
                    Some(dir) => Arc::new(DesktopStore::new(dir)),
                    None => Arc::new(DesktopStore::with_default_dir()?),
                };
                Some(desktop)
            }
            BackendKind::Browser => None,
        };

        log::debug!(
            "Credential store: primary={}, secondary={}",
            primary.as_ref().map(|b| b.name()).unwrap_or("none"),
            local.name()
        );

        Ok(Self::new(primary, local))
    }

    /// An ephemeral store backed by memory only.
    pub fn in_memory() -> Self {
        Self::new(None, Arc::new(MemoryBackend::new()))
    }

    /// Get the stored API key, if any.
    ///
    /// Never fails: backend errors are logged and treated as absence after
    /// the fallback has been tried.
    pub fn get(&self) -> Option<String> {
        if let Some(primary) = &self.primary {
            match primary.read() {
                Ok(Some(key)) => return Some(key),
                Ok(None) => {}
                Err(e) => log::warn!("Failed to get API key from {} store: {}", primary.name(), e),
            }
        }

        match self.secondary.read() {
            Ok(key) => key,
            Err(e) => {
                log::warn!(
                    "Failed to get API key from {} store: {}",
                    self.secondary.name(),
                    e
                );
                None
            }
        }
    }

    /// Store the API key in every backend.
    ///
    /// # Errors
    ///
    /// Returns `CredentialError::Unavailable` only if no backend accepted the
    /// write. A single failing backend is logged and ignored.
    pub fn set(&self, value: &str) -> Result<(), CredentialError> {
        let mut failures = Vec::new();
        let mut saved = false;

        if let Some(primary) = &self.primary {
            match primary.write(value) {
                Ok(()) => saved = true,
                Err(e) => {
                    log::warn!("Failed to save API key to {} store: {}", primary.name(), e);
                    failures.push(format!("{}: {}", primary.name(), e));
                }
            }
        }

        match self.secondary.write(value) {
            Ok(()) => saved = true,
            Err(e) => {
                log::warn!(
                    "Failed to save API key to {} store: {}",
                    self.secondary.name(),
                    e
                );
                failures.push(format!("{}: {}", self.secondary.name(), e));
            }
        }

        if saved {
            Ok(())
        } else {
            log::error!("API key could not be saved to any store");
            Err(CredentialError::Unavailable { failures })
        }
    }

    /// Whether a non-blank API key is stored.
    pub fn has(&self) -> bool {
        self.get().is_some_and(|key| !key.trim().is_empty())
    }
}
