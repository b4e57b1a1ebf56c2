//! Persistence backends for the stored API key.
//!
//! Two durable backends mirror the two environments the key can live in: a
//! desktop JSON settings document and a browser-style flat local storage. A
//! memory backend exists for tests and ephemeral sessions.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::CredentialError;

/// File name of the desktop settings document. Must stay stable across versions.
pub const STORE_FILE: &str = "settings.json";

/// Key of the API key inside the desktop settings document.
pub const API_KEY_KEY: &str = "gemini_api_key";

/// Local storage key holding the API key. Must stay stable across versions.
pub const LOCALSTORAGE_KEY: &str = "nano_bananary_api_key";

/// Application directory name under the platform config/data directories.
pub const APP_DIR: &str = "nano-bananary";

/// Which persistence environment the store runs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Desktop settings document, mirrored into local storage.
    #[default]
    Desktop,
    /// Local storage only.
    Browser,
}

/// A single-secret key-value backend.
pub trait CredentialBackend: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &'static str;

    /// Read the stored key, `Ok(None)` if nothing is stored.
    fn read(&self) -> Result<Option<String>, CredentialError>;

    /// Overwrite the stored key.
    fn write(&self, value: &str) -> Result<(), CredentialError>;
}

/// Durable JSON document on disk, opened lazily and autosaved on every write.
pub struct DesktopStore {
    path: PathBuf,
    document: Mutex<Option<Map<String, Value>>>,
}

impl DesktopStore {
    /// Create a store whose document lives at `<dir>/settings.json`.
    /// Does not touch the filesystem until first use.
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(STORE_FILE),
            document: Mutex::new(None),
        }
    }

    /// Create a store in the platform config directory.
    /// Default: ~/.config/nano-bananary/settings.json
    pub fn with_default_dir() -> Result<Self, CredentialError> {
        let dir = dirs::config_dir().ok_or(CredentialError::NoDirectory)?;
        Ok(Self::new(&dir.join(APP_DIR)))
    }

    /// Path of the settings document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<Map<String, Value>, CredentialError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(CredentialError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        serde_json::from_str(&content).map_err(|e| CredentialError::Json {
            path: path.to_path_buf(),
            source: e,
        })
    }

    fn with_document<T>(
        &self,
        f: impl FnOnce(&mut Map<String, Value>) -> Result<T, CredentialError>,
    ) -> Result<T, CredentialError> {
        let mut guard = self
            .document
            .lock()
            .map_err(|_| CredentialError::BackendUnavailable("desktop"))?;

        if guard.is_none() {
            log::debug!("Opening desktop store at {}", self.path.display());
            *guard = Some(Self::load(&self.path)?);
        }

        f(guard.get_or_insert_with(Map::new))
    }
}

impl CredentialBackend for DesktopStore {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn read(&self) -> Result<Option<String>, CredentialError> {
        self.with_document(|doc| {
            Ok(doc
                .get(API_KEY_KEY)
                .and_then(Value::as_str)
                .map(str::to_string))
        })
    }

    fn write(&self, value: &str) -> Result<(), CredentialError> {
        self.with_document(|doc| {
            // The cached document only changes once the new one is on disk.
            let mut updated = doc.clone();
            updated.insert(API_KEY_KEY.to_string(), Value::String(value.to_string()));
            let content =
                serde_json::to_string_pretty(&updated).map_err(|e| CredentialError::Json {
                    path: self.path.clone(),
                    source: e,
                })?;
            write_private(&self.path, &content)?;
            *doc = updated;
            Ok(())
        })
    }
}

/// Browser-style local storage: one file per key under a directory.
pub struct LocalStorage {
    dir: PathBuf,
}

impl LocalStorage {
    /// Create a local storage rooted at `dir`.
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Create a local storage in the platform data directory.
    /// Default: ~/.local/share/nano-bananary/local-storage/
    pub fn with_default_dir() -> Result<Self, CredentialError> {
        let dir = dirs::data_dir().ok_or(CredentialError::NoDirectory)?;
        Ok(Self::new(dir.join(APP_DIR).join("local-storage")))
    }

    fn entry_path(&self) -> PathBuf {
        self.dir.join(LOCALSTORAGE_KEY)
    }
}

impl CredentialBackend for LocalStorage {
    fn name(&self) -> &'static str {
        "local-storage"
    }

    fn read(&self) -> Result<Option<String>, CredentialError> {
        let path = self.entry_path();
        match std::fs::read_to_string(&path) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(CredentialError::Io { path, source: e }),
        }
    }

    fn write(&self, value: &str) -> Result<(), CredentialError> {
        write_private(&self.entry_path(), value)
    }
}

/// In-process backend. Can be switched into a failing mode to simulate an
/// unavailable environment.
#[derive(Default)]
pub struct MemoryBackend {
    value: Mutex<Option<String>>,
    failing: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend that already holds `value`.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: Mutex::new(Some(value.to_string())),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent read and write fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), CredentialError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CredentialError::BackendUnavailable("memory"))
        } else {
            Ok(())
        }
    }
}

impl CredentialBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn read(&self) -> Result<Option<String>, CredentialError> {
        self.check()?;
        let guard = self
            .value
            .lock()
            .map_err(|_| CredentialError::BackendUnavailable("memory"))?;
        Ok(guard.clone())
    }

    fn write(&self, value: &str) -> Result<(), CredentialError> {
        self.check()?;
        let mut guard = self
            .value
            .lock()
            .map_err(|_| CredentialError::BackendUnavailable("memory"))?;
        *guard = Some(value.to_string());
        Ok(())
    }
}

/// Write `contents` to `path`, creating parent directories. On unix the file is
/// readable by its owner only.
fn write_private(path: &Path, contents: &str) -> Result<(), CredentialError> {
    let io_err = |e| CredentialError::Io {
        path: path.to_path_buf(),
        source: e,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    std::fs::write(path, contents).map_err(io_err)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)).map_err(io_err)?;
    }

    Ok(())
}
