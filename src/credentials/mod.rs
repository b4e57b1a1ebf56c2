//! API key persistence.
//!
//! The key is a single opaque string kept in one of two environments: a
//! desktop settings document or a browser-style local storage. The store
//! selected at startup reads from its primary backend and mirrors every write
//! into local storage.

mod backend;
mod error;
mod store;

pub use backend::{
    BackendKind, CredentialBackend, DesktopStore, LocalStorage, MemoryBackend, API_KEY_KEY,
    APP_DIR, LOCALSTORAGE_KEY, STORE_FILE,
};
pub use error::CredentialError;
pub use store::CredentialStore;
