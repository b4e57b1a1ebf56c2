//! nano-bananary library crate.
//!
//! Gemini-backed image editing and video generation, with a persistent store
//! for the API key.

pub mod cli;
pub mod config;
pub mod credentials;
pub mod gemini;
pub mod media;
pub mod session;
pub mod settings;

pub use credentials::{CredentialError, CredentialStore};
pub use gemini::GenerationError;
pub use session::GenerationSession;
