use std::path::PathBuf;

/// Errors that can occur while persisting the API key.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("No config or data directory available for credential storage")]
    NoDirectory,

    #[error("Credential store I/O error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Credential store at '{}' is not valid JSON: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Credential backend '{0}' is unavailable")]
    BackendUnavailable(&'static str),

    /// Every configured backend rejected the write.
    #[error("Failed to save API key: {}", .failures.join("; "))]
    Unavailable {
        /// One entry per backend, formatted as `<backend>: <error>`.
        failures: Vec<String>,
    },
}
