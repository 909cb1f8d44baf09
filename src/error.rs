//! Error types for the drive_fetch crate.

use thiserror::Error;

/// Errors that can occur while obtaining credentials or retrieving files.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Authentication failed: {0}")]
    Credential(String),

    #[error("Failed to read client secrets file: {0}")]
    ClientSecrets(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },
}

impl FetchError {
    /// Whether this error originated in the credential phase.
    pub fn is_credential(&self) -> bool {
        matches!(
            self,
            FetchError::Credential(_) | FetchError::ClientSecrets(_)
        )
    }
}

/// Result type alias for FetchError.
pub type Result<T> = std::result::Result<T, FetchError>;
