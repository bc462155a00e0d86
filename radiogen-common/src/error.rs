//! Common error types for radiogen

use thiserror::Error;

/// Common result type for radiogen operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across radiogen crates
#[derive(Error, Debug)]
pub enum Error {
    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error (wraps reqwest::Error)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested resource not found (HTTP 404 or missing file)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Audio engine failure (decode, resample, or encode)
    #[error("Audio error: {0}")]
    Audio(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure is transient and worth retrying.
    ///
    /// Not-found responses, configuration problems, and audio-engine
    /// rejections are deterministic; retrying them cannot succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Io(_) => true,
            Error::Http(e) => {
                !matches!(e.status(), Some(status) if status == reqwest::StatusCode::NOT_FOUND)
            }
            Error::Json(_)
            | Error::Config(_)
            | Error::NotFound(_)
            | Error::Audio(_)
            | Error::Internal(_) => false,
        }
    }
}
