//! Error types for lfs-reconcile operations.

use thiserror::Error;

/// Result type for lfs-reconcile operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while mapping, checking, or remediating.
#[derive(Error, Debug)]
pub enum Error {
    /// Ambiguous attribute scope (more than one tracked-attributes file)
    #[error("configuration error: {0}")]
    Config(String),

    /// Candidate pointer file is not valid text
    #[error("decode error: {0}")]
    Decode(String),

    /// Git subprocess or object-store I/O failure
    #[error("transport error: {0}")]
    Transport(String),

    /// Malformed input rejected before any I/O begins
    #[error("validation error: {0}")]
    Validation(String),

    /// Object not found in a store
    #[error("object not found: {0}")]
    NotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(404, _) => Error::NotFound("object not found".into()),
            ureq::Error::Status(code, response) => {
                let message = response
                    .into_string()
                    .unwrap_or_else(|_| "unknown error".into());
                Error::Transport(format!("HTTP {}: {}", code, message))
            }
            other => Error::Transport(other.to_string()),
        }
    }
}
