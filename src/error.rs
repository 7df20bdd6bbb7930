// Error types for gistkit.
// Classifies transport, API, authentication and serialization failures.

use thiserror::Error;

use crate::github::transport::TransportError;

#[derive(Error, Debug)]
pub enum GistError {
    #[error("Network error: {0}")]
    Network(#[from] TransportError),

    #[error("GitHub API error: {0}")]
    ApiProvided(String),

    #[error("Could not obtain an OAuth token: {0}")]
    AuthCouldNot(String),

    #[error("Authentication lost: {0}")]
    AuthLost(String),

    #[error("Unexpected response body: {0}")]
    ObjectSerialization(String),

    #[error("Malformed URL: {0}")]
    MalformedUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No gist at position {index} (feed holds {len})")]
    OutOfRange { index: usize, len: usize },

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl GistError {
    /// A previously valid session was rejected; the caller should log in again.
    pub fn is_auth_lost(&self) -> bool {
        matches!(self, GistError::AuthLost(_))
    }

    /// The request never got a response (no connection, DNS, TLS, timeout).
    /// Callers fall back to the snapshot cache on these.
    pub fn is_offline(&self) -> bool {
        matches!(self, GistError::Network(TransportError::Request(_)))
    }
}

pub type Result<T> = std::result::Result<T, GistError>;
