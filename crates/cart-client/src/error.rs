//! Client error types.

use thiserror::Error;

/// Errors from the cart client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed (connect, timeout, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server has no session for this client.
    #[error("not signed in")]
    Unauthorized,

    /// The server rejected the request.
    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON encoding or decoding failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing local storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Base URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl ClientError {
    /// HTTP status of a server rejection, if this is one.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
