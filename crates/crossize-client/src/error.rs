//! Error types for backend requests

use thiserror::Error;

/// A failed backend request
///
/// Requests are attempted once; the caller decides what to show.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Request failed: {message}")]
    Transport { message: String },

    #[error("Backend returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Could not decode {what}: {message}")]
    Decode { what: &'static str, message: String },

    #[error("Invalid URL: {url}")]
    InvalidUrl { url: String },
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport {
            message: err.to_string(),
        }
    }
}

/// Result type for backend requests
pub type ClientResult<T> = Result<T, ClientError>;
