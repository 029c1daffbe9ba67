//! Client error types.

use saga::ServiceError;
use thiserror::Error;

/// Errors returned by the HTTP clients.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A successful response carried an unexpected body.
    #[error("unexpected response body: {0}")]
    Decode(String),
}

impl From<ClientError> for ServiceError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Status { status, body } => ServiceError::Status { status, body },
            ClientError::Request(e) if e.is_decode() => ServiceError::InvalidResponse(e.to_string()),
            ClientError::Request(e) => ServiceError::Unreachable(e.to_string()),
            ClientError::Decode(msg) => ServiceError::InvalidResponse(msg),
        }
    }
}
