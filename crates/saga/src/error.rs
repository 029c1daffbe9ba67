//! Saga error types.

use std::time::Duration;

use thiserror::Error;

/// Failure classification returned by the remote service ports.
///
/// A non-success HTTP status is always surfaced here with its status code
/// and body instead of being folded into an opaque transport error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// The service answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never produced a response (connection refused, DNS, ...).
    #[error("service unreachable: {0}")]
    Unreachable(String),

    /// The service answered successfully but the body could not be decoded.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl ServiceError {
    /// Returns the HTTP status, if the service produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors that end a saga step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SagaError {
    /// A remote call failed.
    #[error("transport failure: {0}")]
    Transport(#[from] ServiceError),

    /// The completion notification did not arrive within the polling budget.
    #[error("notification not received after {attempts} attempts ({}s)", .waited.as_secs())]
    Timeout { attempts: u32, waited: Duration },

    /// The webhook receiver could not be started.
    #[error("local resource failure: {0}")]
    LocalResource(String),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
