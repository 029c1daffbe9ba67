//! Receiver error types.

use std::net::SocketAddr;

use saga::SagaError;
use thiserror::Error;

/// Errors starting the webhook receiver.
#[derive(Debug, Error)]
pub enum ReceiverError {
    /// The listener could not be bound.
    #[error("failed to bind webhook receiver on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// `start` was called while a listener is still running.
    #[error("webhook receiver already running on {0}")]
    AlreadyRunning(SocketAddr),
}

impl From<ReceiverError> for SagaError {
    fn from(err: ReceiverError) -> Self {
        SagaError::LocalResource(err.to_string())
    }
}
