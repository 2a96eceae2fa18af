//! Transport-level error types.

use thiserror::Error;

use crate::domain::Hash;

/// Errors reported by the engine connection.
///
/// These never reach the caller directly: the client wraps them into a
/// [`ClientError`](super::ClientError) variant that records *where* in the
/// protocol the failure happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("{resource} {hash} already exists")]
    AlreadyExists { resource: String, hash: Hash },
    #[error("Stream rejected: {0}")]
    StreamRejected(String),
    #[error("Stream closed: {0}")]
    Closed(String),
    #[error("Internal engine error: {0}")]
    Internal(String),
}

impl TransportError {
    /// Whether a caller retrying the same call could reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Unavailable(_) | TransportError::Closed(_)
        )
    }
}
