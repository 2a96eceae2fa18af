//! Caller-facing error taxonomy.

use std::time::Duration;

use thiserror::Error;

use super::error_context::{ErrorCode, ErrorContext, ErrorSeverity};
use super::TransportError;
use crate::domain::{ExecutionError, Hash};

/// Errors produced by client operations.
#[derive(Debug, Clone, Error)]
pub enum ClientError {
    /// The result subscription never became ready.
    #[error("Stream establishment error: {0}")]
    StreamEstablishment(TransportError),
    /// The unary submission call failed.
    #[error("Submission error: {0}")]
    Submission(TransportError),
    /// The result subscription failed after it became ready.
    #[error("Stream delivery error: {0}")]
    StreamDelivery(TransportError),
    /// The execution ran and reported a failure payload.
    #[error("Execution {hash} failed: {}", .error.message)]
    DomainExecution { hash: Hash, error: ExecutionError },
    #[error("{resource} {hash} already exists")]
    AlreadyExists { resource: String, hash: Hash },
    #[error("Execution canceled")]
    Canceled,
    #[error("Execution deadline exceeded after {0:?}")]
    DeadlineExceeded(Duration),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid definition: {0}")]
    Definition(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Encoding(#[from] EncodingError),
}

impl ClientError {
    /// The execution error payload, for domain failures only.
    pub fn execution_error(&self) -> Option<&ExecutionError> {
        match self {
            ClientError::DomainExecution { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Transport error wrapped by this error, if any.
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            ClientError::StreamEstablishment(e)
            | ClientError::Submission(e)
            | ClientError::StreamDelivery(e) => Some(e),
            _ => None,
        }
    }

    /// Classify the error for retry and reporting decisions.
    pub fn context(&self) -> ErrorContext {
        let message = self.to_string();
        match self {
            ClientError::StreamEstablishment(e) => {
                transport_context(ErrorCode::StreamEstablishment, e, message)
            }
            ClientError::Submission(e) => transport_context(ErrorCode::Submission, e, message),
            ClientError::StreamDelivery(e) => {
                transport_context(ErrorCode::StreamDelivery, e, message)
            }
            ClientError::DomainExecution { error, .. } => {
                ErrorContext::non_retryable(ErrorCode::ExecutionFailed, message)
                    .with_metadata(serde_json::json!({ "message": error.message }))
            }
            ClientError::AlreadyExists { hash, .. } => {
                let mut ctx = ErrorContext::non_retryable(ErrorCode::AlreadyExists, message)
                    .with_metadata(serde_json::json!({ "hash": hash.to_string() }));
                ctx.severity = ErrorSeverity::Warning;
                ctx
            }
            ClientError::Canceled => ErrorContext::non_retryable(ErrorCode::Canceled, message),
            ClientError::DeadlineExceeded(_) => {
                ErrorContext::retryable(ErrorCode::Timeout, message)
            }
            ClientError::InvalidFilter(_) | ClientError::Definition(_) => {
                ErrorContext::non_retryable(ErrorCode::InvalidInput, message)
            }
            ClientError::Config(_) => ErrorContext::non_retryable(ErrorCode::ConfigError, message),
            ClientError::Encoding(_) => {
                ErrorContext::non_retryable(ErrorCode::EncodingError, message)
            }
        }
    }
}

fn transport_context(code: ErrorCode, err: &TransportError, message: String) -> ErrorContext {
    if err.is_transient() {
        ErrorContext::retryable(code, message)
    } else {
        ErrorContext::non_retryable(code, message)
    }
}

/// Configuration loading errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Config parse error: {0}")]
    Parse(String),
    #[error("Config read error: {0}")]
    Read(String),
    #[error("Unsupported config format: {0}")]
    UnsupportedFormat(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Read(e.to_string())
    }
}

/// Hash encoding errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("Invalid base58 string: {0}")]
    InvalidBase58(String),
    #[error("Invalid hash length: expected {expected} bytes, found {found}")]
    InvalidLength { expected: usize, found: usize },
}
