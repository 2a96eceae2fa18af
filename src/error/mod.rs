//! Error types for the execution client.
//!
//! - [`TransportError`]: Failures reported by the engine connection (unary calls and streams).
//! - [`ClientError`]: The caller-facing taxonomy produced by every client operation.
//! - [`ConfigError`] / [`EncodingError`]: Configuration parsing and hash encoding failures.
//! - [`ErrorContext`]: Structured error metadata (code, retryability, severity).

pub mod client_error;
pub mod error_context;
pub mod transport_error;

pub use client_error::{ClientError, ConfigError, EncodingError};
pub use error_context::{ErrorCode, ErrorContext, ErrorRetryability, ErrorSeverity};
pub use transport_error::TransportError;

/// Convenience alias for client-level results.
pub type ClientResult<T> = Result<T, ClientError>;
/// Convenience alias for transport-level results.
pub type TransportResult<T> = Result<T, TransportError>;
