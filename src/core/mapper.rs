//! Result mapping: from stream deliveries to the caller's outcome.

use crate::domain::{Execution, ExecutionFilter};
use crate::error::{ClientError, TransportError};

/// What a single execute-and-wait call settles with.
pub type Outcome = Result<Execution, ClientError>;

/// Map a terminal execution record to an outcome.
///
/// An error payload fails the call with that payload verbatim; anything else
/// resolves with the record.
pub fn map_result(execution: Execution) -> Outcome {
    match execution.error {
        Some(error) => Err(ClientError::DomainExecution {
            hash: execution.hash,
            error,
        }),
        None => Ok(execution),
    }
}

/// Re-check a delivered record against the call's filter. The engine already
/// filters, so a mismatch means a misbehaving transport.
pub fn is_correlated_result(execution: &Execution, filter: &ExecutionFilter) -> bool {
    execution.status.is_terminal() && filter.matches(execution)
}

/// Stream errors before readiness mean the stream was never established.
pub fn map_stream_error(err: TransportError, ready: bool) -> ClientError {
    if ready {
        ClientError::StreamDelivery(err)
    } else {
        ClientError::StreamEstablishment(err)
    }
}

pub fn map_stream_end(ready: bool) -> ClientError {
    if ready {
        ClientError::StreamDelivery(TransportError::Closed(
            "result stream ended before a terminal result".into(),
        ))
    } else {
        ClientError::StreamEstablishment(TransportError::Closed(
            "result stream ended before it became ready".into(),
        ))
    }
}

pub fn map_submission_error(err: TransportError) -> ClientError {
    ClientError::Submission(err)
}
