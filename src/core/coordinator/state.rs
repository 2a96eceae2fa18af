//! Per-call state machine of execute-and-wait.
//!
//! `transition` is a pure function of (state, event) producing the next state
//! and the side effects the driver must perform. Terminal states absorb every
//! event without effects, which is what makes settlement happen exactly once.

use std::time::Duration;

use crate::core::mapper::{
    is_correlated_result, map_result, map_stream_end, map_stream_error, map_submission_error,
    Outcome,
};
use crate::domain::{Execution, ExecutionCreated, ExecutionFilter};
use crate::error::{ClientError, TransportError};
use crate::transport::Readiness;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Init,
    Subscribing,
    ReadyWait,
    Submitting,
    AwaitingResult,
    Resolved,
    Failed,
}

impl CallState {
    pub fn is_terminal(self) -> bool {
        matches!(self, CallState::Resolved | CallState::Failed)
    }

    /// Whether the result stream has confirmed its filter.
    fn stream_ready(self) -> bool {
        matches!(self, CallState::Submitting | CallState::AwaitingResult)
    }
}

#[derive(Debug, Clone)]
pub enum CallEvent {
    /// The driver starts opening the result subscription.
    Subscribe,
    /// The subscription exists and listeners are attached.
    Subscribed,
    Ready(Readiness),
    SubmissionDispatched,
    SubmissionAccepted(ExecutionCreated),
    SubmissionFailed(TransportError),
    Data(Execution),
    StreamError(TransportError),
    StreamEnded,
    Canceled,
    DeadlineExceeded(Duration),
}

#[derive(Debug)]
pub enum Effect {
    /// Attach the correlation token and dispatch the submission.
    Submit,
    CancelSubscription,
    DestroySubscription(Option<TransportError>),
    Settle(Outcome),
}

/// Compute the next state and effects.
pub fn transition(
    state: CallState,
    event: CallEvent,
    filter: &ExecutionFilter,
) -> (CallState, Vec<Effect>) {
    use CallState::*;

    if state.is_terminal() {
        return (state, Vec::new());
    }

    match (state, event) {
        (Init, CallEvent::Subscribe) => (Subscribing, Vec::new()),
        (Init, CallEvent::Canceled) => (Failed, vec![Effect::Settle(Err(ClientError::Canceled))]),
        (Init, CallEvent::DeadlineExceeded(limit)) => (
            Failed,
            vec![Effect::Settle(Err(ClientError::DeadlineExceeded(limit)))],
        ),
        (Init, _) => (Init, Vec::new()),

        (Subscribing, CallEvent::Subscribed) => (ReadyWait, Vec::new()),

        (ReadyWait, CallEvent::Ready(Readiness::Ready)) => (Submitting, vec![Effect::Submit]),
        (ReadyWait, CallEvent::Ready(Readiness::NoStatus)) => (ReadyWait, Vec::new()),
        (ReadyWait, CallEvent::Ready(Readiness::Rejected(err))) => (
            Failed,
            vec![
                Effect::DestroySubscription(Some(err.clone())),
                Effect::Settle(Err(ClientError::StreamEstablishment(err))),
            ],
        ),

        (Submitting, CallEvent::SubmissionDispatched) => (AwaitingResult, Vec::new()),
        (Submitting | AwaitingResult, CallEvent::SubmissionAccepted(_)) => {
            (AwaitingResult, Vec::new())
        }
        (Submitting | AwaitingResult, CallEvent::SubmissionFailed(err)) => (
            Failed,
            vec![
                Effect::DestroySubscription(Some(err.clone())),
                Effect::Settle(Err(map_submission_error(err))),
            ],
        ),

        (Submitting | AwaitingResult, CallEvent::Data(execution)) => {
            if !is_correlated_result(&execution, filter) {
                tracing::warn!(
                    execution = %execution.hash,
                    status = ?execution.status,
                    "ignoring uncorrelated execution update"
                );
                return (state, Vec::new());
            }
            let outcome = map_result(execution);
            let next = if outcome.is_ok() { Resolved } else { Failed };
            (
                next,
                vec![Effect::CancelSubscription, Effect::Settle(outcome)],
            )
        }

        (Subscribing | ReadyWait | Submitting | AwaitingResult, CallEvent::StreamError(err)) => (
            Failed,
            vec![
                Effect::CancelSubscription,
                Effect::Settle(Err(map_stream_error(err, state.stream_ready()))),
            ],
        ),
        (Subscribing | ReadyWait | Submitting | AwaitingResult, CallEvent::StreamEnded) => (
            Failed,
            vec![
                Effect::CancelSubscription,
                Effect::Settle(Err(map_stream_end(state.stream_ready()))),
            ],
        ),
        (_, CallEvent::Canceled) => (
            Failed,
            vec![
                Effect::CancelSubscription,
                Effect::Settle(Err(ClientError::Canceled)),
            ],
        ),
        (_, CallEvent::DeadlineExceeded(limit)) => (
            Failed,
            vec![
                Effect::CancelSubscription,
                Effect::Settle(Err(ClientError::DeadlineExceeded(limit))),
            ],
        ),

        // Duplicate readiness, data before submission, out-of-order driver events.
        (state, _) => (state, Vec::new()),
    }
}

/// Owns the state of one call and applies transitions.
#[derive(Debug)]
pub struct CallMachine {
    state: CallState,
    filter: ExecutionFilter,
}

impl CallMachine {
    pub fn new(filter: ExecutionFilter) -> Self {
        Self {
            state: CallState::Init,
            filter,
        }
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn filter(&self) -> &ExecutionFilter {
        &self.filter
    }

    pub fn handle(&mut self, event: CallEvent) -> Vec<Effect> {
        let (next, effects) = transition(self.state, event, &self.filter);
        if next != self.state {
            tracing::debug!(from = ?self.state, to = ?next, "call transition");
        }
        self.state = next;
        effects
    }
}
