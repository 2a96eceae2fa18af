//! Submission coordinator: the execute-and-wait protocol.
//!
//! One call runs `subscribe → wait ready → submit → await result`. The result
//! subscription is opened and confirmed live before the submission is sent,
//! so a result emitted at any point after submission is observed. The call
//! settles exactly once and its subscription is closed on every exit path.

mod state;

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::OptionFuture;
use tokio::task::JoinHandle;

pub use state::{transition, CallEvent, CallMachine, CallState, Effect};

use crate::core::stop_signal::StopSignal;
use crate::core::stream::StreamEvent;
use crate::core::subscription::SubscriptionManager;
use crate::core::token::{CorrelationToken, TokenGenerator};
use crate::domain::{Execution, ExecutionCreated, ExecutionFilter, ExecutionRequest};
use crate::error::{ClientError, ClientResult, TransportError, TransportResult};
use crate::transport::{check_stream_ready, Transport};

/// Optional external inputs of one call.
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    /// Fails the call with `Canceled` when triggered.
    pub stop: Option<StopSignal>,
    /// Fails the call with `DeadlineExceeded` when elapsed.
    pub deadline: Option<Duration>,
}

impl CallOptions {
    pub fn with_stop(mut self, stop: StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }
}

type Submission = JoinHandle<TransportResult<ExecutionCreated>>;

#[derive(Clone)]
pub struct SubmissionCoordinator {
    transport: Arc<dyn Transport>,
    subscriptions: SubscriptionManager,
    tokens: Arc<dyn TokenGenerator>,
}

impl SubmissionCoordinator {
    pub fn new(transport: Arc<dyn Transport>, tokens: Arc<dyn TokenGenerator>) -> Self {
        Self {
            subscriptions: SubscriptionManager::new(transport.clone()),
            transport,
            tokens,
        }
    }

    pub fn subscriptions(&self) -> &SubscriptionManager {
        &self.subscriptions
    }

    pub async fn execute_and_wait(&self, request: ExecutionRequest) -> ClientResult<Execution> {
        self.execute_and_wait_with(request, CallOptions::default()).await
    }

    /// Submit `request` and wait for its correlated terminal execution.
    pub async fn execute_and_wait_with(
        &self,
        request: ExecutionRequest,
        options: CallOptions,
    ) -> ClientResult<Execution> {
        let token = self.tokens.generate();
        let filter = ExecutionFilter::terminal_results(request.instance_hash, token.as_str());
        let mut machine = CallMachine::new(filter.clone());
        let mut request = Some(request);
        let mut submission: Option<Submission> = None;

        let stop = async {
            match &options.stop {
                Some(stop) => stop.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = async {
            match options.deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending().await,
            }
        };
        tokio::pin!(stop);
        tokio::pin!(deadline);

        tracing::debug!(token = %token, "execute-and-wait started");
        machine.handle(CallEvent::Subscribe);
        // Stop and deadline are armed while the stream is being opened too.
        let opened = tokio::select! {
            biased;
            _ = &mut stop => Err(CallEvent::Canceled),
            _ = &mut deadline => {
                Err(CallEvent::DeadlineExceeded(options.deadline.unwrap_or_default()))
            }
            opened = self.subscriptions.open(filter) => Ok(opened),
        };
        let mut subscription = match opened {
            Ok(opened) => opened?,
            Err(event) => return settle_unsubscribed(&mut machine, event, &token),
        };
        let mut pending = VecDeque::from([CallEvent::Subscribed]);

        loop {
            while let Some(event) = pending.pop_front() {
                for effect in machine.handle(event) {
                    match effect {
                        Effect::Submit => {
                            if let Some(mut request) = request.take() {
                                request.push_tag(token.as_str());
                                submission = Some(self.dispatch(request));
                                pending.push_back(CallEvent::SubmissionDispatched);
                            }
                        }
                        Effect::CancelSubscription => subscription.cancel(),
                        Effect::DestroySubscription(reason) => subscription.destroy(reason),
                        Effect::Settle(outcome) => {
                            detach_submission(submission.take(), &token);
                            match &outcome {
                                Ok(execution) => tracing::info!(
                                    token = %token,
                                    execution = %execution.hash,
                                    "execution resolved"
                                ),
                                Err(err) => tracing::info!(
                                    token = %token,
                                    error = %err,
                                    "execution failed"
                                ),
                            }
                            return outcome;
                        }
                    }
                }
            }

            let event = tokio::select! {
                biased;
                _ = &mut stop => CallEvent::Canceled,
                _ = &mut deadline => {
                    CallEvent::DeadlineExceeded(options.deadline.unwrap_or_default())
                }
                Some(joined) = OptionFuture::from(submission.as_mut()), if submission.is_some() => {
                    submission = None;
                    match joined {
                        Ok(Ok(created)) => CallEvent::SubmissionAccepted(created),
                        Ok(Err(err)) => CallEvent::SubmissionFailed(err),
                        Err(join_err) => CallEvent::SubmissionFailed(TransportError::Internal(
                            format!("submission task failed: {}", join_err),
                        )),
                    }
                }
                event = subscription.next_event() => match event {
                    Some(StreamEvent::Ready(metadata)) => {
                        CallEvent::Ready(check_stream_ready(&metadata))
                    }
                    Some(StreamEvent::Data(execution)) => CallEvent::Data(execution),
                    Some(StreamEvent::Error(err)) => CallEvent::StreamError(err),
                    None => CallEvent::StreamEnded,
                },
            };
            pending.push_back(event);
        }
    }

    fn dispatch(&self, request: ExecutionRequest) -> Submission {
        let transport = self.transport.clone();
        tokio::spawn(async move { transport.create_execution(request).await })
    }
}

/// Settle a call stopped before its result stream was opened. Nothing was
/// subscribed or submitted, so only the settlement effect applies.
fn settle_unsubscribed(
    machine: &mut CallMachine,
    event: CallEvent,
    token: &CorrelationToken,
) -> ClientResult<Execution> {
    let fallback = match &event {
        CallEvent::DeadlineExceeded(limit) => ClientError::DeadlineExceeded(*limit),
        _ => ClientError::Canceled,
    };
    let outcome = machine
        .handle(event)
        .into_iter()
        .find_map(|effect| match effect {
            Effect::Settle(outcome) => Some(outcome),
            _ => None,
        })
        .unwrap_or(Err(fallback));
    if let Err(err) = &outcome {
        tracing::info!(token = %token, error = %err, "execution failed before subscribing");
    }
    outcome
}

/// A submission still in flight after settlement keeps running; its failure
/// can no longer change the outcome, so it is only logged.
fn detach_submission(submission: Option<Submission>, token: &CorrelationToken) {
    if let Some(handle) = submission {
        let token = token.clone();
        tokio::spawn(async move {
            match handle.await {
                Ok(Err(err)) => tracing::warn!(
                    token = %token,
                    error = %err,
                    "submission failed after the call settled"
                ),
                Err(err) => tracing::warn!(token = %token, error = %err, "submission task failed"),
                Ok(Ok(_)) => {}
            }
        });
    }
}
