//! Result subscriptions.
//!
//! A [`Subscription`] is one filtered view onto execution updates, opened
//! before the matching submission is sent. It is owned by exactly one caller
//! and closes when dropped, so every exit path releases it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::core::stream::{self, StreamEvent, StreamHandle};
use crate::domain::{Execution, ExecutionFilter};
use crate::error::{ClientError, TransportError};
use crate::transport::{check_stream_ready, Transport};

/// Lifecycle of a subscription as observed by its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    /// Filter requested, not yet confirmed live.
    Created,
    Ready,
    Delivering,
    Closed,
}

pub struct Subscription {
    handle: StreamHandle<Execution>,
    filter: ExecutionFilter,
    state: SubscriptionState,
}

impl Subscription {
    pub fn filter(&self) -> &ExecutionFilter {
        &self.filter
    }

    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == SubscriptionState::Closed || self.handle.is_closed()
    }

    /// Next raw stream event. `None` once closed.
    pub async fn next_event(&mut self) -> Option<StreamEvent<Execution>> {
        if self.state == SubscriptionState::Closed {
            return None;
        }
        let event = self.handle.next_event().await;
        match &event {
            Some(StreamEvent::Ready(metadata)) => {
                if self.state == SubscriptionState::Created
                    && check_stream_ready(metadata).is_ready()
                {
                    self.state = SubscriptionState::Ready;
                }
            }
            Some(StreamEvent::Data(_)) => self.state = SubscriptionState::Delivering,
            Some(StreamEvent::Error(_)) | None => self.state = SubscriptionState::Closed,
        }
        event
    }

    pub fn cancel(&mut self) {
        self.state = SubscriptionState::Closed;
        self.handle.cancel();
    }

    pub fn destroy(&mut self, reason: Option<TransportError>) {
        self.state = SubscriptionState::Closed;
        self.handle.destroy(reason);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("filter", &self.filter)
            .field("state", &self.state)
            .finish()
    }
}

/// Opens result subscriptions and tracks how many are live.
#[derive(Clone)]
pub struct SubscriptionManager {
    transport: Arc<dyn Transport>,
    live: Arc<AtomicUsize>,
}

impl SubscriptionManager {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Subscriptions opened through this manager and not yet released.
    pub fn live_subscriptions(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Open a result subscription.
    ///
    /// The filter must name an instance, at least one correlation tag and only
    /// terminal statuses. A transport that cannot establish the stream yields
    /// a subscription whose first event is that error.
    pub async fn open(&self, filter: ExecutionFilter) -> Result<Subscription, ClientError> {
        validate_result_filter(&filter)?;

        let handle = match self.transport.open_execution_stream(filter.clone()).await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(error = %err, "result stream could not be opened");
                let (tx, handle) = stream::channel();
                tx.fail(err);
                handle
            }
        };

        self.live.fetch_add(1, Ordering::SeqCst);
        let live = self.live.clone();
        handle.on_release(move || {
            live.fetch_sub(1, Ordering::SeqCst);
        });

        Ok(Subscription {
            handle,
            filter,
            state: SubscriptionState::Created,
        })
    }
}

fn validate_result_filter(filter: &ExecutionFilter) -> Result<(), ClientError> {
    if filter.instance_hash.is_none() {
        return Err(ClientError::InvalidFilter(
            "result filter must name an instance".into(),
        ));
    }
    if filter.tags.is_empty() {
        return Err(ClientError::InvalidFilter(
            "result filter must carry a correlation tag".into(),
        ));
    }
    if filter.statuses.is_empty() || filter.statuses.iter().any(|s| !s.is_terminal()) {
        return Err(ClientError::InvalidFilter(
            "result filter must select terminal statuses only".into(),
        ));
    }
    Ok(())
}
