//! Stream handles: cancelable, observable channels of engine events.
//!
//! A transport creates a pair with [`channel`], keeps the [`StreamSender`] and
//! hands the [`StreamHandle`] to the client. The handle owns the stream's
//! lifetime: it closes on [`cancel`](StreamHandle::cancel),
//! [`destroy`](StreamHandle::destroy), a delivered error, the end of the
//! stream, or drop. Whichever happens first runs the registered release hooks,
//! exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::error::TransportError;
use crate::transport::StreamMetadata;

/// One event delivered on a stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent<T> {
    /// Transport metadata confirming (or refusing) that the stream is live.
    Ready(StreamMetadata),
    Data(T),
    /// Terminal failure. Nothing follows it.
    Error(TransportError),
}

type ReleaseHook = Box<dyn FnOnce() + Send>;

struct Shared {
    closed: CancellationToken,
    released: AtomicBool,
    hooks: Mutex<Vec<ReleaseHook>>,
    reason: Mutex<Option<TransportError>>,
}

impl Shared {
    /// Returns `true` for the call that actually closed the stream.
    fn close(&self) -> bool {
        let first = !self.released.swap(true, Ordering::AcqRel);
        self.closed.cancel();
        if first {
            let hooks = std::mem::take(&mut *self.hooks.lock());
            for hook in hooks {
                hook();
            }
        }
        first
    }
}

/// Create a connected sender/handle pair.
pub fn channel<T>() -> (StreamSender<T>, StreamHandle<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let shared = Arc::new(Shared {
        closed: CancellationToken::new(),
        released: AtomicBool::new(false),
        hooks: Mutex::new(Vec::new()),
        reason: Mutex::new(None),
    });
    (
        StreamSender {
            tx,
            shared: shared.clone(),
        },
        StreamHandle { rx, shared },
    )
}

/// Producer side of a stream, held by the transport.
pub struct StreamSender<T> {
    tx: mpsc::UnboundedSender<StreamEvent<T>>,
    shared: Arc<Shared>,
}

impl<T> Clone for StreamSender<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<T> StreamSender<T> {
    /// Deliver the readiness signal. Returns `false` if the stream is closed.
    pub fn ready(&self, metadata: StreamMetadata) -> bool {
        self.push(StreamEvent::Ready(metadata))
    }

    pub fn send(&self, item: T) -> bool {
        self.push(StreamEvent::Data(item))
    }

    pub fn fail(&self, err: TransportError) -> bool {
        self.push(StreamEvent::Error(err))
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Resolves once the client side has closed the stream.
    pub async fn closed(&self) {
        self.shared.closed.cancelled().await
    }

    fn push(&self, event: StreamEvent<T>) -> bool {
        if self.is_closed() {
            return false;
        }
        self.tx.send(event).is_ok()
    }
}

/// Consumer side of a stream. Not cloneable: exactly one owner.
pub struct StreamHandle<T> {
    rx: mpsc::UnboundedReceiver<StreamEvent<T>>,
    shared: Arc<Shared>,
}

impl<T> StreamHandle<T> {
    /// Wait for the next event.
    ///
    /// Returns `None` once the stream is closed. A stream closed with
    /// [`destroy`](Self::destroy) and a reason yields that reason as a final
    /// [`StreamEvent::Error`] first.
    pub async fn next_event(&mut self) -> Option<StreamEvent<T>> {
        if self.shared.closed.is_cancelled() {
            return self.take_reason();
        }

        let closed = self.shared.closed.clone();
        let received = tokio::select! {
            biased;
            _ = closed.cancelled() => None,
            event = self.rx.recv() => Some(event),
        };

        match received {
            None => self.take_reason(),
            Some(Some(StreamEvent::Error(err))) => {
                self.shared.close();
                Some(StreamEvent::Error(err))
            }
            Some(Some(event)) => {
                // Close may have raced the receive; closed streams deliver nothing.
                if self.shared.closed.is_cancelled() {
                    return self.take_reason();
                }
                Some(event)
            }
            Some(None) => {
                self.shared.close();
                None
            }
        }
    }

    /// Request a graceful close. Safe to call any number of times.
    pub fn cancel(&self) {
        if self.shared.close() {
            tracing::trace!("stream canceled");
        }
    }

    /// Force the stream closed, optionally handing `reason` to the next
    /// [`next_event`](Self::next_event) call.
    pub fn destroy(&self, reason: Option<TransportError>) {
        if let Some(reason) = reason {
            if !self.is_closed() {
                let mut slot = self.shared.reason.lock();
                if slot.is_none() {
                    *slot = Some(reason);
                }
            }
        }
        if self.shared.close() {
            tracing::trace!("stream destroyed");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.is_cancelled()
    }

    /// Run `hook` when the stream is released. Runs immediately if it already was.
    pub fn on_release(&self, hook: impl FnOnce() + Send + 'static) {
        let mut hooks = self.shared.hooks.lock();
        if self.shared.released.load(Ordering::Acquire) {
            drop(hooks);
            hook();
        } else {
            hooks.push(Box::new(hook));
        }
    }

    fn take_reason(&self) -> Option<StreamEvent<T>> {
        self.shared.reason.lock().take().map(StreamEvent::Error)
    }
}

impl<T> Drop for StreamHandle<T> {
    fn drop(&mut self) {
        self.shared.close();
    }
}

impl<T> std::fmt::Debug for StreamHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle")
            .field("closed", &self.is_closed())
            .finish()
    }
}
