use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// Cloneable stop request shared between a caller and running client work.
///
/// Passed to execute-and-wait as an external cancellation input and to the
/// `dev` session as its interrupt.
#[derive(Clone, Debug, Default)]
pub struct StopSignal {
    token: CancellationToken,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.token.cancelled()
    }

    /// A signal that fires when either `self` or the child itself is triggered.
    pub fn child(&self) -> StopSignal {
        StopSignal {
            token: self.token.child_token(),
        }
    }
}
