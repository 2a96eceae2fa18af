//! Client core: streams, subscriptions, correlation and the execute-and-wait
//! coordinator.

pub mod coordinator;
pub mod mapper;
pub mod stop_signal;
pub mod stream;
pub mod subscription;
pub mod token;

pub use coordinator::{CallOptions, CallState, SubmissionCoordinator};
pub use mapper::Outcome;
pub use stop_signal::StopSignal;
pub use stream::{channel, StreamEvent, StreamHandle, StreamSender};
pub use subscription::{Subscription, SubscriptionManager, SubscriptionState};
pub use token::{
    CorrelationToken, EntropyTokenGenerator, SequentialTokenGenerator, TokenGenerator,
    UuidTokenGenerator,
};
