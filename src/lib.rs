//! # XExec: execute-and-correlate client
//!
//! `xexec` submits units of work to an asynchronous execution engine and pairs
//! each submission with its result, which the engine delivers on a long-lived
//! subscription stream rather than in the submission response.
//!
//! - **Execute-and-wait**: a per-call state machine opens a result stream
//!   filtered on a fresh correlation token, waits until the engine confirms
//!   the filter is live, submits, and settles exactly once on the correlated
//!   terminal execution, a stream error or a submission error.
//! - **Leak freedom**: result subscriptions are scoped to the call and closed
//!   on every exit path.
//! - **Raw streams**: event and execution streams for callers that listen on
//!   their own.
//! - **Dev orchestration**: create-or-reuse of process definitions, log
//!   tailing and teardown on interrupt.
//! - **Local engine**: an in-process engine implementing the transport and
//!   management traits.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use xexec::{Application, EchoHandler, ExecutionRequest, LocalEngine};
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = LocalEngine::default();
//!     let instance = engine.register_instance("echo", Arc::new(EchoHandler));
//!     let app = Application::builder(Arc::new(engine)).build();
//!     let execution = app
//!         .execute_task_and_wait_result(
//!             ExecutionRequest::new(instance, "echo").with_inputs(serde_json::json!({"x": 1})),
//!         )
//!         .await
//!         .unwrap();
//!     println!("{:?}", execution.outputs);
//! }
//! ```
//!
//! # Feature Flags
//!
//! | Flag | Description |
//! |------|-------------|
//! | `local-engine` | In-process engine (`LocalEngine`), enabled by default |

pub mod application;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod orchestration;
pub mod transport;

pub use crate::application::{Application, ApplicationBuilder};
pub use crate::config::{ClientConfig, DocumentFormat};
pub use crate::core::{
    CallOptions, CorrelationToken, EntropyTokenGenerator, SequentialTokenGenerator, StopSignal,
    StreamEvent, StreamHandle, SubmissionCoordinator, TokenGenerator, UuidTokenGenerator,
};
pub use crate::domain::{
    Event, EventFilter, Execution, ExecutionCreated, ExecutionError, ExecutionFilter,
    ExecutionRequest, ExecutionStatus, Hash, Process, ProcessDefinition, ProcessStep,
};
pub use crate::error::{ClientError, ClientResult, TransportError};
pub use crate::orchestration::{create_or_reuse, load_definition, DevSession};
#[cfg(feature = "local-engine")]
pub use crate::transport::{EchoHandler, LocalEngine, TaskHandler};
pub use crate::transport::{ManagementApi, Readiness, StreamMetadata, Transport};
