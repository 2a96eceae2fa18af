//! Domain layer: records exchanged with the execution engine.
//!
//! These types do not depend on any transport or runtime detail.
//!
//! Submodules:
//! - [`hash`]: Content identity hashes and their base58 display form.
//! - [`execution`]: Execution requests, records, statuses and result filters.
//! - [`event`]: Events emitted by running instances.
//! - [`process`]: Process definitions managed by the `dev` workflow.

pub mod event;
pub mod execution;
pub mod hash;
pub mod process;

pub use event::{Event, EventFilter};
pub use execution::{
    Execution, ExecutionCreated, ExecutionError, ExecutionFilter, ExecutionRequest,
    ExecutionStatus,
};
pub use hash::Hash;
pub use process::{Process, ProcessDefinition, ProcessStep};
