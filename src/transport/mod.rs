//! Engine-facing interfaces consumed by the client.
//!
//! [`Transport`] covers the execution API (streams and the submission call),
//! [`ManagementApi`] the process lifecycle used by the `dev` workflow. Both are
//! shared across concurrent calls, hence `Send + Sync`.

use async_trait::async_trait;

use crate::core::stream::StreamHandle;
use crate::domain::{
    Event, EventFilter, Execution, ExecutionCreated, ExecutionFilter, ExecutionRequest, Hash,
    Process, ProcessDefinition,
};
use crate::error::TransportResult;

#[cfg(feature = "local-engine")]
pub mod local;
pub mod readiness;

#[cfg(feature = "local-engine")]
pub use local::{EchoHandler, LocalEngine, TaskHandler};
pub use readiness::{check_stream_ready, Readiness, StreamMetadata};

#[async_trait]
pub trait Transport: Send + Sync {
    /// Open a server-push stream of execution updates matching `filter`.
    ///
    /// The stream must deliver a readiness frame once the filter is active and
    /// must not miss any matching update after that frame.
    async fn open_execution_stream(
        &self,
        filter: ExecutionFilter,
    ) -> TransportResult<StreamHandle<Execution>>;

    async fn open_event_stream(&self, filter: EventFilter) -> TransportResult<StreamHandle<Event>>;

    /// Submit an execution. Resolves once the engine accepted it.
    async fn create_execution(
        &self,
        request: ExecutionRequest,
    ) -> TransportResult<ExecutionCreated>;
}

#[async_trait]
pub trait ManagementApi: Send + Sync {
    /// Register a process. A duplicate definition fails with
    /// [`TransportError::AlreadyExists`](crate::error::TransportError::AlreadyExists)
    /// carrying the existing hash.
    async fn create_process(&self, definition: ProcessDefinition) -> TransportResult<Process>;

    async fn delete_process(&self, hash: Hash) -> TransportResult<()>;

    async fn get_process(&self, hash: Hash) -> TransportResult<Process>;

    /// Stream every execution update belonging to the process.
    async fn process_logs(&self, hash: Hash) -> TransportResult<StreamHandle<Execution>>;
}
