//! Application layer: the client facade.
//!
//! [`Application`] (constructed via [`ApplicationBuilder`]) is the main entry
//! point for talking to an execution engine: raw event and result streams,
//! fire-and-forget submission, and execute-and-wait.

mod builder;

use std::sync::Arc;

pub use builder::ApplicationBuilder;

use crate::config::ClientConfig;
use crate::core::coordinator::{CallOptions, SubmissionCoordinator};
use crate::core::stream::StreamHandle;
use crate::domain::{
    Event, EventFilter, Execution, ExecutionCreated, ExecutionFilter, ExecutionRequest,
};
use crate::error::{ClientError, ClientResult};
use crate::transport::Transport;

pub struct Application {
    transport: Arc<dyn Transport>,
    coordinator: SubmissionCoordinator,
    config: ClientConfig,
}

impl Application {
    /// Create a new builder over `transport`.
    pub fn builder(transport: Arc<dyn Transport>) -> ApplicationBuilder {
        ApplicationBuilder::new(transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Result subscriptions currently held by execute-and-wait calls.
    pub fn live_subscriptions(&self) -> usize {
        self.coordinator.subscriptions().live_subscriptions()
    }

    /// Open a stream of events matching `filter`.
    pub async fn listen_event(&self, filter: EventFilter) -> ClientResult<StreamHandle<Event>> {
        self.transport
            .open_event_stream(filter)
            .await
            .map_err(ClientError::StreamEstablishment)
    }

    /// Open a stream of execution updates matching `filter`.
    pub async fn listen_result(
        &self,
        filter: ExecutionFilter,
    ) -> ClientResult<StreamHandle<Execution>> {
        self.transport
            .open_execution_stream(filter)
            .await
            .map_err(ClientError::StreamEstablishment)
    }

    /// Submit without waiting for the result.
    pub async fn execute_task(&self, request: ExecutionRequest) -> ClientResult<ExecutionCreated> {
        self.transport
            .create_execution(request)
            .await
            .map_err(ClientError::Submission)
    }

    /// Submit and wait for the correlated terminal execution, bounded by the
    /// configured execution timeout.
    pub async fn execute_task_and_wait_result(
        &self,
        request: ExecutionRequest,
    ) -> ClientResult<Execution> {
        self.execute_task_and_wait_result_with(request, CallOptions::default())
            .await
    }

    /// As [`execute_task_and_wait_result`](Self::execute_task_and_wait_result)
    /// with explicit call options. An explicit deadline overrides the config.
    pub async fn execute_task_and_wait_result_with(
        &self,
        request: ExecutionRequest,
        mut options: CallOptions,
    ) -> ClientResult<Execution> {
        if options.deadline.is_none() {
            options.deadline = self.config.execution_timeout();
        }
        self.coordinator
            .execute_and_wait_with(request, options)
            .await
    }
}
