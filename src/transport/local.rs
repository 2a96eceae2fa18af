//! In-process execution engine.
//!
//! [`LocalEngine`] implements [`Transport`] and [`ManagementApi`] without a
//! network hop. Instances are registered with a [`TaskHandler`]; each
//! submission is stored as `Pending`, then run on the tokio runtime through
//! `Running` to `Completed` or `Failed`. Every status change is published to
//! the matching open streams.
//!
//! Streams are registered under the same lock that publishing takes, and the
//! readiness frame is queued before registration, so readiness always precedes
//! data and no update after readiness is missed.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use super::{ManagementApi, StreamMetadata, Transport};
use crate::config::LocalEngineConfig;
use crate::core::stream::{self, StreamHandle, StreamSender};
use crate::domain::{
    Event, EventFilter, Execution, ExecutionCreated, ExecutionError, ExecutionFilter,
    ExecutionRequest, ExecutionStatus, Hash, Process, ProcessDefinition,
};
use crate::error::{TransportError, TransportResult};

/// Runs the tasks of one instance.
#[async_trait]
pub trait TaskHandler: Send + Sync {
    async fn run(&self, task_key: &str, inputs: Option<Value>) -> Result<Value, ExecutionError>;
}

/// Returns the inputs unchanged (`null` when absent).
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoHandler;

#[async_trait]
impl TaskHandler for EchoHandler {
    async fn run(&self, _task_key: &str, inputs: Option<Value>) -> Result<Value, ExecutionError> {
        Ok(inputs.unwrap_or(Value::Null))
    }
}

struct Subscriber<F, T> {
    filter: F,
    sender: StreamSender<T>,
}

struct EngineState {
    config: LocalEngineConfig,
    instances: RwLock<HashMap<Hash, Arc<dyn TaskHandler>>>,
    processes: RwLock<HashMap<Hash, Process>>,
    executions: RwLock<HashMap<Hash, Execution>>,
    /// Finished executions, oldest first.
    finished: Mutex<VecDeque<Hash>>,
    execution_streams: Mutex<Vec<Subscriber<ExecutionFilter, Execution>>>,
    event_streams: Mutex<Vec<Subscriber<EventFilter, Event>>>,
    sequence: AtomicU64,
}

#[derive(Clone)]
pub struct LocalEngine {
    state: Arc<EngineState>,
}

impl Default for LocalEngine {
    fn default() -> Self {
        Self::new(LocalEngineConfig::default())
    }
}

impl LocalEngine {
    pub fn new(config: LocalEngineConfig) -> Self {
        Self {
            state: Arc::new(EngineState {
                config,
                instances: RwLock::new(HashMap::new()),
                processes: RwLock::new(HashMap::new()),
                executions: RwLock::new(HashMap::new()),
                finished: Mutex::new(VecDeque::new()),
                execution_streams: Mutex::new(Vec::new()),
                event_streams: Mutex::new(Vec::new()),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Register `handler` for the instance named `name` and return its hash.
    pub fn register_instance(&self, name: &str, handler: Arc<dyn TaskHandler>) -> Hash {
        let hash = Hash::digest(name.as_bytes());
        self.state.instances.write().insert(hash, handler);
        tracing::debug!(instance = %hash, name, "instance registered");
        hash
    }

    /// Look up an execution. Finished ones stay available until
    /// `history_limit` newer executions have finished.
    pub fn execution(&self, hash: &Hash) -> Option<Execution> {
        self.state.executions.read().get(hash).cloned()
    }

    /// Streams of any kind that are open on the engine side.
    pub fn open_streams(&self) -> usize {
        let executions = {
            let mut streams = self.state.execution_streams.lock();
            streams.retain(|s| !s.sender.is_closed());
            streams.len()
        };
        let events = {
            let mut streams = self.state.event_streams.lock();
            streams.retain(|s| !s.sender.is_closed());
            streams.len()
        };
        executions + events
    }

    /// Emit an event from `instance_hash` to the matching event streams.
    pub fn emit_event(&self, instance_hash: Hash, key: impl Into<String>, data: Value) -> Event {
        let seq = self.state.sequence.fetch_add(1, Ordering::SeqCst);
        let key = key.into();
        let event = Event {
            hash: Hash::digest(format!("event:{}:{}:{}", instance_hash, key, seq).as_bytes()),
            instance_hash,
            key,
            data,
            timestamp: Utc::now(),
        };
        let mut streams = self.state.event_streams.lock();
        streams.retain(|s| !s.sender.is_closed());
        for subscriber in streams.iter() {
            if subscriber.filter.matches(&event) {
                subscriber.sender.send(event.clone());
            }
        }
        event
    }

    fn publish(&self, execution: &Execution) {
        let mut streams = self.state.execution_streams.lock();
        streams.retain(|s| !s.sender.is_closed());
        for subscriber in streams.iter() {
            if subscriber.filter.matches(execution) {
                subscriber.sender.send(execution.clone());
            }
        }
    }

    /// Move a stored execution to `status` and publish the update.
    fn update(
        &self,
        hash: &Hash,
        status: ExecutionStatus,
        result: Option<Result<Value, ExecutionError>>,
    ) {
        let updated = {
            let mut executions = self.state.executions.write();
            let Some(execution) = executions.get_mut(hash) else {
                return;
            };
            if !execution.status.can_transition_to(status) {
                tracing::warn!(
                    execution = %hash,
                    from = ?execution.status,
                    to = ?status,
                    "rejected execution status change"
                );
                return;
            }
            execution.status = status;
            match result {
                Some(Ok(outputs)) => execution.outputs = Some(outputs),
                Some(Err(error)) => execution.error = Some(error),
                None => {}
            }
            execution.clone()
        };
        self.publish(&updated);
        if status.is_terminal() {
            self.retire(*hash);
        }
    }

    fn retire(&self, hash: Hash) {
        let mut finished = self.state.finished.lock();
        finished.push_back(hash);
        while finished.len() > self.state.config.history_limit {
            if let Some(oldest) = finished.pop_front() {
                self.state.executions.write().remove(&oldest);
            }
        }
    }

    async fn run_execution(self, hash: Hash, handler: Arc<dyn TaskHandler>) {
        let delay = self.state.config.run_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let Some((task_key, inputs)) = self
            .execution(&hash)
            .map(|e| (e.task_key, e.inputs))
        else {
            return;
        };

        self.update(&hash, ExecutionStatus::Running, None);
        match handler.run(&task_key, inputs).await {
            Ok(outputs) => self.update(&hash, ExecutionStatus::Completed, Some(Ok(outputs))),
            Err(error) => self.update(&hash, ExecutionStatus::Failed, Some(Err(error))),
        }
    }
}

#[async_trait]
impl Transport for LocalEngine {
    async fn open_execution_stream(
        &self,
        filter: ExecutionFilter,
    ) -> TransportResult<StreamHandle<Execution>> {
        let (sender, handle) = stream::channel();
        sender.ready(StreamMetadata::ready());
        self.state
            .execution_streams
            .lock()
            .push(Subscriber { filter, sender });
        Ok(handle)
    }

    async fn open_event_stream(&self, filter: EventFilter) -> TransportResult<StreamHandle<Event>> {
        let (sender, handle) = stream::channel();
        sender.ready(StreamMetadata::ready());
        self.state
            .event_streams
            .lock()
            .push(Subscriber { filter, sender });
        Ok(handle)
    }

    async fn create_execution(
        &self,
        request: ExecutionRequest,
    ) -> TransportResult<ExecutionCreated> {
        let handler = self
            .state
            .instances
            .read()
            .get(&request.instance_hash)
            .cloned()
            .ok_or_else(|| {
                TransportError::NotFound(format!("instance {}", request.instance_hash))
            })?;
        if request.task_key.is_empty() {
            return Err(TransportError::InvalidArgument("task key is empty".into()));
        }
        if let Some(process) = &request.process_hash {
            if !self.state.processes.read().contains_key(process) {
                return Err(TransportError::NotFound(format!("process {}", process)));
            }
        }

        let seq = self.state.sequence.fetch_add(1, Ordering::SeqCst);
        let hash = Hash::digest(
            format!("execution:{}:{}:{}", request.instance_hash, request.task_key, seq).as_bytes(),
        );
        let execution = Execution {
            hash,
            instance_hash: request.instance_hash,
            process_hash: request.process_hash,
            task_key: request.task_key,
            status: ExecutionStatus::Pending,
            inputs: request.inputs,
            outputs: None,
            error: None,
            tags: request.tags,
        };
        self.state.executions.write().insert(hash, execution.clone());
        self.publish(&execution);

        tokio::spawn(self.clone().run_execution(hash, handler));
        Ok(ExecutionCreated { hash })
    }
}

#[async_trait]
impl ManagementApi for LocalEngine {
    async fn create_process(&self, definition: ProcessDefinition) -> TransportResult<Process> {
        definition
            .validate()
            .map_err(|e| TransportError::InvalidArgument(e.to_string()))?;
        let hash = definition
            .hash()
            .map_err(|e| TransportError::InvalidArgument(e.to_string()))?;

        let mut processes = self.state.processes.write();
        if processes.contains_key(&hash) {
            return Err(TransportError::AlreadyExists {
                resource: "process".into(),
                hash,
            });
        }
        let process = Process { hash, definition };
        processes.insert(hash, process.clone());
        tracing::debug!(process = %hash, "process created");
        Ok(process)
    }

    async fn delete_process(&self, hash: Hash) -> TransportResult<()> {
        self.state
            .processes
            .write()
            .remove(&hash)
            .map(|_| tracing::debug!(process = %hash, "process deleted"))
            .ok_or_else(|| TransportError::NotFound(format!("process {}", hash)))
    }

    async fn get_process(&self, hash: Hash) -> TransportResult<Process> {
        self.state
            .processes
            .read()
            .get(&hash)
            .cloned()
            .ok_or_else(|| TransportError::NotFound(format!("process {}", hash)))
    }

    async fn process_logs(&self, hash: Hash) -> TransportResult<StreamHandle<Execution>> {
        if !self.state.processes.read().contains_key(&hash) {
            return Err(TransportError::NotFound(format!("process {}", hash)));
        }
        self.open_execution_stream(ExecutionFilter::for_process(hash))
            .await
    }
}
