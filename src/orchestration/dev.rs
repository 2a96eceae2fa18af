use std::sync::Arc;

use crate::config::DevConfig;
use crate::core::stop_signal::StopSignal;
use crate::core::stream::{StreamEvent, StreamHandle};
use crate::domain::{Execution, Hash, ProcessDefinition};
use crate::error::{ClientError, ClientResult, TransportError};
use crate::transport::ManagementApi;

/// Register `definition`, or reuse the process if the engine already has it.
///
/// Returns the process hash and whether this call created it. An
/// already-exists rejection only logs a warning.
pub async fn create_or_reuse(
    api: &dyn ManagementApi,
    definition: ProcessDefinition,
) -> ClientResult<(Hash, bool)> {
    match api.create_process(definition).await {
        Ok(process) => Ok((process.hash, true)),
        Err(TransportError::AlreadyExists { resource, hash }) => {
            let reused = ClientError::AlreadyExists { resource, hash };
            tracing::warn!(process = %hash, "{}; reusing it", reused);
            Ok((hash, false))
        }
        Err(err) => Err(ClientError::Submission(err)),
    }
}

/// A process under development: created (or reused), its executions tailed
/// until a stop signal, then torn down.
pub struct DevSession {
    api: Arc<dyn ManagementApi>,
    process_hash: Hash,
    created: bool,
    delete_on_exit: bool,
    logs: Option<StreamHandle<Execution>>,
}

impl DevSession {
    pub async fn start(
        api: Arc<dyn ManagementApi>,
        definition: ProcessDefinition,
        config: &DevConfig,
    ) -> ClientResult<Self> {
        let (process_hash, created) = create_or_reuse(api.as_ref(), definition).await?;
        let mut session = Self {
            api,
            process_hash,
            created,
            delete_on_exit: config.delete_on_exit,
            logs: None,
        };

        match session.api.process_logs(process_hash).await {
            Ok(logs) => {
                session.logs = Some(logs);
                tracing::info!(process = %process_hash, created, "dev session started");
                Ok(session)
            }
            Err(err) => {
                session.teardown().await?;
                Err(ClientError::StreamEstablishment(err))
            }
        }
    }

    pub fn process_hash(&self) -> Hash {
        self.process_hash
    }

    /// Whether this session created the process (and so owns its deletion).
    pub fn created(&self) -> bool {
        self.created
    }

    /// Tail executions, passing each to `on_log`, until `stop` fires or the
    /// log stream ends. Tears the session down before returning.
    pub async fn run_until<F>(&mut self, stop: &StopSignal, mut on_log: F) -> ClientResult<()>
    where
        F: FnMut(&Execution),
    {
        let mut failure = None;
        if let Some(logs) = self.logs.as_mut() {
            loop {
                let event = tokio::select! {
                    biased;
                    _ = stop.cancelled() => break,
                    event = logs.next_event() => event,
                };
                match event {
                    Some(StreamEvent::Data(execution)) => on_log(&execution),
                    Some(StreamEvent::Ready(_)) => {}
                    Some(StreamEvent::Error(err)) => {
                        failure = Some(ClientError::StreamDelivery(err));
                        break;
                    }
                    None => break,
                }
            }
        }

        self.teardown().await?;
        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Close the log stream and delete the process if this session created it.
    /// Calling it again is a no-op.
    pub async fn teardown(&mut self) -> ClientResult<()> {
        if let Some(logs) = self.logs.take() {
            logs.destroy(None);
        }
        if self.created && self.delete_on_exit {
            self.created = false;
            self.api
                .delete_process(self.process_hash)
                .await
                .map_err(ClientError::Submission)?;
            tracing::info!(process = %self.process_hash, "process deleted");
        }
        Ok(())
    }
}
