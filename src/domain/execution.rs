//! Execution records and the filters used to select them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Hash;

/// Lifecycle status of an execution on the engine.
///
/// `Pending → Running → {Completed, Failed}`; the last two are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl ExecutionStatus {
    /// Statuses from which no further transition occurs.
    pub const TERMINAL: [ExecutionStatus; 2] =
        [ExecutionStatus::Completed, ExecutionStatus::Failed];

    pub fn is_terminal(self) -> bool {
        matches!(self, ExecutionStatus::Completed | ExecutionStatus::Failed)
    }

    /// Whether the engine may move an execution from `self` to `next`.
    pub fn can_transition_to(self, next: ExecutionStatus) -> bool {
        use ExecutionStatus::*;
        matches!(
            (self, next),
            (Pending, Running) | (Pending, Failed) | (Running, Completed) | (Running, Failed)
        )
    }
}

/// Failure payload attached to an execution that ran and failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The engine's record of a unit of work, as seen by the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub hash: Hash,
    pub instance_hash: Hash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_hash: Option<Hash>,
    pub task_key: String,
    pub status: ExecutionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ExecutionError>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Execution {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// A request to run `task_key` on the instance identified by `instance_hash`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub instance_hash: Hash,
    pub task_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_hash: Option<Hash>,
    /// Free-form tags echoed back on the execution record. Order is kept.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExecutionRequest {
    pub fn new(instance_hash: Hash, task_key: impl Into<String>) -> Self {
        Self {
            instance_hash,
            task_key: task_key.into(),
            inputs: None,
            process_hash: None,
            tags: Vec::new(),
        }
    }

    pub fn with_inputs(mut self, inputs: Value) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn with_process(mut self, process_hash: Hash) -> Self {
        self.process_hash = Some(process_hash);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }

    /// Append `tag` after any caller-supplied tags.
    pub fn push_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }
}

/// Response of a successful submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionCreated {
    pub hash: Hash,
}

/// Selects which execution updates a result stream delivers.
///
/// Empty `statuses` or `tags` place no constraint; every listed tag must be
/// present on a record for it to match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_hash: Option<Hash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_hash: Option<Hash>,
    #[serde(default)]
    pub statuses: Vec<ExecutionStatus>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExecutionFilter {
    /// The filter used by execute-and-wait: terminal updates of one instance
    /// carrying one correlation tag.
    pub fn terminal_results(instance_hash: Hash, tag: impl Into<String>) -> Self {
        Self {
            instance_hash: Some(instance_hash),
            process_hash: None,
            statuses: ExecutionStatus::TERMINAL.to_vec(),
            tags: vec![tag.into()],
        }
    }

    pub fn for_process(process_hash: Hash) -> Self {
        Self {
            process_hash: Some(process_hash),
            ..Self::default()
        }
    }

    pub fn matches(&self, execution: &Execution) -> bool {
        if let Some(instance) = &self.instance_hash {
            if *instance != execution.instance_hash {
                return false;
            }
        }
        if let Some(process) = &self.process_hash {
            if Some(*process) != execution.process_hash {
                return false;
            }
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&execution.status) {
            return false;
        }
        self.tags.iter().all(|tag| execution.has_tag(tag))
    }
}
