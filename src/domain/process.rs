use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Hash;
use crate::error::ClientError;

/// One step of a process: a task of a named instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessStep {
    pub key: String,
    pub task_key: String,
}

/// A process as submitted to the management API.
///
/// Processes are content addressed: two definitions that serialize to the same
/// canonical JSON share a hash, which is how the engine detects duplicates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessDefinition {
    pub name: String,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    #[serde(default)]
    pub steps: Vec<ProcessStep>,
}

impl ProcessDefinition {
    pub fn hash(&self) -> Result<Hash, ClientError> {
        let canonical =
            serde_json::to_vec(self).map_err(|e| ClientError::Definition(e.to_string()))?;
        Ok(Hash::digest(&canonical))
    }

    /// Merge `KEY=VALUE` overrides into `env`; later entries win.
    pub fn apply_env_overrides<S: AsRef<str>>(
        &mut self,
        overrides: &[S],
    ) -> Result<(), ClientError> {
        for entry in overrides {
            let entry = entry.as_ref();
            let (key, value) = entry.split_once('=').ok_or_else(|| {
                ClientError::Definition(format!("env override '{}' is not KEY=VALUE", entry))
            })?;
            if key.is_empty() {
                return Err(ClientError::Definition(format!(
                    "env override '{}' has an empty key",
                    entry
                )));
            }
            self.env.insert(key.to_string(), value.to_string());
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.name.trim().is_empty() {
            return Err(ClientError::Definition("process name is empty".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for step in &self.steps {
            if !seen.insert(step.key.as_str()) {
                return Err(ClientError::Definition(format!(
                    "duplicate step key '{}'",
                    step.key
                )));
            }
        }
        Ok(())
    }
}

/// A process registered on the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Process {
    pub hash: Hash,
    pub definition: ProcessDefinition,
}
