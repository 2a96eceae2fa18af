//! Client configuration.
//!
//! Every field has a default, so an empty document is a valid config.
//!
//! ```yaml
//! execution_timeout_secs: 30
//! log_filter: "xexec=debug"
//! dev:
//!   delete_on_exit: true
//! local:
//!   run_delay_ms: 0
//!   history_limit: 1024
//! ```

pub mod format;

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use format::{load_document, parse_document, DocumentFormat};

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deadline applied to every execute-and-wait call. None waits forever.
    #[serde(default)]
    pub execution_timeout_secs: Option<u64>,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub dev: DevConfig,
    #[serde(default)]
    pub local: LocalEngineConfig,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            execution_timeout_secs: None,
            log_filter: default_log_filter(),
            dev: DevConfig::default(),
            local: LocalEngineConfig::default(),
        }
    }
}

impl ClientConfig {
    pub fn parse(content: &str, format: DocumentFormat) -> Result<Self, ConfigError> {
        parse_document(content, format)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        load_document(path)
    }

    pub fn execution_timeout(&self) -> Option<Duration> {
        self.execution_timeout_secs.map(Duration::from_secs)
    }
}

/// Settings of the `dev` workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevConfig {
    /// Delete the process on exit when this session created it.
    #[serde(default = "default_delete_on_exit")]
    pub delete_on_exit: bool,
}

fn default_delete_on_exit() -> bool {
    true
}

impl Default for DevConfig {
    fn default() -> Self {
        DevConfig {
            delete_on_exit: default_delete_on_exit(),
        }
    }
}

/// Settings of the in-process engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalEngineConfig {
    /// Pause before each execution starts running.
    #[serde(default)]
    pub run_delay_ms: u64,
    /// Finished executions kept for lookup. Older ones are evicted first.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    1024
}

impl Default for LocalEngineConfig {
    fn default() -> Self {
        LocalEngineConfig {
            run_delay_ms: 0,
            history_limit: default_history_limit(),
        }
    }
}

impl LocalEngineConfig {
    pub fn run_delay(&self) -> Duration {
        Duration::from_millis(self.run_delay_ms)
    }
}
