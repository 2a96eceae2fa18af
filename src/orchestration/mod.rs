//! Development-mode orchestration around the management API.
//!
//! - [`load_definition`]: read a process definition and apply `KEY=VALUE` overrides.
//! - [`create_or_reuse`]: register a process, reusing it when it already exists.
//! - [`DevSession`]: tail a process's executions until stopped, then tear down.

mod dev;

use std::path::Path;

pub use dev::{create_or_reuse, DevSession};

use crate::config::load_document;
use crate::domain::ProcessDefinition;
use crate::error::ClientResult;

/// Load a process definition from a YAML, JSON or TOML file.
pub fn load_definition<S: AsRef<str>>(
    path: &Path,
    env_overrides: &[S],
) -> ClientResult<ProcessDefinition> {
    let mut definition: ProcessDefinition = load_document(path)?;
    definition.apply_env_overrides(env_overrides)?;
    definition.validate()?;
    Ok(definition)
}
