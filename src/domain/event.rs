use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Hash;

/// An event emitted by a running instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub hash: Hash,
    pub instance_hash: Hash,
    pub key: String,
    #[serde(default)]
    pub data: Value,
    pub timestamp: DateTime<Utc>,
}

/// Selects which events an event stream delivers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_hash: Option<Hash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

impl EventFilter {
    pub fn matches(&self, event: &Event) -> bool {
        self.instance_hash
            .map_or(true, |instance| instance == event.instance_hash)
            && self.key.as_deref().map_or(true, |key| key == event.key)
    }
}
