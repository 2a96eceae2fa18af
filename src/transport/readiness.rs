//! Stream readiness signalling.
//!
//! Every stream opens with a metadata frame. Its `status` header tells the
//! client whether the server-side filter is installed:
//!
//! | `status` header | Classification | Client reaction |
//! |-----------------|----------------|-----------------|
//! | `ready` | [`Readiness::Ready`] | proceed (submit) |
//! | absent | [`Readiness::NoStatus`] | ignore, wait for the next frame |
//! | anything else | [`Readiness::Rejected`] | fatal for the stream |

use std::collections::BTreeMap;

use crate::error::TransportError;

pub const STATUS_HEADER: &str = "status";
pub const STATUS_READY: &str = "ready";

/// Header map sent by the engine on a stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamMetadata {
    headers: BTreeMap<String, String>,
}

impl StreamMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata confirming the stream is live.
    pub fn ready() -> Self {
        Self::new().with_header(STATUS_HEADER, STATUS_READY)
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(String::as_str)
    }

    pub fn status(&self) -> Option<&str> {
        self.get(STATUS_HEADER)
    }
}

/// Classification of one readiness frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    Ready,
    /// Intermediate frame without a status; another frame follows.
    NoStatus,
    Rejected(TransportError),
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, Readiness::Ready)
    }
}

pub fn check_stream_ready(metadata: &StreamMetadata) -> Readiness {
    match metadata.status() {
        None => Readiness::NoStatus,
        Some(STATUS_READY) => Readiness::Ready,
        Some(other) => Readiness::Rejected(TransportError::StreamRejected(format!(
            "{}={}",
            STATUS_HEADER, other
        ))),
    }
}
