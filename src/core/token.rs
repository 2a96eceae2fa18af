use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use serde::{Deserialize, Serialize};

/// Opaque tag binding one submission to its streamed result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorrelationToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Source of correlation tokens. One token per execute-and-wait attempt.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self) -> CorrelationToken;
}

// --- Real implementations ---

/// Random v4 UUIDs (122 random bits).
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidTokenGenerator;

impl TokenGenerator for UuidTokenGenerator {
    fn generate(&self) -> CorrelationToken {
        CorrelationToken(uuid::Uuid::new_v4().to_string())
    }
}

/// 128-bit hex tokens drawn from an injected RNG.
pub struct EntropyTokenGenerator<R> {
    rng: Mutex<R>,
}

impl<R: RngCore + Send> EntropyTokenGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl EntropyTokenGenerator<StdRng> {
    /// Deterministic generator for reproducible runs.
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: RngCore + Send> TokenGenerator for EntropyTokenGenerator<R> {
    fn generate(&self) -> CorrelationToken {
        let mut bytes = [0u8; 16];
        self.rng.lock().fill_bytes(&mut bytes);
        CorrelationToken(hex::encode(bytes))
    }
}

// --- Fake implementations ---

pub struct SequentialTokenGenerator {
    pub prefix: String,
    pub counter: AtomicU64,
}

impl SequentialTokenGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU64::new(0),
        }
    }
}

impl TokenGenerator for SequentialTokenGenerator {
    fn generate(&self) -> CorrelationToken {
        let id = self.counter.fetch_add(1, Ordering::SeqCst);
        CorrelationToken(format!("{}-{}", self.prefix, id))
    }
}
