//! Engine identity hashes.
//!
//! The engine addresses instances, processes and executions by a 32-byte
//! digest. The human form is base58, used for display, CLI arguments and the
//! serialized form of every record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::EncodingError;

/// A 32-byte content identity.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Hash([u8; Hash::LEN]);

impl Hash {
    pub const LEN: usize = 32;

    pub const fn from_bytes(bytes: [u8; Hash::LEN]) -> Self {
        Self(bytes)
    }

    /// SHA-256 of `data`.
    pub fn digest(data: &[u8]) -> Self {
        let mut bytes = [0u8; Hash::LEN];
        bytes.copy_from_slice(&Sha256::digest(data));
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; Hash::LEN] {
        &self.0
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }

    pub fn from_base58(encoded: &str) -> Result<Self, EncodingError> {
        let bytes = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| EncodingError::InvalidBase58(e.to_string()))?;
        let found = bytes.len();
        let bytes: [u8; Hash::LEN] = bytes.try_into().map_err(|_| EncodingError::InvalidLength {
            expected: Hash::LEN,
            found,
        })?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash({})", self.to_base58())
    }
}

impl FromStr for Hash {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

impl Serialize for Hash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Hash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        Hash::from_base58(&encoded).map_err(serde::de::Error::custom)
    }
}
