//! Core primitive types shared across the crate.
//!
//! Identities are Ed25519 public keys: raw 32 bytes internally, base58 on
//! the wire and in every JSON document (bootstrap files, request bodies,
//! responses).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// IDT balance or penalty amount.
pub type IdtAmount = u64;

/// Replay-prevention nonce, strictly increasing per signer and namespace.
pub type Nonce = u64;

/// Opaque proof identifier. Validated externally; `"0"` is reserved for
/// genesis records.
pub type ProofId = String;

/// A user identity: a raw Ed25519 public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserId([u8; 32]);

impl UserId {
    /// Length of a raw identity in bytes.
    pub const LEN: usize = 32;

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parse a base58-encoded identity as it appears on the wire.
    pub fn from_base58(s: &str) -> Result<Self, Error> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| Error::BadRequest(format!("invalid base58 identity: {e}")))?;
        if bytes.len() != Self::LEN {
            return Err(Error::BadRequest(format!(
                "identity must be {} bytes, got {}",
                Self::LEN,
                bytes.len()
            )));
        }
        let mut raw = [0u8; Self::LEN];
        raw.copy_from_slice(&bytes);
        Ok(Self(raw))
    }

    pub fn to_base58(&self) -> String {
        bs58::encode(self.0).into_string()
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_base58())
    }
}

impl Serialize for UserId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        UserId::from_base58(&s).map_err(serde::de::Error::custom)
    }
}

/// Current Unix timestamp in seconds.
pub fn unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
