//! Fixed-width digests used as lookup keys and content references.
//!
//! [`NameHash`] is the registry key for user and forum names and the thread
//! key for subjects. [`ContentHash`] references off-chain content such as a
//! post body or an attachment. Both are 32-byte SHA3-256 digests computed over
//! the raw bytes of the input, with no normalisation: names are compared
//! case-sensitively and byte-exactly.

use crate::error::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Sha3_256};
use std::fmt;

/// Width of every digest in bytes.
pub const HASH_LEN: usize = 32;

/// Computes the SHA3-256 digest of `data`.
pub fn sha3_256(data: &[u8]) -> [u8; HASH_LEN] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hashes a human-readable name into its registry key.
///
/// Pure and total: the same UTF-8 bytes always produce the same key. Clients
/// can call this locally to precompute keys before submitting calls.
pub fn hash_name(name: &str) -> NameHash {
    NameHash(sha3_256(name.as_bytes()))
}

fn decode_hex(s: &str, what: &str) -> Result<[u8; HASH_LEN]> {
    let bytes = hex::decode(s)
        .map_err(|_| RegistryError::validation(format!("Invalid hex string for {}", what)))?;
    if bytes.len() != HASH_LEN {
        return Err(RegistryError::validation(format!(
            "{} must be exactly {} bytes ({} hex characters)",
            what,
            HASH_LEN,
            HASH_LEN * 2
        )));
    }
    let mut arr = [0u8; HASH_LEN];
    arr.copy_from_slice(&bytes);
    Ok(arr)
}

/// Digest of a user name, forum name or thread subject.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NameHash([u8; HASH_LEN]);

impl NameHash {
    /// Hashes `name`. Equivalent to [`hash_name`].
    pub fn of(name: &str) -> Self {
        hash_name(name)
    }

    /// Creates a NameHash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a NameHash from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_hex(s, "NameHash").map(Self)
    }

    /// Returns a short form of the hash for display (first 8 bytes / 16 hex chars).
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameHash({}...)", self.short())
    }
}

impl fmt::Display for NameHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

/// Digest referencing a post body or attachment stored elsewhere.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash([u8; HASH_LEN]);

impl ContentHash {
    /// Computes the content hash of raw bytes.
    pub fn compute(data: &[u8]) -> Self {
        Self(sha3_256(data))
    }

    /// Creates a ContentHash from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Returns the raw hash bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses a ContentHash from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        decode_hex(s, "ContentHash").map(Self)
    }

    /// Returns a short form of the hash for display.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ContentHash({}...)", self.short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}
