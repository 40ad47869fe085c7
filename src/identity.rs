//! Caller identity primitive.
//!
//! The execution environment attaches an unforgeable [`Identity`] to every
//! call. The registry never authenticates it; it only compares identities
//! against recorded owners and the administrator role.

use crate::error::{RegistryError, Result};
use crate::hash::{sha3_256, HASH_LEN};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Opaque 32-byte identity of a caller or owner.
#[derive(Clone, Copy, Eq, Serialize, Deserialize)]
pub struct Identity([u8; HASH_LEN]);

impl Identity {
    /// Creates an identity from raw bytes.
    pub fn from_bytes(bytes: [u8; HASH_LEN]) -> Self {
        Self(bytes)
    }

    /// Deterministically derives an identity from a label.
    ///
    /// Handy for tests and tools that need stable accounts.
    pub fn derive(label: &str) -> Self {
        let mut input = Vec::with_capacity(label.len() + 9);
        input.extend_from_slice(b"identity:");
        input.extend_from_slice(label.as_bytes());
        Self(sha3_256(&input))
    }

    /// Returns the raw identity bytes.
    pub fn as_bytes(&self) -> &[u8; HASH_LEN] {
        &self.0
    }

    /// Returns hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parses an identity from a hex string.
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s)
            .map_err(|_| RegistryError::validation("Invalid hex string for Identity"))?;
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| {
            RegistryError::validation("Identity must be exactly 32 bytes (64 hex characters)")
        })?;
        Ok(Self(arr))
    }

    /// Returns a short form for display and logs.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..8])
    }

    /// Constant-time equality, used for every authorization check.
    pub fn matches(&self, other: &Identity) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl PartialEq for Identity {
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl std::hash::Hash for Identity {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({}...)", self.short())
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_stable() {
        assert_eq!(Identity::derive("alice"), Identity::derive("alice"));
        assert_ne!(Identity::derive("alice"), Identity::derive("bob"));
    }

    #[test]
    fn test_hex_roundtrip_and_rejects_bad_length() {
        let id = Identity::derive("forum-owner");
        assert_eq!(Identity::from_hex(&id.to_hex()).unwrap(), id);
        assert!(matches!(
            Identity::from_hex("00ff"),
            Err(RegistryError::Validation(_))
        ));
    }

    #[test]
    fn test_matches() {
        let a = Identity::from_bytes([7u8; 32]);
        let b = Identity::from_bytes([7u8; 32]);
        let mut other = [7u8; 32];
        other[31] = 8;
        assert!(a.matches(&b));
        assert!(!a.matches(&Identity::from_bytes(other)));
    }
}
