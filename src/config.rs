//! Registry configuration.
//!
//! A [`RegistryConfig`] names the registry administrator and carries the
//! content limits and storage tuning. Every field except `admin` has a
//! default, so the smallest valid JSON document is:
//!
//! ```json
//! { "admin": "<64 hex characters>" }
//! ```

use crate::error::{RegistryError, Result};
use crate::identity::Identity;
use crate::registry::constants::{
    DEFAULT_MAX_ATTACHMENTS, DEFAULT_MAX_FILENAME_LEN, DEFAULT_MAX_NAME_LEN,
    DEFAULT_MAX_SUBJECT_LEN,
};
use crate::storage::RocksDbConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Content limits enforced before any state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Maximum user/forum name size in bytes.
    pub max_name_len: usize,
    /// Maximum thread subject size in bytes.
    pub max_subject_len: usize,
    /// Maximum number of attachments per post.
    pub max_attachments: usize,
    /// Maximum attachment file name size in bytes.
    pub max_filename_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_name_len: DEFAULT_MAX_NAME_LEN,
            max_subject_len: DEFAULT_MAX_SUBJECT_LEN,
            max_attachments: DEFAULT_MAX_ATTACHMENTS,
            max_filename_len: DEFAULT_MAX_FILENAME_LEN,
        }
    }
}

/// Top-level configuration for a [`Registry`](crate::registry::Registry).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Identity allowed to adjust reputation and transfer the admin role.
    #[serde(with = "identity_hex")]
    pub admin: Identity,
    /// Content limits.
    #[serde(default)]
    pub limits: Limits,
    /// RocksDB tuning used by [`RegistryStorage`](crate::registry::RegistryStorage).
    #[serde(default)]
    pub storage: RocksDbConfig,
}

impl RegistryConfig {
    /// Creates a configuration with default limits for the given administrator.
    pub fn new(admin: Identity) -> Self {
        Self {
            admin,
            limits: Limits::default(),
            storage: RocksDbConfig::default(),
        }
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| RegistryError::config(format!("Invalid config JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "Loaded registry config");
        Self::from_json_str(&json)
    }

    /// Serializes this configuration to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| RegistryError::serialization(format!("Failed to encode config: {}", e)))
    }

    /// Rejects limits that would make every call fail.
    pub fn validate(&self) -> Result<()> {
        let limits = &self.limits;
        if limits.max_name_len == 0 {
            return Err(RegistryError::config("max_name_len must be greater than 0"));
        }
        if limits.max_subject_len == 0 {
            return Err(RegistryError::config(
                "max_subject_len must be greater than 0",
            ));
        }
        if limits.max_filename_len == 0 {
            return Err(RegistryError::config(
                "max_filename_len must be greater than 0",
            ));
        }
        if self.storage.max_open_files == 0 {
            return Err(RegistryError::config("max_open_files must not be 0"));
        }
        Ok(())
    }
}

mod identity_hex {
    use crate::identity::Identity;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(id: &Identity, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&id.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Identity, D::Error> {
        let hex = String::deserialize(d)?;
        Identity::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}
