//! Shared RocksDB storage utilities.
//!
//! This module provides generic utilities for RocksDB-based storage. It
//! contains no domain-specific logic - just serialization-aware helpers
//! around a column-family database handle.
//!
//! ## Key Features
//!
//! - Configurable RocksDB setup with sensible defaults
//! - Generic key-value operations with bincode serialization
//! - Atomic multi-record writes through [`StorageBatch`]

use crate::error::{RegistryError, Result};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, MultiThreaded, Options,
    WriteBatch,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace, warn};

// =============================================================================
// RocksDB Configuration
// =============================================================================

/// Configuration for RocksDB storage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RocksDbConfig {
    /// Maximum number of open files.
    pub max_open_files: i32,
    /// Number of log files to keep.
    pub keep_log_file_num: usize,
    /// Maximum WAL size in bytes.
    pub max_wal_size: u64,
    /// Write buffer size in bytes.
    pub write_buffer_size: usize,
    /// Maximum number of write buffers.
    pub max_write_buffer_number: i32,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            max_open_files: 128,
            keep_log_file_num: 2,
            max_wal_size: 32 * 1024 * 1024,      // 32MB
            write_buffer_size: 16 * 1024 * 1024, // 16MB
            max_write_buffer_number: 2,
        }
    }
}

impl RocksDbConfig {
    /// Creates a configuration for long-running deployments.
    ///
    /// Uses larger buffers and more files for higher throughput.
    pub fn for_server() -> Self {
        Self {
            max_open_files: 256,
            keep_log_file_num: 3,
            max_wal_size: 64 * 1024 * 1024,      // 64MB
            write_buffer_size: 64 * 1024 * 1024, // 64MB
            max_write_buffer_number: 3,
        }
    }

    /// Builds RocksDB Options from this configuration.
    pub fn build_options(&self) -> Options {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(self.max_open_files);
        opts.set_keep_log_file_num(self.keep_log_file_num);
        opts.set_max_total_wal_size(self.max_wal_size);
        opts.increase_parallelism(num_cpus::get() as i32);
        opts.set_write_buffer_size(self.write_buffer_size);
        opts.set_max_write_buffer_number(self.max_write_buffer_number);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts
    }
}

// =============================================================================
// Database Handle Wrapper
// =============================================================================

/// A wrapper around RocksDB that provides common operations.
///
/// This is designed to be embedded in storage structs to provide
/// shared functionality while allowing storage-specific extensions.
pub struct RocksDbHandle {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
}

impl RocksDbHandle {
    /// Opens a RocksDB database with the given column families.
    pub fn open(
        db_path: impl AsRef<Path>,
        config: &RocksDbConfig,
        column_families: &[&str],
    ) -> Result<Self> {
        let opts = config.build_options();
        let cf_opts = Options::default();

        let cf_descriptors: Vec<_> = column_families
            .iter()
            .map(|cf| ColumnFamilyDescriptor::new(*cf, cf_opts.clone()))
            .collect();

        let db = DBWithThreadMode::<MultiThreaded>::open_cf_descriptors(
            &opts,
            db_path.as_ref(),
            cf_descriptors,
        )
        .map_err(|e| RegistryError::storage(format!("Failed to open RocksDB: {}", e)))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Gets a column family handle.
    pub fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| RegistryError::storage(format!("Column family '{}' not found", name)))
    }

    /// Stores a serializable value at the given key.
    pub fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = encode(value)?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            value_bytes = bytes.len(),
            "db_put: storing serialized value"
        );

        self.db
            .put_cf(&cf, key, &bytes)
            .map_err(|e| RegistryError::storage(format!("Failed to write: {}", e)))?;

        Ok(())
    }

    /// Loads and deserializes a value from the given key.
    pub fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;

        match self.db.get_cf(&cf, key) {
            Ok(Some(bytes)) => {
                trace!(
                    cf = cf_name,
                    key_len = key.len(),
                    value_bytes = bytes.len(),
                    "db_get: found record"
                );
                Ok(Some(decode(&bytes)?))
            }
            Ok(None) => {
                trace!(cf = cf_name, key_len = key.len(), "db_get: key not found");
                Ok(None)
            }
            Err(e) => Err(RegistryError::storage(format!("Failed to read: {}", e))),
        }
    }

    /// Checks if a key exists.
    pub fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        let exists = self
            .db
            .get_cf(&cf, key)
            .map(|v| v.is_some())
            .map_err(|e| RegistryError::storage(format!("Failed to check key: {}", e)))?;

        trace!(
            cf = cf_name,
            key_len = key.len(),
            exists = exists,
            "db_exists: checked key existence"
        );

        Ok(exists)
    }

    /// Collects every value of a column family in key order, deserializing each.
    ///
    /// Unlike a best-effort scan, a record that fails to decode aborts the
    /// whole collection.
    pub fn collect_all<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let iter = self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start);

        let mut values = Vec::new();
        for item in iter {
            match item {
                Ok((_, value)) => values.push(decode(&value)?),
                Err(e) => {
                    warn!("Iterator error: {}", e);
                    return Err(RegistryError::storage(format!("Failed to iterate: {}", e)));
                }
            }
        }

        debug!(
            cf = cf_name,
            records_collected = values.len(),
            "db_collect_all: completed full iteration"
        );

        Ok(values)
    }

    /// Lists every key of a column family in key order.
    pub fn keys(&self, cf_name: &str) -> Result<Vec<Box<[u8]>>> {
        let cf = self.cf(cf_name)?;
        let mut keys = Vec::new();
        for item in self.db.iterator_cf(&cf, rocksdb::IteratorMode::Start) {
            let (key, _) =
                item.map_err(|e| RegistryError::storage(format!("Failed to iterate: {}", e)))?;
            keys.push(key);
        }
        trace!(cf = cf_name, keys = keys.len(), "db_keys: listed keys");
        Ok(keys)
    }

    /// Starts a batch of writes that is committed atomically.
    pub fn batch(&self) -> StorageBatch<'_> {
        StorageBatch {
            handle: self,
            batch: WriteBatch::default(),
            records: 0,
        }
    }

    /// Returns database statistics.
    pub fn stats(&self) -> String {
        self.db
            .property_value("rocksdb.stats")
            .ok()
            .flatten()
            .unwrap_or_else(|| "Stats unavailable".to_string())
    }
}

impl std::fmt::Debug for RocksDbHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksDbHandle")
            .field("db", &"RocksDB")
            .finish()
    }
}

/// A set of writes applied all-or-nothing by [`StorageBatch::commit`].
pub struct StorageBatch<'a> {
    handle: &'a RocksDbHandle,
    batch: WriteBatch,
    records: usize,
}

impl StorageBatch<'_> {
    /// Queues a serializable value for the given key.
    pub fn put<T: Serialize>(&mut self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.handle.cf(cf_name)?;
        let bytes = encode(value)?;
        self.batch.put_cf(&cf, key, bytes);
        self.records += 1;
        Ok(())
    }

    /// Queues a delete of the given key.
    pub fn delete(&mut self, cf_name: &str, key: &[u8]) -> Result<()> {
        let cf = self.handle.cf(cf_name)?;
        self.batch.delete_cf(&cf, key);
        self.records += 1;
        Ok(())
    }

    /// Queues a delete of every key currently stored in a column family.
    ///
    /// Writes queued after this call survive the commit, so a batch can
    /// replace the whole contents of a column family.
    pub fn clear(&mut self, cf_name: &str) -> Result<usize> {
        let keys = self.handle.keys(cf_name)?;
        for key in &keys {
            self.delete(cf_name, key)?;
        }
        Ok(keys.len())
    }

    /// Number of queued writes.
    pub fn len(&self) -> usize {
        self.records
    }

    /// Returns true if nothing has been queued.
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }

    /// Writes every queued record in one atomic RocksDB write.
    pub fn commit(self) -> Result<()> {
        let records = self.records;
        self.handle
            .db
            .write(self.batch)
            .map_err(|e| RegistryError::storage(format!("Failed to commit batch: {}", e)))?;
        debug!(records, "db_batch_commit: committed batch");
        Ok(())
    }
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serialize(value)
        .map_err(|e| RegistryError::serialization(format!("Failed to serialize: {}", e)))
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    bincode::deserialize(bytes)
        .map_err(|e| RegistryError::serialization(format!("Failed to deserialize: {}", e)))
}
