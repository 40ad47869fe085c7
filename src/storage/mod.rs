//! Storage utilities and abstractions.
//!
//! This module provides shared storage infrastructure that the registry
//! persistence layer builds on.
//!
//! ## Modules
//!
//! - `rocksdb`: Generic RocksDB utilities (configuration, handle, atomic batches)

pub mod rocksdb;

pub use self::rocksdb::{RocksDbConfig, RocksDbHandle, StorageBatch};
