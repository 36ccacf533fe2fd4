//! # tally-storage
//!
//! SQLite persistence layer for the tally quota system.
//! Implements the `ITallyStorage` trait from tally-core.
//! Single write connection + read pool (WAL mode).

pub mod engine;
pub mod migrations;
pub mod pool;
pub mod pragmas;
pub mod queries;
pub mod schema;

pub use engine::StorageEngine;

use tally_core::errors::{StorageError, TallyError};

/// Helper to convert a driver error message into a TallyError::Storage.
pub fn to_storage_err(msg: String) -> TallyError {
    TallyError::Storage(StorageError::sqlite(msg))
}
