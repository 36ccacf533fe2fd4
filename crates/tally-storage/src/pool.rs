//! ConnectionPool — one writer + N read-only connections.
//!
//! The only place in the crate that holds `Mutex<Connection>`. Everything
//! else goes through `with_writer` / `with_reader`. Readers are selected
//! round-robin via an atomic counter.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use rusqlite::Connection;

use tally_core::errors::{StorageError, TallyError, TallyResult};

use crate::pragmas;

/// Default number of reader connections.
const DEFAULT_READ_POOL_SIZE: usize = 2;

pub struct ConnectionPool {
    writer: Mutex<Connection>,
    readers: Vec<Mutex<Connection>>,
    read_index: AtomicUsize,
}

impl ConnectionPool {
    /// Open a file-backed pool: 1 read-write connection plus
    /// `read_pool_size` read-only connections, all in WAL mode.
    pub fn open(path: &Path, read_pool_size: usize) -> TallyResult<Self> {
        let pool_size = if read_pool_size == 0 {
            DEFAULT_READ_POOL_SIZE
        } else {
            read_pool_size
        };

        let writer = Connection::open(path).map_err(|e| {
            TallyError::Storage(StorageError::pool(format!(
                "failed to open writer at {}: {}",
                path.display(),
                e
            )))
        })?;
        pragmas::configure_connection(&writer)?;

        let mut readers = Vec::with_capacity(pool_size);
        for i in 0..pool_size {
            let reader = Connection::open_with_flags(
                path,
                rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY
                    | rusqlite::OpenFlags::SQLITE_OPEN_NO_MUTEX,
            )
            .map_err(|e| {
                TallyError::Storage(StorageError::pool(format!(
                    "failed to open reader {}: {}",
                    i, e
                )))
            })?;
            pragmas::configure_readonly_connection(&reader)?;
            readers.push(Mutex::new(reader));
        }

        Ok(Self {
            writer: Mutex::new(writer),
            readers,
            read_index: AtomicUsize::new(0),
        })
    }

    /// Open an in-memory pool. A private in-memory database is visible only
    /// to the connection that opened it, so the pool holds no readers and
    /// `with_reader` falls back to the single writer connection.
    pub fn open_in_memory() -> TallyResult<Self> {
        let writer = Connection::open_in_memory().map_err(|e| {
            TallyError::Storage(StorageError::pool(format!(
                "failed to open in-memory writer: {}",
                e
            )))
        })?;
        pragmas::configure_connection(&writer)?;

        Ok(Self {
            writer: Mutex::new(writer),
            readers: Vec::new(),
            read_index: AtomicUsize::new(0),
        })
    }

    /// Execute a closure with the writer connection.
    pub fn with_writer<F, T>(&self, f: F) -> TallyResult<T>
    where
        F: FnOnce(&Connection) -> TallyResult<T>,
    {
        let conn = self.writer.lock().map_err(|e| {
            TallyError::Storage(StorageError::pool(format!("writer lock poisoned: {}", e)))
        })?;
        f(&conn)
    }

    /// Execute a closure with a reader connection (round-robin).
    pub fn with_reader<F, T>(&self, f: F) -> TallyResult<T>
    where
        F: FnOnce(&Connection) -> TallyResult<T>,
    {
        if self.readers.is_empty() {
            return self.with_writer(f);
        }

        let index = self.read_index.fetch_add(1, Ordering::Relaxed) % self.readers.len();
        let conn = self.readers[index].lock().map_err(|e| {
            TallyError::Storage(StorageError::pool(format!("reader lock poisoned: {}", e)))
        })?;
        f(&conn)
    }

    /// Whether the writer connection is in WAL mode.
    pub fn is_wal_mode(&self) -> bool {
        self.with_writer(|conn| {
            let mode: String = conn
                .query_row("PRAGMA journal_mode", [], |row| row.get(0))
                .unwrap_or_default();
            Ok(mode.eq_ignore_ascii_case("wal"))
        })
        .unwrap_or(false)
    }
}
