//! SQLite PRAGMA configuration for tally connections.
//!
//! Must be applied to every connection immediately after opening:
//! - WAL so readers keep working during a write
//! - busy_timeout for write-lock contention (primary concurrency mechanism)
//! - NORMAL synchronous for the WAL durability trade-off
//! - foreign_keys ON; templates and audit rows reference subscriptions/users

use rusqlite::Connection;

use tally_core::errors::TallyResult;

use crate::to_storage_err;

/// Configure a read-write connection.
pub fn configure_connection(conn: &Connection) -> TallyResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

/// Configure a read-only pool connection. Same PRAGMAs plus `query_only` to
/// prevent accidental writes through a reader.
pub fn configure_readonly_connection(conn: &Connection) -> TallyResult<()> {
    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA foreign_keys = ON;
        PRAGMA busy_timeout = 5000;
        PRAGMA cache_size = -8000;
        PRAGMA temp_store = MEMORY;
        PRAGMA query_only = ON;
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configure_connection_sets_busy_timeout() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let timeout: i64 = conn
            .pragma_query_value(None, "busy_timeout", |row| row.get(0))
            .unwrap();
        assert_eq!(timeout, 5000);
    }

    #[test]
    fn test_configure_connection_enables_foreign_keys() {
        let conn = Connection::open_in_memory().unwrap();
        configure_connection(&conn).unwrap();

        let fk: i64 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }

    #[test]
    fn test_readonly_connection_rejects_writes() {
        let conn = Connection::open_in_memory().unwrap();
        configure_readonly_connection(&conn).unwrap();

        let result = conn.execute_batch("CREATE TABLE t (x INTEGER)");
        assert!(result.is_err());
    }
}
