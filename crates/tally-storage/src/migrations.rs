//! Schema versioning using PRAGMA user_version.
//!
//! - `PRAGMA user_version` tracks the version, no extra tables
//! - Each version bump is a const SQL string in schema.rs

use rusqlite::Connection;
use tracing::info;

use tally_core::errors::TallyResult;

use crate::schema::TALLY_TABLES_V1;
use crate::to_storage_err;

/// Current schema version. Bump this when adding new migrations.
pub const CURRENT_VERSION: u32 = 1;

/// Read the schema version from the database.
pub fn get_schema_version(conn: &Connection) -> TallyResult<u32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get::<_, u32>(0))
        .map_err(|e| to_storage_err(e.to_string()))
}

fn set_schema_version(conn: &Connection, version: u32) -> TallyResult<()> {
    conn.pragma_update(None, "user_version", version)
        .map_err(|e| to_storage_err(e.to_string()))
}

/// Run all pending migrations to bring the database up to CURRENT_VERSION.
///
/// Idempotent; returns the version the database ends up at.
pub fn migrate(conn: &Connection) -> TallyResult<u32> {
    let current = get_schema_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(current);
    }

    if current < 1 {
        info!("Migrating tally schema: 0 → 1 (initial tables)");
        conn.execute_batch(TALLY_TABLES_V1)
            .map_err(|e| to_storage_err(e.to_string()))?;
        set_schema_version(conn, 1)?;
    }

    // Future migrations go here:
    // if current < 2 { ... }

    let final_version = get_schema_version(conn)?;
    info!(from = current, to = final_version, "Schema migration complete");
    Ok(final_version)
}
