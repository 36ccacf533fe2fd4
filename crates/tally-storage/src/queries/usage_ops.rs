//! Usage counter operations.
//!
//! The conditional increment is the only write path for counters. It is a
//! single upsert statement, atomic under SQLite's write lock: two concurrent
//! callers can never both observe count < limit and both slip past it. No
//! code anywhere may read a count and write it back separately.

use rusqlite::{params, Connection};
use tracing::warn;

use tally_core::errors::TallyResult;
use tally_core::models::usage::{IncrementOutcome, ResourceType};

use crate::to_storage_err;

/// Increment the counter for (user, resource, period) if the current count
/// is below `limit`. Creates the row lazily on first consumption.
///
/// Returns the resulting count and whether the unit was consumed. A
/// rejection leaves the stored count unchanged. Each accepted call consumes
/// one unit — retries of an already-successful action are not idempotent.
pub fn increment_if_below(
    conn: &Connection,
    user_id: &str,
    resource: ResourceType,
    period_start: i64,
    limit: u32,
) -> TallyResult<IncrementOutcome> {
    // A zero limit can never admit the first unit; the upsert below would
    // insert count = 1 for a missing row, so reject before touching state.
    if limit == 0 {
        let current = usage_count(conn, user_id, resource, period_start)?;
        return Ok(IncrementOutcome {
            new_count: current,
            accepted: false,
        });
    }

    let result = conn.query_row(
        "INSERT INTO usage_counters (user_id, resource_type, period_start, count, updated_at)
         VALUES (?1, ?2, ?3, 1, unixepoch())
         ON CONFLICT(user_id, resource_type, period_start)
         DO UPDATE SET count = count + 1, updated_at = unixepoch()
         WHERE usage_counters.count < ?4
         RETURNING count",
        params![user_id, resource.as_tag(), period_start, limit as i64],
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(count) => Ok(IncrementOutcome {
            new_count: clamp_count(user_id, resource, count),
            accepted: true,
        }),
        // The conflict branch's WHERE filtered the update out: at limit.
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            let current = usage_count(conn, user_id, resource, period_start)?;
            Ok(IncrementOutcome {
                new_count: current,
                accepted: false,
            })
        }
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Current count for (user, resource, period). Missing row reads as 0.
/// Read-only.
pub fn usage_count(
    conn: &Connection,
    user_id: &str,
    resource: ResourceType,
    period_start: i64,
) -> TallyResult<u32> {
    let result = conn.query_row(
        "SELECT count FROM usage_counters
         WHERE user_id = ?1 AND resource_type = ?2 AND period_start = ?3",
        params![user_id, resource.as_tag(), period_start],
        |row| row.get::<_, i64>(0),
    );

    match result {
        Ok(count) => Ok(clamp_count(user_id, resource, count)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(0),
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Delete counter rows from periods that started before `cutoff_epoch`.
/// Returns the number of rows removed.
pub fn apply_retention(conn: &Connection, cutoff_epoch: i64) -> TallyResult<usize> {
    conn.execute(
        "DELETE FROM usage_counters WHERE period_start < ?1",
        params![cutoff_epoch],
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// A stored count must be non-negative. A negative value is a consistency
/// anomaly: log it and read as 0 rather than failing or denying the request.
fn clamp_count(user_id: &str, resource: ResourceType, count: i64) -> u32 {
    if count < 0 {
        warn!(
            user = user_id,
            resource = resource.as_tag(),
            count,
            "Negative usage count in storage — treating as 0"
        );
        0
    } else {
        count as u32
    }
}
