//! Subscription reads, lifecycle transitions, and the audit log.
//!
//! Rows are never deleted. Multi-statement transitions run inside one
//! transaction so the one-active-per-user invariant holds even if a step
//! fails mid-way (the partial unique index backs it up at the schema level).

use rusqlite::{params, Connection, Row};
use tracing::warn;

use tally_core::errors::{TallyError, TallyResult};
use tally_core::models::subscription::{Subscription, SubscriptionEvent, SubscriptionStatus};

use crate::to_storage_err;

const SUBSCRIPTION_COLUMNS: &str =
    "id, user_id, tier, status, period_start_at, period_end_at, created_at, updated_at";

fn row_to_subscription(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    let status_tag: String = row.get(3)?;
    let status = SubscriptionStatus::parse(&status_tag).unwrap_or_else(|| {
        // A status tag this build does not know: treat it as canceled, the
        // conservative reading (the gate will not grant paid entitlements).
        warn!(status = %status_tag, "Unknown subscription status in storage");
        SubscriptionStatus::Canceled
    });
    Ok(Subscription {
        id: row.get(0)?,
        user_id: row.get(1)?,
        tier: row.get(2)?,
        status,
        period_start_at: row.get(4)?,
        period_end_at: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// The user's active subscription, if any. The partial unique index
/// guarantees at most one row matches.
pub fn get_active(conn: &Connection, user_id: &str) -> TallyResult<Option<Subscription>> {
    let sql = format!(
        "SELECT {} FROM subscriptions WHERE user_id = ?1 AND status = 'active'",
        SUBSCRIPTION_COLUMNS
    );
    let result = conn.query_row(&sql, params![user_id], row_to_subscription);
    match result {
        Ok(sub) => Ok(Some(sub)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// The user's most recent subscription regardless of status.
pub fn get_latest(conn: &Connection, user_id: &str) -> TallyResult<Option<Subscription>> {
    let sql = format!(
        "SELECT {} FROM subscriptions WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC LIMIT 1",
        SUBSCRIPTION_COLUMNS
    );
    let result = conn.query_row(&sql, params![user_id], row_to_subscription);
    match result {
        Ok(sub) => Ok(Some(sub)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(to_storage_err(e.to_string())),
    }
}

/// Make `sub` the user's single active subscription: demote any existing
/// active row to canceled and insert the new one, in one transaction. Both
/// transitions land in the audit log.
pub fn activate(conn: &Connection, sub: &Subscription, event_type: &str) -> TallyResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;

    if let Some(previous) = get_active(&tx, &sub.user_id)? {
        tx.execute(
            "UPDATE subscriptions SET status = 'canceled', updated_at = unixepoch() WHERE id = ?1",
            params![previous.id],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
        append_event(
            &tx,
            &previous.id,
            &sub.user_id,
            event_type,
            Some("active"),
            "canceled",
        )?;
    }

    tx.execute(
        "INSERT INTO subscriptions
         (id, user_id, tier, status, period_start_at, period_end_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'active', ?4, ?5, ?6, ?7)",
        params![
            sub.id,
            sub.user_id,
            sub.tier,
            sub.period_start_at,
            sub.period_end_at,
            sub.created_at,
            sub.updated_at,
        ],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    append_event(&tx, &sub.id, &sub.user_id, event_type, None, "active")?;

    tx.commit().map_err(|e| to_storage_err(e.to_string()))
}

/// Transition the user's current non-canceled subscription to `new_status`,
/// appending an audit row.
pub fn transition(
    conn: &Connection,
    user_id: &str,
    new_status: SubscriptionStatus,
    event_type: &str,
) -> TallyResult<Subscription> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_transitionable(&tx, user_id)?;
    tx.execute(
        "UPDATE subscriptions SET status = ?2, updated_at = unixepoch() WHERE id = ?1",
        params![current.id, new_status.as_tag()],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    append_event(
        &tx,
        &current.id,
        user_id,
        event_type,
        Some(current.status.as_tag()),
        new_status.as_tag(),
    )?;
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Subscription {
        status: new_status,
        ..current
    })
}

/// Advance the period bounds on the user's current subscription and set it
/// active. Renewal is also the recovery path out of past_due.
pub fn renew(
    conn: &Connection,
    user_id: &str,
    period_start_at: i64,
    period_end_at: i64,
) -> TallyResult<Subscription> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| to_storage_err(e.to_string()))?;

    let current = current_transitionable(&tx, user_id)?;
    tx.execute(
        "UPDATE subscriptions
         SET status = 'active', period_start_at = ?2, period_end_at = ?3,
             updated_at = unixepoch()
         WHERE id = ?1",
        params![current.id, period_start_at, period_end_at],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    append_event(
        &tx,
        &current.id,
        user_id,
        "renewed",
        Some(current.status.as_tag()),
        "active",
    )?;
    tx.commit().map_err(|e| to_storage_err(e.to_string()))?;

    Ok(Subscription {
        status: SubscriptionStatus::Active,
        period_start_at,
        period_end_at,
        ..current
    })
}

/// Audit log for a user, newest first.
pub fn get_events(
    conn: &Connection,
    user_id: &str,
    limit: usize,
) -> TallyResult<Vec<SubscriptionEvent>> {
    let mut stmt = conn
        .prepare(
            "SELECT subscription_id, user_id, event_type, old_status, new_status, created_at
             FROM subscription_events WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT ?2",
        )
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map(params![user_id, limit as i64], |row| {
            Ok(SubscriptionEvent {
                subscription_id: row.get(0)?,
                user_id: row.get(1)?,
                event_type: row.get(2)?,
                old_status: row.get(3)?,
                new_status: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .map_err(|e| to_storage_err(e.to_string()))?;

    let mut events = Vec::new();
    for row in rows {
        events.push(row.map_err(|e| to_storage_err(e.to_string()))?);
    }
    Ok(events)
}

/// The row a billing transition applies to: the active subscription, or the
/// latest one as long as it is not canceled. A canceled subscription only
/// comes back through a new checkout.
fn current_transitionable(conn: &Connection, user_id: &str) -> TallyResult<Subscription> {
    if let Some(active) = get_active(conn, user_id)? {
        return Ok(active);
    }
    match get_latest(conn, user_id)? {
        Some(sub) if sub.status != SubscriptionStatus::Canceled => Ok(sub),
        _ => Err(TallyError::SubscriptionNotFound {
            user_id: user_id.to_string(),
        }),
    }
}

fn append_event(
    conn: &Connection,
    subscription_id: &str,
    user_id: &str,
    event_type: &str,
    old_status: Option<&str>,
    new_status: &str,
) -> TallyResult<()> {
    conn.execute(
        "INSERT INTO subscription_events
         (subscription_id, user_id, event_type, old_status, new_status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![subscription_id, user_id, event_type, old_status, new_status],
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}
