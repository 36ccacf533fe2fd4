//! Schema SQL constants, shared by migrations and tests.

/// V1 schema: 4 tables + indexes.
///
/// - `subscriptions` — never deleted; the partial unique index enforces
///   at most one active row per user at the storage layer.
/// - `subscription_events` — append-only audit log, exempt from retention.
/// - `usage_counters` — one row per (user, resource, period); mutated only
///   by the conditional increment in queries/usage_ops.rs.
/// - `templates` — the gated domain resource.
pub const TALLY_TABLES_V1: &str = "
    CREATE TABLE IF NOT EXISTS subscriptions (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        tier TEXT NOT NULL,
        status TEXT NOT NULL,
        period_start_at INTEGER NOT NULL,
        period_end_at INTEGER NOT NULL,
        created_at INTEGER NOT NULL DEFAULT (unixepoch()),
        updated_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE UNIQUE INDEX IF NOT EXISTS idx_subscriptions_one_active
        ON subscriptions(user_id) WHERE status = 'active';
    CREATE INDEX IF NOT EXISTS idx_subscriptions_user
        ON subscriptions(user_id, created_at);

    CREATE TABLE IF NOT EXISTS subscription_events (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        subscription_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        event_type TEXT NOT NULL,
        old_status TEXT,
        new_status TEXT NOT NULL,
        created_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_subscription_events_user
        ON subscription_events(user_id);

    CREATE TABLE IF NOT EXISTS usage_counters (
        user_id TEXT NOT NULL,
        resource_type TEXT NOT NULL,
        period_start INTEGER NOT NULL,
        count INTEGER NOT NULL DEFAULT 0,
        updated_at INTEGER NOT NULL DEFAULT (unixepoch()),
        PRIMARY KEY (user_id, resource_type, period_start)
    ) STRICT;

    CREATE TABLE IF NOT EXISTS templates (
        id TEXT PRIMARY KEY NOT NULL,
        user_id TEXT NOT NULL,
        name TEXT NOT NULL,
        description TEXT,
        hashtags TEXT NOT NULL DEFAULT '[]',
        category TEXT,
        platform TEXT NOT NULL DEFAULT 'all',
        created_at INTEGER NOT NULL DEFAULT (unixepoch()),
        updated_at INTEGER NOT NULL DEFAULT (unixepoch())
    ) STRICT;

    CREATE INDEX IF NOT EXISTS idx_templates_user
        ON templates(user_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_templates_category
        ON templates(user_id, category);
";

/// All 4 table names.
pub const TALLY_TABLE_NAMES: [&str; 4] = [
    "subscriptions",
    "subscription_events",
    "usage_counters",
    "templates",
];
