//! StorageEngine — the `ITallyStorage` implementation over a connection
//! pool. Writes go through the single writer connection; reads go through
//! the round-robin reader pool.

use std::path::Path;

use tally_core::errors::TallyResult;
use tally_core::models::subscription::{Subscription, SubscriptionEvent, SubscriptionStatus};
use tally_core::models::template::{HashtagTemplate, TemplateFilter, TemplatePage, TemplateUpdate};
use tally_core::models::usage::{IncrementOutcome, ResourceType};
use tally_core::traits::{ITallyStorage, StorageHealth};

use crate::pool::ConnectionPool;
use crate::queries::{subscription_ops, template_ops, usage_ops};
use crate::{migrations, to_storage_err};

pub struct StorageEngine {
    pool: ConnectionPool,
}

impl StorageEngine {
    /// Open a file-backed engine and bring the schema up to date.
    pub fn open(path: &Path, read_pool_size: usize) -> TallyResult<Self> {
        let engine = Self {
            pool: ConnectionPool::open(path, read_pool_size)?,
        };
        engine.migrate()?;
        Ok(engine)
    }

    /// In-memory engine for tests and previews.
    pub fn open_in_memory() -> TallyResult<Self> {
        let engine = Self {
            pool: ConnectionPool::open_in_memory()?,
        };
        engine.migrate()?;
        Ok(engine)
    }

    /// Run an arbitrary statement on the writer connection. Test hook and
    /// escape hatch for one-off maintenance.
    pub fn execute(&self, sql: &str, params: impl rusqlite::Params) -> TallyResult<usize> {
        self.pool.with_writer(|conn| {
            conn.execute(sql, params)
                .map_err(|e| to_storage_err(e.to_string()))
        })
    }
}

impl ITallyStorage for StorageEngine {
    fn activate_subscription(&self, sub: &Subscription, event_type: &str) -> TallyResult<()> {
        self.pool
            .with_writer(|conn| subscription_ops::activate(conn, sub, event_type))
    }

    fn transition_subscription(
        &self,
        user_id: &str,
        new_status: SubscriptionStatus,
        event_type: &str,
    ) -> TallyResult<Subscription> {
        self.pool
            .with_writer(|conn| subscription_ops::transition(conn, user_id, new_status, event_type))
    }

    fn renew_subscription(
        &self,
        user_id: &str,
        period_start_at: i64,
        period_end_at: i64,
    ) -> TallyResult<Subscription> {
        self.pool.with_writer(|conn| {
            subscription_ops::renew(conn, user_id, period_start_at, period_end_at)
        })
    }

    fn get_active_subscription(&self, user_id: &str) -> TallyResult<Option<Subscription>> {
        self.pool
            .with_reader(|conn| subscription_ops::get_active(conn, user_id))
    }

    fn get_latest_subscription(&self, user_id: &str) -> TallyResult<Option<Subscription>> {
        self.pool
            .with_reader(|conn| subscription_ops::get_latest(conn, user_id))
    }

    fn get_subscription_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> TallyResult<Vec<SubscriptionEvent>> {
        self.pool
            .with_reader(|conn| subscription_ops::get_events(conn, user_id, limit))
    }

    fn increment_usage_if_below(
        &self,
        user_id: &str,
        resource: ResourceType,
        period_start: i64,
        limit: u32,
    ) -> TallyResult<IncrementOutcome> {
        self.pool.with_writer(|conn| {
            usage_ops::increment_if_below(conn, user_id, resource, period_start, limit)
        })
    }

    fn usage_count(
        &self,
        user_id: &str,
        resource: ResourceType,
        period_start: i64,
    ) -> TallyResult<u32> {
        self.pool
            .with_reader(|conn| usage_ops::usage_count(conn, user_id, resource, period_start))
    }

    fn insert_template(&self, template: &HashtagTemplate) -> TallyResult<()> {
        self.pool
            .with_writer(|conn| template_ops::insert(conn, template))
    }

    fn get_template(&self, user_id: &str, id: &str) -> TallyResult<Option<HashtagTemplate>> {
        self.pool
            .with_reader(|conn| template_ops::get(conn, user_id, id))
    }

    fn list_templates(&self, user_id: &str, filter: &TemplateFilter) -> TallyResult<TemplatePage> {
        self.pool
            .with_reader(|conn| template_ops::list(conn, user_id, filter))
    }

    fn update_template(
        &self,
        user_id: &str,
        id: &str,
        update: &TemplateUpdate,
        updated_at: i64,
    ) -> TallyResult<Option<HashtagTemplate>> {
        self.pool
            .with_writer(|conn| template_ops::update(conn, user_id, id, update, updated_at))
    }

    fn delete_template(&self, user_id: &str, id: &str) -> TallyResult<bool> {
        self.pool
            .with_writer(|conn| template_ops::delete(conn, user_id, id))
    }

    fn template_categories(&self, user_id: &str) -> TallyResult<Vec<String>> {
        self.pool
            .with_reader(|conn| template_ops::categories(conn, user_id))
    }

    fn migrate(&self) -> TallyResult<u32> {
        self.pool.with_writer(migrations::migrate)
    }

    fn apply_usage_retention(&self, cutoff_epoch: i64) -> TallyResult<usize> {
        self.pool
            .with_writer(|conn| usage_ops::apply_retention(conn, cutoff_epoch))
    }

    fn health_check(&self) -> TallyResult<StorageHealth> {
        let connected = self
            .pool
            .with_writer(|conn| {
                conn.execute_batch("SELECT 1")
                    .map_err(|e| to_storage_err(e.to_string()))
            })
            .is_ok();
        Ok(StorageHealth {
            connected,
            wal_mode: self.pool.is_wal_mode(),
        })
    }
}
