//! `ITallyStorage` trait — abstraction over the persistence layer.
//!
//! The quota gate, the subscription lifecycle, and the template service all
//! talk to storage through this trait rather than holding connections.
//! Operations that must be atomic (the conditional usage increment, the
//! demote-then-insert subscription activation) are trait methods of their
//! own so no caller can decompose them into racy read-then-write pairs.

use std::sync::Arc;

use crate::errors::TallyResult;
use crate::models::subscription::{Subscription, SubscriptionEvent, SubscriptionStatus};
use crate::models::template::{HashtagTemplate, TemplateFilter, TemplatePage, TemplateUpdate};
use crate::models::usage::{IncrementOutcome, ResourceType};

/// Health status of the storage backend.
#[derive(Debug, Clone)]
pub struct StorageHealth {
    pub connected: bool,
    pub wal_mode: bool,
}

/// Abstraction over tally.db storage operations.
pub trait ITallyStorage: Send + Sync {
    // ── Subscriptions ──

    /// Make `sub` the user's single active subscription: demote any existing
    /// active row to canceled and insert the new row, in one transaction.
    /// Both transitions are appended to the audit log with `event_type`.
    fn activate_subscription(&self, sub: &Subscription, event_type: &str) -> TallyResult<()>;

    /// Transition the user's current (active or past_due) subscription to
    /// `new_status`, appending an audit row. Errors with
    /// `SubscriptionNotFound` when the user has no such row.
    fn transition_subscription(
        &self,
        user_id: &str,
        new_status: SubscriptionStatus,
        event_type: &str,
    ) -> TallyResult<Subscription>;

    /// Advance the period bounds on the user's current subscription and set
    /// it active (renewal also recovers past_due rows).
    fn renew_subscription(
        &self,
        user_id: &str,
        period_start_at: i64,
        period_end_at: i64,
    ) -> TallyResult<Subscription>;

    /// The user's active subscription, if any.
    fn get_active_subscription(&self, user_id: &str) -> TallyResult<Option<Subscription>>;

    /// The user's most recent subscription regardless of status.
    fn get_latest_subscription(&self, user_id: &str) -> TallyResult<Option<Subscription>>;

    /// Audit log for a user, newest first.
    fn get_subscription_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> TallyResult<Vec<SubscriptionEvent>>;

    // ── Usage counters ──

    /// The atomic primitive the quota gate relies on: increment the counter
    /// for (user, resource, period) only if the current count is below
    /// `limit`, as one indivisible storage operation. Returns the resulting
    /// count and whether the unit was consumed. Must never be emulated with
    /// separate read and write calls.
    fn increment_usage_if_below(
        &self,
        user_id: &str,
        resource: ResourceType,
        period_start: i64,
        limit: u32,
    ) -> TallyResult<IncrementOutcome>;

    /// Current count for (user, resource, period); missing row reads as 0.
    /// Never mutates state.
    fn usage_count(
        &self,
        user_id: &str,
        resource: ResourceType,
        period_start: i64,
    ) -> TallyResult<u32>;

    // ── Templates ──

    fn insert_template(&self, template: &HashtagTemplate) -> TallyResult<()>;

    /// Owner-scoped lookup.
    fn get_template(&self, user_id: &str, id: &str) -> TallyResult<Option<HashtagTemplate>>;

    /// Filtered, paginated listing, newest first.
    fn list_templates(&self, user_id: &str, filter: &TemplateFilter) -> TallyResult<TemplatePage>;

    /// Partial update; returns the updated row, or None when the template
    /// does not exist or belongs to another user.
    fn update_template(
        &self,
        user_id: &str,
        id: &str,
        update: &TemplateUpdate,
        updated_at: i64,
    ) -> TallyResult<Option<HashtagTemplate>>;

    /// Returns whether a row was deleted.
    fn delete_template(&self, user_id: &str, id: &str) -> TallyResult<bool>;

    /// Distinct non-null categories across the user's templates.
    fn template_categories(&self, user_id: &str) -> TallyResult<Vec<String>>;

    // ── Lifecycle ──

    /// Create tables and bring the schema up to date.
    fn migrate(&self) -> TallyResult<u32>;

    /// Delete usage-counter rows whose period start is older than the cutoff.
    /// The subscription audit log is never touched.
    fn apply_usage_retention(&self, cutoff_epoch: i64) -> TallyResult<usize>;

    fn health_check(&self) -> TallyResult<StorageHealth>;
}

// ── Arc<T> blanket impl ──

impl<T: ITallyStorage + ?Sized> ITallyStorage for Arc<T> {
    fn activate_subscription(&self, sub: &Subscription, event_type: &str) -> TallyResult<()> {
        (**self).activate_subscription(sub, event_type)
    }
    fn transition_subscription(
        &self,
        user_id: &str,
        new_status: SubscriptionStatus,
        event_type: &str,
    ) -> TallyResult<Subscription> {
        (**self).transition_subscription(user_id, new_status, event_type)
    }
    fn renew_subscription(
        &self,
        user_id: &str,
        period_start_at: i64,
        period_end_at: i64,
    ) -> TallyResult<Subscription> {
        (**self).renew_subscription(user_id, period_start_at, period_end_at)
    }
    fn get_active_subscription(&self, user_id: &str) -> TallyResult<Option<Subscription>> {
        (**self).get_active_subscription(user_id)
    }
    fn get_latest_subscription(&self, user_id: &str) -> TallyResult<Option<Subscription>> {
        (**self).get_latest_subscription(user_id)
    }
    fn get_subscription_events(
        &self,
        user_id: &str,
        limit: usize,
    ) -> TallyResult<Vec<SubscriptionEvent>> {
        (**self).get_subscription_events(user_id, limit)
    }
    fn increment_usage_if_below(
        &self,
        user_id: &str,
        resource: ResourceType,
        period_start: i64,
        limit: u32,
    ) -> TallyResult<IncrementOutcome> {
        (**self).increment_usage_if_below(user_id, resource, period_start, limit)
    }
    fn usage_count(
        &self,
        user_id: &str,
        resource: ResourceType,
        period_start: i64,
    ) -> TallyResult<u32> {
        (**self).usage_count(user_id, resource, period_start)
    }
    fn insert_template(&self, template: &HashtagTemplate) -> TallyResult<()> {
        (**self).insert_template(template)
    }
    fn get_template(&self, user_id: &str, id: &str) -> TallyResult<Option<HashtagTemplate>> {
        (**self).get_template(user_id, id)
    }
    fn list_templates(&self, user_id: &str, filter: &TemplateFilter) -> TallyResult<TemplatePage> {
        (**self).list_templates(user_id, filter)
    }
    fn update_template(
        &self,
        user_id: &str,
        id: &str,
        update: &TemplateUpdate,
        updated_at: i64,
    ) -> TallyResult<Option<HashtagTemplate>> {
        (**self).update_template(user_id, id, update, updated_at)
    }
    fn delete_template(&self, user_id: &str, id: &str) -> TallyResult<bool> {
        (**self).delete_template(user_id, id)
    }
    fn template_categories(&self, user_id: &str) -> TallyResult<Vec<String>> {
        (**self).template_categories(user_id)
    }
    fn migrate(&self) -> TallyResult<u32> {
        (**self).migrate()
    }
    fn apply_usage_retention(&self, cutoff_epoch: i64) -> TallyResult<usize> {
        (**self).apply_usage_retention(cutoff_epoch)
    }
    fn health_check(&self) -> TallyResult<StorageHealth> {
        (**self).health_check()
    }
}
