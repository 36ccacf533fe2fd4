//! The quota gate: `check_and_reserve` admits or denies one unit of
//! consumption, atomically.
//!
//! The check and the increment are one storage operation — two concurrent
//! requests can never both pass the check before either increments. On any
//! infrastructure failure the gate fails closed: an action is never allowed
//! when the quota state could not be verified.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use tally_core::errors::TallyResult;
use tally_core::models::gate::{DenialReason, GateDecision};
use tally_core::models::plan::Entitlements;
use tally_core::models::subscription::SubscriptionStatus;
use tally_core::models::usage::{Period, ResourceType, UsageStats};
use tally_core::traits::ITallyStorage;

use crate::resolver::PlanResolver;

pub struct QuotaGate {
    storage: Arc<dyn ITallyStorage>,
    resolver: PlanResolver,
    entitlements: Entitlements,
}

impl QuotaGate {
    pub fn new(storage: Arc<dyn ITallyStorage>, entitlements: Entitlements) -> Self {
        let resolver = PlanResolver::new(Arc::clone(&storage));
        Self {
            storage,
            resolver,
            entitlements,
        }
    }

    /// Admit or deny one unit of `resource` for `user_id` in the current
    /// period. Allowed means the unit is already consumed; the caller is
    /// expected to perform the gated action.
    pub fn check_and_reserve(
        &self,
        user_id: &str,
        resource: ResourceType,
    ) -> TallyResult<GateDecision> {
        self.check_and_reserve_at(user_id, resource, Utc::now())
    }

    /// As `check_and_reserve`, against the period containing `now`.
    pub fn check_and_reserve_at(
        &self,
        user_id: &str,
        resource: ResourceType,
        now: DateTime<Utc>,
    ) -> TallyResult<GateDecision> {
        let plan = self.resolver.resolve_plan(user_id)?;

        // Status outranks counters: a past_due plan denies at count 0.
        if plan.status != SubscriptionStatus::Active {
            return Ok(GateDecision::Denied(DenialReason::SubscriptionInactive));
        }

        let limit = self.entitlements.limit_for_tag(&plan.tier, resource);
        if limit == 0 {
            return Ok(GateDecision::Denied(DenialReason::LimitReached(0)));
        }

        let period = Period::containing(now);
        let outcome = self.storage.increment_usage_if_below(
            user_id,
            resource,
            period.start_epoch(),
            limit,
        )?;

        if outcome.accepted {
            Ok(GateDecision::Allowed {
                new_count: outcome.new_count,
            })
        } else {
            Ok(GateDecision::Denied(DenialReason::LimitReached(limit)))
        }
    }

    /// Usage snapshot for display. Never mutates state.
    pub fn get_usage(&self, user_id: &str, resource: ResourceType) -> TallyResult<UsageStats> {
        self.get_usage_at(user_id, resource, Utc::now())
    }

    /// As `get_usage`, against the period containing `now`.
    pub fn get_usage_at(
        &self,
        user_id: &str,
        resource: ResourceType,
        now: DateTime<Utc>,
    ) -> TallyResult<UsageStats> {
        let plan = self.resolver.resolve_plan(user_id)?;
        let limit = self.entitlements.limit_for_tag(&plan.tier, resource);
        let period = Period::containing(now);
        let current = self
            .storage
            .usage_count(user_id, resource, period.start_epoch())?;

        let has_active_subscription =
            plan.from_subscription && plan.status == SubscriptionStatus::Active;
        Ok(UsageStats::new(current, limit, has_active_subscription))
    }
}
