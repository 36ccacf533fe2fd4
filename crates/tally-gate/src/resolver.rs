//! Plan resolution: user → (tier, status).
//!
//! Users are never left without an entitlement. No subscription on record
//! resolves to the synthetic free plan; a payment failure surfaces as
//! PastDue so the gate can deny independent of counters.

use std::sync::Arc;

use tally_core::errors::TallyResult;
use tally_core::models::plan::PlanTier;
use tally_core::models::subscription::SubscriptionStatus;
use tally_core::traits::ITallyStorage;

/// The plan a user's actions are judged against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlan {
    /// Raw tier tag; entitlement lookup degrades unknown tags to the most
    /// restrictive limit.
    pub tier: String,
    pub status: SubscriptionStatus,
    /// False when the plan is the synthetic free fallback rather than a
    /// subscription row.
    pub from_subscription: bool,
}

impl ResolvedPlan {
    fn synthetic_free() -> Self {
        Self {
            tier: PlanTier::Free.as_tag().to_string(),
            status: SubscriptionStatus::Active,
            from_subscription: false,
        }
    }
}

pub struct PlanResolver {
    storage: Arc<dyn ITallyStorage>,
}

impl PlanResolver {
    pub fn new(storage: Arc<dyn ITallyStorage>) -> Self {
        Self { storage }
    }

    /// Resolve the user's current plan. Read-only.
    ///
    /// - active subscription → its tier, status Active
    /// - latest subscription is past_due → its tier, status PastDue
    /// - anything else (canceled, or no row at all) → synthetic free plan
    ///
    /// Store-unreachable conditions propagate as errors; they are never
    /// collapsed into a plan.
    pub fn resolve_plan(&self, user_id: &str) -> TallyResult<ResolvedPlan> {
        if let Some(active) = self.storage.get_active_subscription(user_id)? {
            return Ok(ResolvedPlan {
                tier: active.tier,
                status: SubscriptionStatus::Active,
                from_subscription: true,
            });
        }

        match self.storage.get_latest_subscription(user_id)? {
            Some(sub) if sub.status == SubscriptionStatus::PastDue => Ok(ResolvedPlan {
                tier: sub.tier,
                status: SubscriptionStatus::PastDue,
                from_subscription: true,
            }),
            _ => Ok(ResolvedPlan::synthetic_free()),
        }
    }
}
