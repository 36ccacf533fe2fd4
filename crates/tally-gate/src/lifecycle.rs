//! Subscription lifecycle: applies billing-provider events to the store.
//!
//! Rows are never deleted; every transition lands in the append-only audit
//! log. Checkout is the only event that creates a row — everything else
//! transitions the user's current subscription and errors when there is
//! nothing to transition.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use tally_core::errors::TallyResult;
use tally_core::models::subscription::{BillingEvent, Subscription, SubscriptionStatus};
use tally_core::traits::ITallyStorage;

pub struct BillingProcessor {
    storage: Arc<dyn ITallyStorage>,
}

impl BillingProcessor {
    pub fn new(storage: Arc<dyn ITallyStorage>) -> Self {
        Self { storage }
    }

    /// Apply one billing event, returning the subscription as it stands
    /// afterwards.
    pub fn apply_event(&self, event: &BillingEvent) -> TallyResult<Subscription> {
        let applied = match event {
            BillingEvent::CheckoutCompleted {
                user_id,
                tier,
                period_start_at,
                period_end_at,
            } => {
                let now = Utc::now().timestamp();
                let sub = Subscription {
                    id: Uuid::new_v4().to_string(),
                    user_id: user_id.clone(),
                    tier: tier.as_tag().to_string(),
                    status: SubscriptionStatus::Active,
                    period_start_at: *period_start_at,
                    period_end_at: *period_end_at,
                    created_at: now,
                    updated_at: now,
                };
                self.storage.activate_subscription(&sub, event.as_tag())?;
                sub
            }
            BillingEvent::Renewed {
                user_id,
                period_start_at,
                period_end_at,
            } => self
                .storage
                .renew_subscription(user_id, *period_start_at, *period_end_at)?,
            BillingEvent::Canceled { user_id } => self.storage.transition_subscription(
                user_id,
                SubscriptionStatus::Canceled,
                event.as_tag(),
            )?,
            BillingEvent::PaymentFailed { user_id } => self.storage.transition_subscription(
                user_id,
                SubscriptionStatus::PastDue,
                event.as_tag(),
            )?,
        };

        info!(
            user = event.user_id(),
            event = event.as_tag(),
            status = applied.status.as_tag(),
            tier = %applied.tier,
            "Billing event applied"
        );
        Ok(applied)
    }
}
