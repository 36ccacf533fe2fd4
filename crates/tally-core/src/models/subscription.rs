//! Subscriptions, status transitions, and the billing events that drive them.
//!
//! Subscription rows are never physically deleted. Every transition appends
//! a `SubscriptionEvent` audit row; the audit log is append-only.

use serde::{Deserialize, Serialize};

use crate::models::plan::PlanTier;

/// Billing status of a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Canceled,
    PastDue,
}

impl SubscriptionStatus {
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::PastDue => "past_due",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "active" => Some(Self::Active),
            "canceled" => Some(Self::Canceled),
            "past_due" => Some(Self::PastDue),
            _ => None,
        }
    }
}

/// A user's billing plan. At most one row per user holds status `active`
/// at any time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub user_id: String,
    /// Raw tier tag as stored. Kept as a string because imported or legacy
    /// rows may carry tags this build does not know; entitlement lookup
    /// degrades those to the most restrictive limit.
    pub tier: String,
    pub status: SubscriptionStatus,
    pub period_start_at: i64,
    pub period_end_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One audit row: a status transition applied to a subscription.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub subscription_id: String,
    pub user_id: String,
    /// Billing event tag that caused the transition.
    pub event_type: String,
    pub old_status: Option<String>,
    pub new_status: String,
    pub created_at: i64,
}

/// Events arriving from the payment provider's webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum BillingEvent {
    /// Successful checkout: the user gains (or replaces) an active plan.
    CheckoutCompleted {
        user_id: String,
        tier: PlanTier,
        period_start_at: i64,
        period_end_at: i64,
    },
    /// Period renewal. Also recovers a past_due subscription back to active.
    Renewed {
        user_id: String,
        period_start_at: i64,
        period_end_at: i64,
    },
    Canceled { user_id: String },
    PaymentFailed { user_id: String },
}

impl BillingEvent {
    pub fn user_id(&self) -> &str {
        match self {
            Self::CheckoutCompleted { user_id, .. }
            | Self::Renewed { user_id, .. }
            | Self::Canceled { user_id }
            | Self::PaymentFailed { user_id } => user_id,
        }
    }

    /// Tag recorded in the audit log.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::CheckoutCompleted { .. } => "checkout_completed",
            Self::Renewed { .. } => "renewed",
            Self::Canceled { .. } => "canceled",
            Self::PaymentFailed { .. } => "payment_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_tag_round_trip() {
        for status in [
            SubscriptionStatus::Active,
            SubscriptionStatus::Canceled,
            SubscriptionStatus::PastDue,
        ] {
            assert_eq!(SubscriptionStatus::parse(status.as_tag()), Some(status));
        }
        assert_eq!(SubscriptionStatus::parse("paused"), None);
    }

    #[test]
    fn test_billing_event_serde_tagging() {
        let event = BillingEvent::PaymentFailed {
            user_id: "u1".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"payment_failed\""));
        let back: BillingEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
