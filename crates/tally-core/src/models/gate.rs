//! Gate decision vocabulary.
//!
//! Denials are values, not errors: a caller must be able to tell a quota
//! denial (show "upgrade your plan") from an infrastructure failure (show
//! "try again"). Infrastructure failures travel as `TallyError` and always
//! fail closed.

use serde::{Deserialize, Serialize};

/// Why a gated action was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "limit", rename_all = "snake_case")]
pub enum DenialReason {
    /// No active plan — recoverable by resubscribing.
    SubscriptionInactive,
    /// Quota exhausted for the period; carries the limit so the UI can
    /// prompt an upgrade.
    LimitReached(u32),
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubscriptionInactive => write!(f, "active subscription required"),
            Self::LimitReached(limit) => write!(f, "usage limit reached ({})", limit),
        }
    }
}

/// Outcome of `check_and_reserve`: either the unit was consumed or nothing
/// was mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed { new_count: u32 },
    Denied(DenialReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Denied(reason) => Some(*reason),
            Self::Allowed { .. } => None,
        }
    }
}

/// Outcome of a gated domain operation.
#[derive(Debug, Clone, PartialEq)]
pub enum GateOutcome<T> {
    Completed { value: T, new_count: u32 },
    Denied(DenialReason),
}

impl<T> GateOutcome<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            Self::Completed { value, .. } => Some(value),
            Self::Denied(_) => None,
        }
    }

    pub fn denial(&self) -> Option<DenialReason> {
        match self {
            Self::Denied(reason) => Some(*reason),
            Self::Completed { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_denial_display_carries_limit() {
        assert_eq!(
            DenialReason::LimitReached(20).to_string(),
            "usage limit reached (20)"
        );
        assert_eq!(
            DenialReason::SubscriptionInactive.to_string(),
            "active subscription required"
        );
    }

    #[test]
    fn test_decision_accessors() {
        let allowed = GateDecision::Allowed { new_count: 3 };
        assert!(allowed.is_allowed());
        assert_eq!(allowed.denial(), None);

        let denied = GateDecision::Denied(DenialReason::LimitReached(5));
        assert!(!denied.is_allowed());
        assert_eq!(denied.denial(), Some(DenialReason::LimitReached(5)));
    }
}
