//! Gated execution: reserve a quota unit, then run the domain operation.
//!
//! Ordering is reserve-then-create. The unit is consumed before the domain
//! mutation runs, so a crash or failure between the two steps over-counts
//! usage but can never let a user overrun their limit. The reservation is
//! deliberately NOT rolled back when the operation fails; each accepted
//! reservation consumes one unit, and retrying a failed operation consumes
//! another.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use tally_core::errors::TallyResult;
use tally_core::models::gate::{GateDecision, GateOutcome};
use tally_core::models::usage::ResourceType;

use crate::gate::QuotaGate;

pub struct GatedExecutor {
    gate: Arc<QuotaGate>,
}

impl GatedExecutor {
    pub fn new(gate: Arc<QuotaGate>) -> Self {
        Self { gate }
    }

    /// Run `op` behind the gate. On Denied, `op` is never invoked and the
    /// reason is returned unchanged; on Allowed, the unit is consumed and
    /// `op` runs.
    pub fn execute<T, F>(
        &self,
        user_id: &str,
        resource: ResourceType,
        op: F,
    ) -> TallyResult<GateOutcome<T>>
    where
        F: FnOnce() -> TallyResult<T>,
    {
        self.execute_at(user_id, resource, Utc::now(), op)
    }

    /// As `execute`, against the period containing `now`.
    pub fn execute_at<T, F>(
        &self,
        user_id: &str,
        resource: ResourceType,
        now: DateTime<Utc>,
        op: F,
    ) -> TallyResult<GateOutcome<T>>
    where
        F: FnOnce() -> TallyResult<T>,
    {
        match self.gate.check_and_reserve_at(user_id, resource, now)? {
            GateDecision::Denied(reason) => Ok(GateOutcome::Denied(reason)),
            GateDecision::Allowed { new_count } => {
                let value = op()?;
                Ok(GateOutcome::Completed { value, new_count })
            }
        }
    }
}
