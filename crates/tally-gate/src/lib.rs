//! # tally-gate
//!
//! The quota policy crate: every place the application allows or denies a
//! user action based on subscription plan and consumption counters goes
//! through here.
//!
//! ## Modules
//! - `resolver` — user → (tier, status); synthesizes the free plan for users
//!   with no subscription
//! - `gate` — `check_and_reserve`: the atomic admit-or-deny decision, plus
//!   the read-only usage snapshot for display
//! - `executor` — wraps a domain operation behind the gate
//!   (reserve-then-create ordering)
//! - `lifecycle` — applies billing-provider events to the subscription store
//! - `templates` — the gated template CRUD surface
//!
//! Denials travel as [`tally_core::GateDecision`] values; infrastructure
//! errors travel as [`tally_core::TallyError`] and always fail closed.

pub mod executor;
pub mod gate;
pub mod lifecycle;
pub mod resolver;
pub mod templates;

pub use executor::GatedExecutor;
pub use gate::QuotaGate;
pub use lifecycle::BillingProcessor;
pub use resolver::{PlanResolver, ResolvedPlan};
pub use templates::TemplateService;

use std::sync::Arc;

use chrono::{Months, Utc};
use tracing::{info, warn};

use tally_core::config::{AuthCapabilities, TallyConfig};
use tally_core::errors::TallyResult;
use tally_core::models::plan::Entitlements;
use tally_core::models::usage::Period;
use tally_core::traits::{ITallyStorage, StorageHealth};

/// Composition root: wires resolver, gate, executor, billing processor, and
/// template service over one shared storage handle and one config snapshot.
///
/// The config snapshot is fixed for the lifetime of the runtime. Reload is
/// explicit: take a fresh snapshot from a `ConfigHandle` and build a new
/// runtime — components are thin wrappers over the shared storage Arc, so
/// rebuilding is cheap and there is no ambient mutable configuration.
pub struct TallyRuntime {
    storage: Arc<dyn ITallyStorage>,
    gate: Arc<QuotaGate>,
    billing: BillingProcessor,
    templates: TemplateService,
    auth: AuthCapabilities,
    usage_retention_months: u32,
}

impl TallyRuntime {
    pub fn new(storage: Arc<dyn ITallyStorage>, config: &TallyConfig) -> Self {
        let entitlements = Entitlements::from_config(&config.quota);
        let gate = Arc::new(QuotaGate::new(Arc::clone(&storage), entitlements));
        let billing = BillingProcessor::new(Arc::clone(&storage));
        let templates = TemplateService::new(Arc::clone(&storage), Arc::clone(&gate));
        let auth = config.auth.capabilities();
        Self {
            storage,
            gate,
            billing,
            templates,
            auth,
            usage_retention_months: config.storage.usage_retention_months,
        }
    }

    /// Bring the schema up to date and prune counters from long-closed
    /// periods. The subscription audit log is never pruned.
    pub fn initialize(&self) -> TallyResult<()> {
        let version = self.storage.migrate()?;
        info!(schema_version = version, "Storage ready");

        let now = Utc::now();
        let cutoff = now
            .checked_sub_months(Months::new(self.usage_retention_months))
            .unwrap_or(now);
        match self
            .storage
            .apply_usage_retention(Period::containing(cutoff).start_epoch())
        {
            Ok(removed) if removed > 0 => {
                info!(removed, "Pruned usage counters from closed periods")
            }
            Ok(_) => {}
            // Retention is cleanup, not correctness; startup continues.
            Err(e) => warn!(error = %e, "Usage retention failed during initialization"),
        }
        Ok(())
    }

    pub fn gate(&self) -> &QuotaGate {
        &self.gate
    }

    pub fn billing(&self) -> &BillingProcessor {
        &self.billing
    }

    pub fn templates(&self) -> &TemplateService {
        &self.templates
    }

    /// The validated auth provider set for this config snapshot.
    pub fn auth_capabilities(&self) -> &AuthCapabilities {
        &self.auth
    }

    pub fn health_check(&self) -> TallyResult<StorageHealth> {
        self.storage.health_check()
    }
}
