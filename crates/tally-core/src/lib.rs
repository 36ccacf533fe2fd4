//! # tally-core
//!
//! Core domain types for the tally quota system. No I/O lives here.
//!
//! ## Modules
//! - `config` — TallyConfig, sub-configs, ConfigHandle with explicit reload
//! - `errors` — TallyError, StorageError, TallyResult
//! - `models` — plans, entitlements, subscriptions, usage counters, templates,
//!   gate decision vocabulary
//! - `traits` — `ITallyStorage`, the persistence abstraction implemented by
//!   tally-storage

pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::TallyConfig;
pub use errors::{StorageError, TallyError, TallyResult};
pub use models::gate::{DenialReason, GateDecision, GateOutcome};
pub use models::plan::{Entitlements, PlanTier};
pub use models::usage::{IncrementOutcome, Period, ResourceType, UsageStats};
