pub mod gate;
pub mod plan;
pub mod subscription;
pub mod template;
pub mod usage;

pub use gate::{DenialReason, GateDecision, GateOutcome};
pub use plan::{Entitlements, PlanTier};
pub use subscription::{BillingEvent, Subscription, SubscriptionEvent, SubscriptionStatus};
pub use template::{
    HashtagTemplate, NewTemplate, Platform, TemplateFilter, TemplatePage, TemplateUpdate,
};
pub use usage::{IncrementOutcome, Period, ResourceType, UsageStats};
