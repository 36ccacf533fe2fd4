use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Quota settings from the `[quota]` config section.
///
/// `limits` overrides the baseline entitlement table per tier and resource:
///
/// ```toml
/// [quota.limits.pro]
/// template_creation = 200
/// ```
///
/// Unknown tier or resource tags are ignored with a warning when the
/// entitlement table is built — see `Entitlements::from_config`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuotaConfig {
    /// tier tag → resource tag → limit.
    pub limits: HashMap<String, HashMap<String, u32>>,
}
