//! Plan tiers and the entitlement table.
//!
//! An entitlement is a pure function of (tier, resource type) to a numeric
//! limit. The function is total: every known tier has a defined limit, and an
//! unknown or missing tier maps to the most restrictive defined limit for
//! that resource — never to unlimited, never to an error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::QuotaConfig;
use crate::models::usage::ResourceType;

/// Subscription plan tier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Pro, PlanTier::Enterprise];

    /// Tag stored in the subscriptions table and used in configuration.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Pro => "pro",
            Self::Enterprise => "enterprise",
        }
    }

    /// Parse a stored tag. Returns None for tags this build does not know
    /// (legacy or imported rows) — callers fall back to the most restrictive
    /// entitlement, see [`Entitlements::limit_for_tag`].
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "free" => Some(Self::Free),
            "pro" => Some(Self::Pro),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }
}

/// Per-(tier, resource) usage limits.
pub struct Entitlements {
    limits: HashMap<(PlanTier, ResourceType), u32>,
}

impl Entitlements {
    /// Baseline limit table.
    pub fn baseline() -> Self {
        let mut limits = HashMap::new();

        limits.insert((PlanTier::Free, ResourceType::TemplateCreation), 20);
        limits.insert((PlanTier::Pro, ResourceType::TemplateCreation), 100);
        limits.insert((PlanTier::Enterprise, ResourceType::TemplateCreation), 1000);

        limits.insert((PlanTier::Free, ResourceType::CaptionGeneration), 25);
        limits.insert((PlanTier::Pro, ResourceType::CaptionGeneration), 250);
        limits.insert(
            (PlanTier::Enterprise, ResourceType::CaptionGeneration),
            2500,
        );

        limits.insert((PlanTier::Free, ResourceType::HashtagAnalysis), 50);
        limits.insert((PlanTier::Pro, ResourceType::HashtagAnalysis), 500);
        limits.insert((PlanTier::Enterprise, ResourceType::HashtagAnalysis), 5000);

        Self { limits }
    }

    /// Baseline with per-(tier, resource) overrides from configuration.
    /// Unknown tier or resource tags in the config are skipped with a warning
    /// rather than rejected — a bad override must not take the gate down.
    pub fn from_config(config: &QuotaConfig) -> Self {
        let mut entitlements = Self::baseline();
        for (tier_tag, overrides) in &config.limits {
            let Some(tier) = PlanTier::parse(tier_tag) else {
                tracing::warn!(tier = %tier_tag, "Unknown tier in quota config — override ignored");
                continue;
            };
            for (resource_tag, limit) in overrides {
                let Some(resource) = ResourceType::parse(resource_tag) else {
                    tracing::warn!(
                        resource = %resource_tag,
                        "Unknown resource type in quota config — override ignored"
                    );
                    continue;
                };
                entitlements.limits.insert((tier, resource), *limit);
            }
        }
        entitlements
    }

    /// The limit a tier grants for a resource type.
    pub fn limit_for(&self, tier: PlanTier, resource: ResourceType) -> u32 {
        self.limits
            .get(&(tier, resource))
            .copied()
            .unwrap_or_else(|| self.most_restrictive(resource))
    }

    /// Limit lookup by stored tier tag. Unknown tags get the most restrictive
    /// defined limit for the resource.
    pub fn limit_for_tag(&self, tier_tag: &str, resource: ResourceType) -> u32 {
        match PlanTier::parse(tier_tag) {
            Some(tier) => self.limit_for(tier, resource),
            None => self.most_restrictive(resource),
        }
    }

    /// Minimum defined limit across all tiers for a resource. Zero if no tier
    /// defines one — an undefined resource denies rather than allows.
    fn most_restrictive(&self, resource: ResourceType) -> u32 {
        PlanTier::ALL
            .iter()
            .filter_map(|tier| self.limits.get(&(*tier, resource)).copied())
            .min()
            .unwrap_or(0)
    }
}

impl Default for Entitlements {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline_free_template_limit() {
        let ent = Entitlements::baseline();
        assert_eq!(
            ent.limit_for(PlanTier::Free, ResourceType::TemplateCreation),
            20
        );
        assert_eq!(
            ent.limit_for(PlanTier::Pro, ResourceType::TemplateCreation),
            100
        );
    }

    #[test]
    fn test_unknown_tier_gets_most_restrictive() {
        let ent = Entitlements::baseline();
        assert_eq!(
            ent.limit_for_tag("trial_expired", ResourceType::TemplateCreation),
            20
        );
        assert_eq!(
            ent.limit_for_tag("", ResourceType::HashtagAnalysis),
            50
        );
    }

    #[test]
    fn test_config_override_applies() {
        let toml = r#"
            [limits.pro]
            template_creation = 42
        "#;
        let config: QuotaConfig = toml::from_str(toml).unwrap();
        let ent = Entitlements::from_config(&config);
        assert_eq!(
            ent.limit_for(PlanTier::Pro, ResourceType::TemplateCreation),
            42
        );
        // Untouched entries keep baseline values.
        assert_eq!(
            ent.limit_for(PlanTier::Free, ResourceType::TemplateCreation),
            20
        );
    }

    #[test]
    fn test_config_unknown_tags_ignored() {
        let toml = r#"
            [limits.platinum]
            template_creation = 9999

            [limits.free]
            teleportation = 3
        "#;
        let config: QuotaConfig = toml::from_str(toml).unwrap();
        let ent = Entitlements::from_config(&config);
        assert_eq!(
            ent.limit_for(PlanTier::Free, ResourceType::TemplateCreation),
            20
        );
    }

    #[test]
    fn test_override_can_lower_the_floor() {
        // When an override drops free below baseline, unknown tiers follow it
        // down — most restrictive means most restrictive after overrides.
        let toml = r#"
            [limits.free]
            template_creation = 5
        "#;
        let config: QuotaConfig = toml::from_str(toml).unwrap();
        let ent = Entitlements::from_config(&config);
        assert_eq!(
            ent.limit_for_tag("mystery", ResourceType::TemplateCreation),
            5
        );
    }

    #[test]
    fn test_tier_tag_round_trip() {
        for tier in PlanTier::ALL {
            assert_eq!(PlanTier::parse(tier.as_tag()), Some(tier));
        }
        assert_eq!(PlanTier::parse("platinum"), None);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            // The entitlement function is total: any tier tag resolves to a
            // finite limit for every resource type.
            #[test]
            fn limit_for_tag_is_total(tag in ".*") {
                let ent = Entitlements::baseline();
                for resource in ResourceType::ALL {
                    let limit = ent.limit_for_tag(&tag, resource);
                    prop_assert!(limit <= 5000);
                }
            }
        }
    }
}
