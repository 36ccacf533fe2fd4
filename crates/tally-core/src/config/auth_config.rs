//! Social auth provider configuration and the validated capability set.
//!
//! Providers are resolved once from validated configuration into a static
//! capability set. A provider enabled without a complete credential pair is
//! dropped with a warning — never constructed with empty secrets.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// OAuth client credentials for one provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl ProviderCredentials {
    fn is_complete(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Auth settings from the `[auth]` config section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Providers the operator wants enabled, e.g. `["google", "github"]`.
    pub enabled_providers: Vec<String>,
    /// provider name → credentials.
    pub provider_credentials: HashMap<String, ProviderCredentials>,
}

impl AuthConfig {
    /// Resolve the validated capability set. Enabled providers missing a
    /// client id or secret are dropped, not partially constructed.
    pub fn capabilities(&self) -> AuthCapabilities {
        let mut providers = Vec::new();
        for name in &self.enabled_providers {
            match self.provider_credentials.get(name) {
                Some(credentials) if credentials.is_complete() => {
                    providers.push(ProviderCapability {
                        name: name.clone(),
                        client_id: credentials.client_id.clone(),
                        client_secret: credentials.client_secret.clone(),
                    });
                }
                _ => {
                    tracing::warn!(
                        provider = %name,
                        "Provider enabled but missing credentials — removed from capability set"
                    );
                }
            }
        }
        AuthCapabilities { providers }
    }
}

/// A provider that passed validation: guaranteed non-empty credentials.
#[derive(Debug, Clone)]
pub struct ProviderCapability {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
}

/// The static, validated provider set for one config snapshot.
#[derive(Debug, Clone, Default)]
pub struct AuthCapabilities {
    providers: Vec<ProviderCapability>,
}

impl AuthCapabilities {
    pub fn providers(&self) -> &[ProviderCapability] {
        &self.providers
    }

    pub fn supports(&self, name: &str) -> bool {
        self.providers.iter().any(|p| p.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(providers: &[(&str, &str, &str)], enabled: &[&str]) -> AuthConfig {
        AuthConfig {
            enabled_providers: enabled.iter().map(|s| s.to_string()).collect(),
            provider_credentials: providers
                .iter()
                .map(|(name, id, secret)| {
                    (
                        name.to_string(),
                        ProviderCredentials {
                            client_id: id.to_string(),
                            client_secret: secret.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_complete_provider_survives() {
        let config = config_with(&[("google", "id-1", "secret-1")], &["google"]);
        let caps = config.capabilities();
        assert!(caps.supports("google"));
        assert_eq!(caps.providers().len(), 1);
    }

    #[test]
    fn test_missing_secret_drops_provider() {
        let config = config_with(&[("google", "id-1", "")], &["google"]);
        let caps = config.capabilities();
        assert!(!caps.supports("google"));
        assert!(caps.providers().is_empty());
    }

    #[test]
    fn test_enabled_without_credentials_drops_provider() {
        let config = config_with(&[], &["github"]);
        assert!(config.capabilities().providers().is_empty());
    }

    #[test]
    fn test_credentials_without_enablement_stay_out() {
        let config = config_with(&[("google", "id-1", "secret-1")], &[]);
        assert!(config.capabilities().providers().is_empty());
    }
}
