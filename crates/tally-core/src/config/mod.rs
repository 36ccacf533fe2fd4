pub mod auth_config;
pub mod quota_config;
pub mod storage_config;

use std::path::Path;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use crate::errors::{TallyError, TallyResult};

pub use auth_config::{AuthCapabilities, AuthConfig, ProviderCapability, ProviderCredentials};
pub use quota_config::QuotaConfig;
pub use storage_config::StorageConfig;

/// Top-level configuration aggregating all subsystem configs.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TallyConfig {
    pub storage: StorageConfig,
    pub quota: QuotaConfig,
    pub auth: AuthConfig,
}

impl TallyConfig {
    /// Load config from a TOML string, falling back to defaults for missing
    /// fields.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }
}

/// Shared handle to the current configuration snapshot.
///
/// Components hold a `ConfigHandle` (or a snapshot taken from it) instead of
/// reading ambient global state. `reload` atomically replaces the snapshot;
/// readers observe either the old or the new config, never a partial one.
pub struct ConfigHandle {
    current: RwLock<Arc<TallyConfig>>,
}

impl ConfigHandle {
    pub fn new(config: TallyConfig) -> Self {
        Self {
            current: RwLock::new(Arc::new(config)),
        }
    }

    /// The current snapshot. Cheap; clones an Arc.
    pub fn snapshot(&self) -> Arc<TallyConfig> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            // Poisoned lock: the last written snapshot is still intact.
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Replace the snapshot with an already-built config.
    pub fn replace(&self, config: TallyConfig) {
        let next = Arc::new(config);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Re-read and re-parse the config file, then swap the snapshot in.
    /// On any failure the previous snapshot stays in effect.
    pub fn reload(&self, path: &Path) -> TallyResult<()> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| TallyError::Config(format!("read {}: {}", path.display(), e)))?;
        let parsed = TallyConfig::from_toml(&raw)
            .map_err(|e| TallyError::Config(format!("parse {}: {}", path.display(), e)))?;
        self.replace(parsed);
        tracing::info!(path = %path.display(), "Configuration reloaded");
        Ok(())
    }
}

impl Default for ConfigHandle {
    fn default() -> Self {
        Self::new(TallyConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_defaults() {
        let config = TallyConfig::from_toml("").unwrap();
        assert_eq!(config.storage.read_pool_size, 2);
        assert!(config.quota.limits.is_empty());
    }

    #[test]
    fn test_replace_swaps_snapshot() {
        let handle = ConfigHandle::default();
        assert!(handle.snapshot().storage.db_path.is_none());

        let mut next = TallyConfig::default();
        next.storage.db_path = Some("tally.db".to_string());
        handle.replace(next);

        assert_eq!(
            handle.snapshot().storage.db_path.as_deref(),
            Some("tally.db")
        );
    }

    #[test]
    fn test_reload_failure_keeps_old_snapshot() {
        let handle = ConfigHandle::default();
        let mut seeded = TallyConfig::default();
        seeded.storage.read_pool_size = 7;
        handle.replace(seeded);

        let err = handle.reload(Path::new("/nonexistent/tally.toml"));
        assert!(err.is_err());
        assert_eq!(handle.snapshot().storage.read_pool_size, 7);
    }
}
