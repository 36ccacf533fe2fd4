use serde::{Deserialize, Serialize};

/// Storage settings from the `[storage]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to tally.db. None means in-memory (tests, previews).
    pub db_path: Option<String>,
    /// Number of read-only connections in the pool.
    pub read_pool_size: usize,
    /// Months of closed usage periods to keep before retention deletes them.
    pub usage_retention_months: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            read_pool_size: 2,
            usage_retention_months: 12,
        }
    }
}
