//! Warehouse storage configuration.

use serde::{Deserialize, Serialize};

/// SQLite connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarehouseConfig {
    /// Database URL, e.g. "sqlite://warehouse.db"
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Connection pool size
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Busy timeout in seconds (writer contention)
    #[serde(default = "default_busy_timeout_secs")]
    pub busy_timeout_secs: u64,
}

fn default_database_url() -> String {
    "sqlite://warehouse.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

fn default_busy_timeout_secs() -> u64 {
    30
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            max_connections: default_max_connections(),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}
