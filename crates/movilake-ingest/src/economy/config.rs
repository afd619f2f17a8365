// Economy Aggregation Configuration

use serde::{Deserialize, Serialize};

/// Configuration for the economy aggregation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomyConfig {
    /// Pre-loaded indicator table name (read-only input)
    pub bronze_table: String,

    /// Aggregated income table name
    pub silver_table: String,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        EconomyConfig {
            bronze_table: "bronze_economy".to_string(),
            silver_table: "silver_economy_aggregated".to_string(),
        }
    }
}

impl EconomyConfig {
    /// Load configuration from environment variables
    ///
    /// Unset variables fall back to the defaults.
    pub fn from_env() -> Self {
        let default = EconomyConfig::default();

        EconomyConfig {
            bronze_table: std::env::var("ECONOMY_BRONZE_TABLE").unwrap_or(default.bronze_table),
            silver_table: std::env::var("ECONOMY_SILVER_TABLE").unwrap_or(default.silver_table),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.bronze_table.is_empty() {
            return Err("Bronze table name cannot be empty".to_string());
        }

        if self.silver_table.is_empty() {
            return Err("Silver table name cannot be empty".to_string());
        }

        Ok(())
    }
}
