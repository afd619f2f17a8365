// Economy Pipeline Orchestration
//
// One unit of work: full truncate-and-reload of the aggregated income table.
// Re-invoking over unchanged bronze data yields an identical table.

use sqlx::PgPool;
use tracing::{info, warn};

use super::aggregator::{aggregate_income, diagnostics, RejectionStats};
use super::config::EconomyConfig;
use super::models::EconomyDiagnostics;
use super::storage::EconomyStorage;
use super::{EconomyError, Result};

/// Economy aggregation pipeline
pub struct EconomyPipeline {
    config: EconomyConfig,
    db: PgPool,
}

/// Result of one economy reload
#[derive(Debug, Clone)]
pub struct EconomyStats {
    pub diagnostics: EconomyDiagnostics,
    pub rejections: RejectionStats,
    pub rows_loaded: usize,
}

impl EconomyPipeline {
    pub fn new(config: EconomyConfig, db: PgPool) -> Result<Self> {
        config.validate().map_err(EconomyError::Validation)?;

        Ok(Self { config, db })
    }

    /// Rebuild the aggregated income table from the bronze indicator dataset
    pub async fn run(&self) -> Result<EconomyStats> {
        info!("Starting economy aggregation (all years)");

        let storage = EconomyStorage::new(self.db.clone(), self.config.clone());
        storage.ensure_schema().await?;

        // 1. Fetch the pre-loaded bronze rows
        info!("Step 1/3: Reading bronze indicator rows...");
        let rows = storage.fetch_bronze().await?;

        // 2. Diagnostic counts at increasing strictness; informational only
        let counts = diagnostics(&rows);
        info!(
            total = counts.total_rows,
            non_blank = counts.non_blank_rows,
            parseable = counts.parseable_rows,
            "Bronze income coverage"
        );

        // 3. Aggregate and replace
        info!("Step 2/3: Aggregating income by municipality, district, section and year...");
        let (aggregates, rejections) = aggregate_income(&rows);

        if rejections != RejectionStats::default() {
            warn!(
                blank = rejections.blank_income,
                unparseable_income = rejections.unparseable_income,
                unparseable_year = rejections.unparseable_year,
                "Dropped bronze rows during aggregation"
            );
        }

        info!("Step 3/3: Replacing aggregated income table...");
        let rows_loaded = storage.replace_all(&aggregates).await?;

        info!(rows = rows_loaded, "Economy aggregation completed");

        Ok(EconomyStats {
            diagnostics: counts,
            rejections,
            rows_loaded,
        })
    }

    /// Get pipeline configuration
    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }
}
