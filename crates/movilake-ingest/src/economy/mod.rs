// Economy Ingestion Module
//
// Rebuilds the aggregated income table from the pre-loaded socio-economic
// indicator dataset. Unlike the mobility silver layer there is no partition
// concept: the whole aggregate is truncated and reloaded on every run.
//
// The bronze input is published with composite "<code> <name...>" fields, a
// period column that may be stored as text or as an integer, and income values
// as locale-formatted text (thousands '.', decimal ','). Rows that do not
// normalize into the target schema are dropped, never nulled.

pub mod aggregator;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod storage;

// Re-export main types
pub use aggregator::{
    aggregate_income, diagnostics, extract_code, extract_year, normalize_income, RejectionStats,
};
pub use config::EconomyConfig;
pub use models::{EconomyDiagnostics, RawEconomyRecord, SilverEconomyAggregate};
pub use pipeline::{EconomyPipeline, EconomyStats};
pub use storage::EconomyStorage;

/// Rows per batched INSERT statement
pub const DEFAULT_ECONOMY_CHUNK_SIZE: usize = 1000;

/// Result type for economy operations
pub type Result<T> = std::result::Result<T, EconomyError>;

/// Error types for economy aggregation
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}
