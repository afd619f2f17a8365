// Mobility Ingestion Module
//
// Handles the daily district-to-district trip files published by the national
// open mobility archive. Daily partitions appear (and occasionally go missing)
// under a predictable URL pattern, so ingestion is a three-stage pipeline:
//
// - Probe: HEAD-check every date in the configured range against the archive
// - Bronze: bulk-load the files that exist, plus a date-completeness calendar
// - Silver: per-date idempotent rebuild of the cleaned trip aggregates
//
// The silver layer is partitioned by process date; a partition reload deletes
// and repopulates exactly the rows whose timestamp falls on that date.

pub mod bronze;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod prober;
pub mod silver;
pub mod storage;

// Re-export main types
pub use bronze::{BronzeLoader, BronzeStats};
pub use config::MobilityConfig;
pub use models::{
    date_range, DateAvailability, DateProbe, ProbeOutcome, RawTripRecord, SilverTripAggregate,
};
pub use pipeline::{DiscoveryStats, MobilityPipeline, PartitionStats};
pub use prober::AvailabilityProber;
pub use silver::{transform_partition, TransformStats};
pub use storage::MobilityStorage;

/// Rows per batched INSERT statement
pub const DEFAULT_TRIP_CHUNK_SIZE: usize = 1000;

/// Result type for mobility operations
pub type Result<T> = std::result::Result<T, MobilityError>;

/// Error types for mobility ingestion
#[derive(Debug, thiserror::Error)]
pub enum MobilityError {
    #[error("Download error: {0}")]
    Download(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("No readable sources: {0}")]
    NoSources(String),
}
