// Mobility Pipeline Orchestration
//
// Two units of work, invoked separately from the CLI or a scheduler:
// - discovery: probe the archive, bulk-load the bronze layer, persist the
//   date-completeness calendar (full refresh of both tables)
// - partition reload: rebuild the silver aggregate for one process date
//
// Partition reloads are idempotent, so a backfill that died halfway is simply
// re-run; `run_pending` derives the remaining work from the calendar instead
// of walking the whole range again.

use chrono::NaiveDate;
use sqlx::PgPool;
use tracing::{info, warn};

use super::bronze::{BronzeLoader, BronzeStats};
use super::config::MobilityConfig;
use super::prober::AvailabilityProber;
use super::silver::{transform_partition, TransformStats};
use super::storage::MobilityStorage;
use super::{MobilityError, Result};

/// Mobility ingestion pipeline
pub struct MobilityPipeline {
    config: MobilityConfig,
    db: PgPool,
}

/// Result of one discovery run
#[derive(Debug, Clone)]
pub struct DiscoveryStats {
    pub dates_probed: usize,
    pub sources_found: usize,
    pub bronze: BronzeStats,
    pub calendar_rows: usize,
}

/// Result of one partition reload
#[derive(Debug, Clone)]
pub struct PartitionStats {
    pub process_date: NaiveDate,
    pub transform: TransformStats,
    pub rows_loaded: usize,
}

impl MobilityPipeline {
    pub fn new(config: MobilityConfig, db: PgPool) -> Result<Self> {
        config.validate().map_err(MobilityError::Validation)?;

        Ok(Self { config, db })
    }

    /// Probe the archive and fully refresh the bronze layer
    pub async fn run_discovery(&self) -> Result<DiscoveryStats> {
        info!(
            start = %self.config.start_date,
            end = %self.config.end_date,
            "Starting mobility discovery"
        );

        let storage = MobilityStorage::new(self.db.clone(), self.config.clone());
        storage.ensure_schema().await?;

        // 1. Probe the archive for existing daily files
        info!("Step 1/3: Probing daily-file archive...");
        let prober = AvailabilityProber::new(self.config.clone())?;
        let probes = prober.probe_all().await?;

        let sources = AvailabilityProber::valid_sources(&probes);
        let calendar = AvailabilityProber::availability_calendar(&probes);

        // 2. Bulk-read the confirmed sources into the raw table
        info!("Step 2/3: Bulk-loading {} confirmed sources...", sources.len());
        let bronze = if sources.is_empty() {
            warn!("No daily files found; raw table left untouched");
            BronzeStats::default()
        } else {
            let loader = BronzeLoader::new(self.config.clone())?;
            let (records, stats) = loader.fetch_all(&sources).await?;
            storage.replace_raw_trips(&records).await?;
            stats
        };

        // 3. Persist the completeness calendar for every date in range
        info!("Step 3/3: Persisting date-completeness calendar...");
        let calendar_rows = storage.replace_availability(&calendar).await?;

        let stats = DiscoveryStats {
            dates_probed: probes.len(),
            sources_found: sources.len(),
            bronze,
            calendar_rows,
        };

        info!(
            dates_probed = stats.dates_probed,
            sources_found = stats.sources_found,
            rows_loaded = stats.bronze.rows_loaded,
            "Mobility discovery completed"
        );

        Ok(stats)
    }

    /// Rebuild the silver aggregate for one process date
    ///
    /// Re-invoking with unchanged raw data produces an identical partition.
    pub async fn run_partition(&self, process_date: NaiveDate) -> Result<PartitionStats> {
        info!(date = %process_date, "Starting silver partition reload");

        let storage = MobilityStorage::new(self.db.clone(), self.config.clone());
        storage.ensure_schema().await?;

        let raw_rows = storage.fetch_raw_for_date(process_date).await?;
        let (aggregates, transform) =
            transform_partition(&raw_rows, process_date, self.config.analysis_id);

        if transform.rows_rejected > 0 {
            warn!(
                date = %process_date,
                rejected = transform.rows_rejected,
                "Dropped raw rows that could not be parsed"
            );
        }

        let rows_loaded = storage.reload_partition(process_date, &aggregates).await?;

        // Verification: read the count back from the catalog
        let stored = storage.partition_row_count(process_date).await?;

        info!(
            date = %process_date,
            rows_in = transform.rows_in,
            rows_loaded = rows_loaded,
            stored = stored,
            "Silver partition reload completed"
        );

        Ok(PartitionStats {
            process_date,
            transform,
            rows_loaded,
        })
    }

    /// Reload every available date that has no silver partition yet
    ///
    /// The work list comes from the persisted calendar, so an interrupted
    /// backfill resumes where it stopped. A failing date aborts the run;
    /// partitions already reloaded stay in place.
    pub async fn run_pending(&self) -> Result<Vec<PartitionStats>> {
        let storage = MobilityStorage::new(self.db.clone(), self.config.clone());
        storage.ensure_schema().await?;

        let pending = storage.pending_dates().await?;

        info!(count = pending.len(), "Reloading pending silver partitions");

        let mut results = Vec::with_capacity(pending.len());

        for (index, date) in pending.iter().enumerate() {
            info!("Partition {} / {}: {}", index + 1, pending.len(), date);
            results.push(self.run_partition(*date).await?);
        }

        info!(count = results.len(), "All pending partitions reloaded");

        Ok(results)
    }

    /// Get pipeline configuration
    pub fn config(&self) -> &MobilityConfig {
        &self.config
    }
}
