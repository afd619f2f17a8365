//! Movilake Ingest Library
//!
//! Layered lakehouse ingestion for Spanish open mobility data and the
//! socio-economic indicator dataset that accompanies it.
//!
//! # Pipelines
//!
//! - **Mobility**: probes the daily-file archive for existing partitions,
//!   bulk-loads them into the bronze layer together with a date-completeness
//!   calendar, and rebuilds cleaned per-day trip aggregates in the silver layer.
//! - **Economy**: rebuilds the aggregated income table from the pre-loaded
//!   bronze indicator dataset via full truncate-and-reload.
//!
//! # Example
//!
//! ```no_run
//! use movilake_ingest::mobility::{MobilityConfig, MobilityPipeline};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let pool = movilake_common::create_pool(&movilake_common::DbConfig::from_env()?).await?;
//!     let pipeline = MobilityPipeline::new(MobilityConfig::from_env(), pool)?;
//!     pipeline.run_discovery().await?;
//!     Ok(())
//! }
//! ```

pub mod economy;
pub mod mobility;
