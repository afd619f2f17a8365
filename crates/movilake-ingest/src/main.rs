//! Movilake Ingest - Lakehouse ingestion tool

use anyhow::Result;
use chrono::NaiveDate;
use clap::Parser;
use movilake_common::db::{create_pool, DbConfig};
use movilake_common::logging::{init_logging, LogConfig, LogLevel};
use movilake_ingest::economy::{EconomyConfig, EconomyPipeline};
use movilake_ingest::mobility::{MobilityConfig, MobilityPipeline};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "movilake-ingest")]
#[command(author, version, about = "Movilake lakehouse ingestion tool")]
struct Cli {
    /// Unit of work to run
    #[command(subcommand)]
    job: Job,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Job {
    /// Probe the mobility archive and refresh the bronze layer
    Discover,

    /// Rebuild mobility silver partitions
    SilverMobility {
        /// Process date (YYYY-MM-DD); mutually exclusive with --pending
        #[arg(short, long, conflicts_with = "pending")]
        date: Option<NaiveDate>,

        /// Reload every available date with no silver partition yet
        #[arg(long)]
        pending: bool,
    },

    /// Rebuild the aggregated income table
    SilverEconomy,

    /// Full run: discovery, pending mobility partitions, economy reload
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("movilake-ingest".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    let pool = create_pool(&DbConfig::from_env().unwrap_or_default()).await?;

    match cli.job {
        Job::Discover => {
            info!("Running mobility discovery");
            let pipeline = MobilityPipeline::new(MobilityConfig::from_env(), pool)?;
            pipeline.run_discovery().await?;
        },
        Job::SilverMobility { date, pending } => {
            let pipeline = MobilityPipeline::new(MobilityConfig::from_env(), pool)?;

            match date {
                Some(process_date) => {
                    info!("Reloading mobility partition {}", process_date);
                    pipeline.run_partition(process_date).await?;
                },
                None if pending => {
                    info!("Reloading pending mobility partitions");
                    pipeline.run_pending().await?;
                },
                None => {
                    anyhow::bail!("silver-mobility requires --date <YYYY-MM-DD> or --pending");
                },
            }
        },
        Job::SilverEconomy => {
            info!("Rebuilding aggregated income table");
            let pipeline = EconomyPipeline::new(EconomyConfig::from_env(), pool)?;
            pipeline.run().await?;
        },
        Job::Run => {
            info!("Running full ingestion");

            let mobility = MobilityPipeline::new(MobilityConfig::from_env(), pool.clone())?;
            mobility.run_discovery().await?;
            mobility.run_pending().await?;

            let economy = EconomyPipeline::new(EconomyConfig::from_env(), pool)?;
            economy.run().await?;
        },
    }

    info!("Ingestion complete");
    Ok(())
}
