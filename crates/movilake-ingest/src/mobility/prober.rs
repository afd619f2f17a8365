//! Daily-file availability probing
//!
//! The archive publishes one compressed file per calendar date under a
//! predictable URL, but not every date exists. Before bulk-loading, every date
//! in the configured range is HEAD-checked so only confirmed files are read.
//!
//! Policy: only an explicit 200 counts as present. A non-OK status and a
//! failed check (timeout, transport error) both end up persisted as "no data";
//! the distinction is kept in [`ProbeOutcome`] for callers and logs, and no
//! retry is attempted.

use chrono::Utc;
use futures::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::config::MobilityConfig;
use super::models::{date_range, DateAvailability, DateProbe, ProbeOutcome};
use super::{MobilityError, Result};

/// Existence prober for the daily-file archive
pub struct AvailabilityProber {
    config: MobilityConfig,
    client: Client,
}

impl AvailabilityProber {
    pub fn new(config: MobilityConfig) -> Result<Self> {
        config.validate().map_err(MobilityError::Validation)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.probe_timeout_secs))
            .user_agent("Movilake-Mobility-Ingester/1.0")
            .build()?;

        Ok(Self { config, client })
    }

    /// Probe every date in the configured range
    ///
    /// Checks run concurrently, bounded to `worker_count` in flight; results
    /// are gathered in completion order and returned sorted by date ascending.
    pub async fn probe_all(&self) -> Result<Vec<DateProbe>> {
        let dates = date_range(self.config.start_date, self.config.end_date);

        info!(
            count = dates.len(),
            start = %self.config.start_date,
            end = %self.config.end_date,
            "Probing {} candidate daily files",
            dates.len()
        );

        let pb = ProgressBar::new(dates.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{msg} [{wide_bar:.cyan/blue}] {pos}/{len}")
                .map_err(|e| MobilityError::Validation(e.to_string()))?
                .progress_chars("#>-"),
        );
        pb.set_message("Checking archive");

        let mut probes: Vec<DateProbe> = futures::stream::iter(dates)
            .map(|date| {
                let url = self.config.daily_file_url(date);
                let pb = pb.clone();

                async move {
                    let probe = self.probe_url(date, url).await;
                    pb.inc(1);
                    probe
                }
            })
            .buffer_unordered(self.config.worker_count)
            .collect()
            .await;

        pb.finish_with_message("Archive check complete");

        // Completion order is arbitrary; the calendar must be date-ascending
        probes.sort_by_key(|p| p.date);

        let present = probes.iter().filter(|p| p.outcome == ProbeOutcome::Present).count();
        let failed = probes
            .iter()
            .filter(|p| p.outcome == ProbeOutcome::CheckFailed)
            .count();

        info!(
            present = present,
            missing = probes.len() - present,
            check_failures = failed,
            "Found {} daily files out of {} candidate dates",
            present,
            probes.len()
        );

        Ok(probes)
    }

    /// Existence check for a single URL, no body download
    async fn probe_url(&self, date: chrono::NaiveDate, url: String) -> DateProbe {
        let outcome = match self.client.head(&url).send().await {
            Ok(response) if response.status() == StatusCode::OK => ProbeOutcome::Present,
            Ok(response) => {
                debug!(status = %response.status(), %url, "Daily file not present");
                ProbeOutcome::Absent
            },
            Err(e) => {
                warn!(error = %e, %url, "Existence check failed");
                ProbeOutcome::CheckFailed
            },
        };

        DateProbe { date, url, outcome }
    }

    /// URLs of the probed dates whose file is confirmed present, date-ascending
    pub fn valid_sources(probes: &[DateProbe]) -> Vec<String> {
        probes
            .iter()
            .filter(|p| p.outcome == ProbeOutcome::Present)
            .map(|p| p.url.clone())
            .collect()
    }

    /// Collapse probe results into the persisted completeness calendar
    ///
    /// Every probed date gets exactly one row; `Absent` and `CheckFailed` both
    /// flag `has_data = false` here.
    pub fn availability_calendar(probes: &[DateProbe]) -> Vec<DateAvailability> {
        let observed_at = Utc::now();

        let mut calendar: Vec<DateAvailability> = probes
            .iter()
            .map(|p| DateAvailability {
                date: p.date,
                has_data: p.outcome.has_data(),
                observed_at,
            })
            .collect();

        calendar.sort_by_key(|d| d.date);
        calendar
    }

    /// Get configuration
    pub fn config(&self) -> &MobilityConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================
