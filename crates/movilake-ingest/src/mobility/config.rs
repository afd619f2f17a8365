// Mobility Archive Configuration

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Token replaced with the date formatted as `%Y-%m`
pub const YEAR_MONTH_TOKEN: &str = "{year_month}";

/// Token replaced with the date formatted as `%Y%m%d`
pub const DATE_TOKEN: &str = "{date}";

/// Configuration for mobility archive discovery and ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MobilityConfig {
    /// First date of the probed range (inclusive)
    pub start_date: NaiveDate,

    /// Last date of the probed range (inclusive)
    pub end_date: NaiveDate,

    /// Daily file URL template with `{year_month}` and `{date}` tokens
    pub url_template: String,

    /// Simultaneous existence checks during probing
    pub worker_count: usize,

    /// Per-probe timeout in seconds
    pub probe_timeout_secs: u64,

    /// Per-download timeout in seconds
    pub download_timeout_secs: u64,

    /// Maximum attempts for each bronze source download
    pub max_retries: u32,

    /// Field delimiter of the daily files
    pub csv_delimiter: u8,

    /// Version identifier stamped on every silver aggregate row
    pub analysis_id: i32,

    /// Raw trips table name
    pub bronze_table: String,

    /// Date-completeness calendar table name
    pub dates_table: String,

    /// Aggregated trips table name
    pub silver_table: String,
}

impl Default for MobilityConfig {
    fn default() -> Self {
        MobilityConfig {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap_or_default(),
            url_template: "https://movilidad-opendata.mitma.es/estudios_basicos/por-distritos/viajes/ficheros-diarios/{year_month}/{date}_Viajes_distritos.csv.gz".to_string(),
            worker_count: 10,
            probe_timeout_secs: 5,
            download_timeout_secs: 600,
            max_retries: 3,
            csv_delimiter: b',',
            analysis_id: 1,
            bronze_table: "bronze_raw_mobility_trips".to_string(),
            dates_table: "bronze_mobility_data_dates".to_string(),
            silver_table: "silver_mobility_trips".to_string(),
        }
    }
}

impl MobilityConfig {
    /// Create new config with builder pattern
    pub fn builder() -> MobilityConfigBuilder {
        MobilityConfigBuilder::default()
    }

    /// Daily file URL for a specific date
    ///
    /// Substitutes the year-month (`%Y-%m`) and full-date (`%Y%m%d`) tokens of
    /// the configured template.
    pub fn daily_file_url(&self, date: NaiveDate) -> String {
        self.url_template
            .replace(YEAR_MONTH_TOKEN, &date.format("%Y-%m").to_string())
            .replace(DATE_TOKEN, &date.format("%Y%m%d").to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url_template.is_empty() {
            return Err("URL template cannot be empty".to_string());
        }

        if !self.url_template.contains(DATE_TOKEN) {
            return Err(format!("URL template must contain the {} token", DATE_TOKEN));
        }

        if self.start_date > self.end_date {
            return Err(format!(
                "Start date {} is after end date {}",
                self.start_date, self.end_date
            ));
        }

        if self.worker_count == 0 {
            return Err("Worker count must be greater than 0".to_string());
        }

        if self.probe_timeout_secs == 0 || self.download_timeout_secs == 0 {
            return Err("Timeouts must be greater than 0".to_string());
        }

        if self.bronze_table.is_empty() || self.dates_table.is_empty() || self.silver_table.is_empty()
        {
            return Err("Table names cannot be empty".to_string());
        }

        Ok(())
    }

    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let default = MobilityConfig::default();

        MobilityConfig {
            start_date: std::env::var("MOBILITY_START_DATE")
                .ok()
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
                .unwrap_or(default.start_date),
            end_date: std::env::var("MOBILITY_END_DATE")
                .ok()
                .and_then(|s| NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok())
                .unwrap_or(default.end_date),
            url_template: std::env::var("MOBILITY_URL_TEMPLATE").unwrap_or(default.url_template),
            worker_count: std::env::var("MOBILITY_WORKER_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.worker_count),
            probe_timeout_secs: std::env::var("MOBILITY_PROBE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.probe_timeout_secs),
            download_timeout_secs: std::env::var("MOBILITY_DOWNLOAD_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.download_timeout_secs),
            max_retries: std::env::var("MOBILITY_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_retries),
            csv_delimiter: default.csv_delimiter,
            analysis_id: std::env::var("MOBILITY_ANALYSIS_ID")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.analysis_id),
            bronze_table: std::env::var("MOBILITY_BRONZE_TABLE").unwrap_or(default.bronze_table),
            dates_table: std::env::var("MOBILITY_DATES_TABLE").unwrap_or(default.dates_table),
            silver_table: std::env::var("MOBILITY_SILVER_TABLE").unwrap_or(default.silver_table),
        }
    }

    /// Configuration for tests: tiny range, fast probes, single retry
    pub fn test_config() -> Self {
        MobilityConfig {
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default(),
            end_date: NaiveDate::from_ymd_opt(2023, 1, 5).unwrap_or_default(),
            probe_timeout_secs: 2,
            download_timeout_secs: 30,
            max_retries: 1,
            ..MobilityConfig::default()
        }
    }
}

/// Builder for MobilityConfig
#[derive(Debug, Default)]
pub struct MobilityConfigBuilder {
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    url_template: Option<String>,
    worker_count: Option<usize>,
    probe_timeout_secs: Option<u64>,
    download_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    csv_delimiter: Option<u8>,
    analysis_id: Option<i32>,
    bronze_table: Option<String>,
    dates_table: Option<String>,
    silver_table: Option<String>,
}

impl MobilityConfigBuilder {
    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn url_template(mut self, template: impl Into<String>) -> Self {
        self.url_template = Some(template.into());
        self
    }

    pub fn worker_count(mut self, count: usize) -> Self {
        self.worker_count = Some(count);
        self
    }

    pub fn probe_timeout_secs(mut self, secs: u64) -> Self {
        self.probe_timeout_secs = Some(secs);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.download_timeout_secs = Some(secs);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn csv_delimiter(mut self, delimiter: u8) -> Self {
        self.csv_delimiter = Some(delimiter);
        self
    }

    pub fn analysis_id(mut self, id: i32) -> Self {
        self.analysis_id = Some(id);
        self
    }

    pub fn bronze_table(mut self, table: impl Into<String>) -> Self {
        self.bronze_table = Some(table.into());
        self
    }

    pub fn dates_table(mut self, table: impl Into<String>) -> Self {
        self.dates_table = Some(table.into());
        self
    }

    pub fn silver_table(mut self, table: impl Into<String>) -> Self {
        self.silver_table = Some(table.into());
        self
    }

    pub fn build(self) -> MobilityConfig {
        let default = MobilityConfig::default();

        MobilityConfig {
            start_date: self.start_date.unwrap_or(default.start_date),
            end_date: self.end_date.unwrap_or(default.end_date),
            url_template: self.url_template.unwrap_or(default.url_template),
            worker_count: self.worker_count.unwrap_or(default.worker_count),
            probe_timeout_secs: self.probe_timeout_secs.unwrap_or(default.probe_timeout_secs),
            download_timeout_secs: self
                .download_timeout_secs
                .unwrap_or(default.download_timeout_secs),
            max_retries: self.max_retries.unwrap_or(default.max_retries),
            csv_delimiter: self.csv_delimiter.unwrap_or(default.csv_delimiter),
            analysis_id: self.analysis_id.unwrap_or(default.analysis_id),
            bronze_table: self.bronze_table.unwrap_or(default.bronze_table),
            dates_table: self.dates_table.unwrap_or(default.dates_table),
            silver_table: self.silver_table.unwrap_or(default.silver_table),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MobilityConfig::default();
        assert_eq!(config.worker_count, 10);
        assert_eq!(config.probe_timeout_secs, 5);
        assert_eq!(config.analysis_id, 1);
        assert_eq!(config.bronze_table, "bronze_raw_mobility_trips");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_daily_file_url() {
        let config = MobilityConfig::default();
        let date = NaiveDate::from_ymd_opt(2023, 1, 15).unwrap();

        assert_eq!(
            config.daily_file_url(date),
            "https://movilidad-opendata.mitma.es/estudios_basicos/por-distritos/viajes/ficheros-diarios/2023-01/20230115_Viajes_distritos.csv.gz"
        );
    }

    #[test]
    fn test_builder_pattern() {
        let config = MobilityConfig::builder()
            .date_range(
                NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 6, 30).unwrap(),
            )
            .worker_count(4)
            .analysis_id(7)
            .silver_table("silver_trips_test")
            .build();

        assert_eq!(config.worker_count, 4);
        assert_eq!(config.analysis_id, 7);
        assert_eq!(config.silver_table, "silver_trips_test");
        assert_eq!(config.start_date, NaiveDate::from_ymd_opt(2023, 6, 1).unwrap());
    }

    #[test]
    fn test_validate() {
        let config = MobilityConfig::default();
        assert!(config.validate().is_ok());

        let mut invalid = config.clone();
        invalid.url_template = "https://example.com/static.csv.gz".to_string();
        assert!(invalid.validate().is_err());

        let mut inverted = config.clone();
        inverted.start_date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(inverted.validate().is_err());

        let mut no_workers = config;
        no_workers.worker_count = 0;
        assert!(no_workers.validate().is_err());
    }
}
