//! Bronze-layer bulk read of confirmed daily files
//!
//! Reads every confirmed source in one pass: download with bounded retry,
//! gunzip, parse the delimited payload. A row that does not fit the expected
//! column layout is skipped and counted, never an error; a source that cannot
//! be read at all is skipped with a warning. The read fails only when every
//! requested source failed.

use flate2::read::GzDecoder;
use reqwest::Client;
use std::io::Read;
use std::time::Duration;
use tracing::{info, warn};

use super::config::MobilityConfig;
use super::models::RawTripRecord;
use super::{MobilityError, Result};

/// Counters for one bulk read
///
/// `rows_skipped` makes the silent row-drop policy observable: callers can
/// compare loaded vs. skipped without the loader ever failing on a bad row.
#[derive(Debug, Clone, Default)]
pub struct BronzeStats {
    pub sources_total: usize,
    pub sources_read: usize,
    pub rows_loaded: usize,
    pub rows_skipped: usize,
}

/// Bulk reader for confirmed daily files
pub struct BronzeLoader {
    client: Client,
    config: MobilityConfig,
}

impl BronzeLoader {
    /// Create new loader with configuration
    pub fn new(config: MobilityConfig) -> Result<Self> {
        config.validate().map_err(MobilityError::Validation)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.download_timeout_secs))
            .user_agent("Movilake-Mobility-Ingester/1.0")
            .build()?;

        Ok(BronzeLoader { client, config })
    }

    /// Read all confirmed sources into raw trip records
    ///
    /// Sources are read sequentially in the given order. Fails only when no
    /// source at all could be read.
    pub async fn fetch_all(&self, sources: &[String]) -> Result<(Vec<RawTripRecord>, BronzeStats)> {
        let mut records = Vec::new();
        let mut stats = BronzeStats {
            sources_total: sources.len(),
            ..BronzeStats::default()
        };

        for (index, url) in sources.iter().enumerate() {
            match self.fetch_source(url).await {
                Ok((source_records, skipped)) => {
                    info!(
                        "Read source {} / {}: {} rows ({} skipped)",
                        index + 1,
                        sources.len(),
                        source_records.len(),
                        skipped
                    );

                    stats.sources_read += 1;
                    stats.rows_loaded += source_records.len();
                    stats.rows_skipped += skipped;
                    records.extend(source_records);
                },
                Err(e) => {
                    warn!(error = %e, %url, "Failed to read source");
                },
            }
        }

        if !sources.is_empty() && stats.sources_read == 0 {
            return Err(MobilityError::NoSources(format!(
                "all {} sources failed to read",
                sources.len()
            )));
        }

        info!(
            sources_read = stats.sources_read,
            rows_loaded = stats.rows_loaded,
            rows_skipped = stats.rows_skipped,
            "Bulk read complete"
        );

        Ok((records, stats))
    }

    /// Read one source: download, decompress, parse
    async fn fetch_source(&self, url: &str) -> Result<(Vec<RawTripRecord>, usize)> {
        let compressed = self.download_with_retry(url).await?;

        let payload = if url.ends_with(".gz") {
            self.decompress_gzip(&compressed)?
        } else {
            compressed
        };

        self.parse_rows(&payload)
    }

    /// Download URL with retry logic
    async fn download_with_retry(&self, url: &str) -> Result<Vec<u8>> {
        let mut last_error = None;

        for attempt in 1..=self.config.max_retries {
            match self.download_url(url).await {
                Ok(content) => return Ok(content),
                Err(e) => {
                    warn!(
                        "Download attempt {}/{} failed: {}",
                        attempt, self.config.max_retries, e
                    );
                    last_error = Some(e);

                    if attempt < self.config.max_retries {
                        // Exponential backoff: 2^attempt seconds
                        let backoff_secs = 2u64.pow(attempt);
                        tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
                    }
                },
            }
        }

        match last_error {
            Some(err) => Err(err),
            None => Err(MobilityError::Validation(format!(
                "Download of {} failed with no error captured (max_retries must be >= 1)",
                url
            ))),
        }
    }

    /// Download URL without retry
    async fn download_url(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("HTTP error: {}", response.status()),
            )
            .into());
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }

    /// Decompress gzip data
    fn decompress_gzip(&self, compressed: &[u8]) -> Result<Vec<u8>> {
        let mut decoder = GzDecoder::new(compressed);
        let mut decompressed = Vec::new();

        decoder
            .read_to_end(&mut decompressed)
            .map_err(|e| MobilityError::Decompression(e.to_string()))?;

        Ok(decompressed)
    }

    /// Parse the delimited payload, skipping rows that do not deserialize
    fn parse_rows(&self, payload: &[u8]) -> Result<(Vec<RawTripRecord>, usize)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.config.csv_delimiter)
            .flexible(true)
            .from_reader(payload);

        let mut records = Vec::new();
        let mut skipped = 0;

        for result in reader.deserialize::<RawTripRecord>() {
            match result {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    warn!(error = %e, "Skipping malformed row");
                },
            }
        }

        Ok((records, skipped))
    }

    /// Get configuration
    pub fn config(&self) -> &MobilityConfig {
        &self.config
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> BronzeLoader {
        BronzeLoader::new(MobilityConfig::test_config()).unwrap()
    }

    #[test]
    fn test_loader_creation() {
        let config = MobilityConfig::test_config();
        assert!(BronzeLoader::new(config).is_ok());
    }

    #[test]
    fn test_invalid_config() {
        let mut config = MobilityConfig::test_config();
        config.url_template = String::new();
        assert!(BronzeLoader::new(config).is_err());
    }

    #[test]
    fn test_decompress_gzip() {
        use flate2::write::GzEncoder;
        use flate2::Compression;
        use std::io::Write;

        let test_data = b"date,hour_period,origin_zone,destination_zone,trips\n";
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(test_data).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = loader().decompress_gzip(&compressed).unwrap();
        assert_eq!(decompressed, test_data);
    }

    #[test]
    fn test_parse_rows() {
        let payload = b"date,hour_period,origin_zone,destination_zone,trips\n\
                        20230101,07,08019,08020,12.5\n\
                        20230101,08,08019,externo,3.0\n";

        let (records, skipped) = loader().parse_rows(payload).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 0);
        assert_eq!(records[0].origin_zone, "08019");
        assert_eq!(records[0].trips, 12.5);
    }

    #[test]
    fn test_parse_rows_skips_malformed() {
        let payload = b"date,hour_period,origin_zone,destination_zone,trips\n\
                        20230101,07,08019,08020,12.5\n\
                        20230101,08,08019,08020,not-a-number\n\
                        20230101,09,08019,08020,4.0\n";

        let (records, skipped) = loader().parse_rows(payload).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
    }
}
