//! Integration tests for the bronze bulk read
//!
//! These tests validate the loader contract against a mocked archive:
//! - gzip payloads are decompressed transparently
//! - malformed rows are skipped and counted, never an error
//! - an unreadable source is tolerated; only a total failure propagates

use flate2::write::GzEncoder;
use flate2::Compression;
use movilake_ingest::mobility::{BronzeLoader, MobilityConfig, MobilityError};
use std::io::Write;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WELL_FORMED_CSV: &str = "date,hour_period,origin_zone,destination_zone,trips\n\
                               20230101,07,08019,08020,12.5\n\
                               20230101,08,08021,08019,3.0\n";

const PARTLY_MALFORMED_CSV: &str = "date,hour_period,origin_zone,destination_zone,trips\n\
                                    20230101,07,08019,08020,12.5\n\
                                    20230101,08,08021,08019,not-a-number\n\
                                    20230101,09,08021,08019,4.0\n";

fn gzip(content: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap()
}

fn loader() -> BronzeLoader {
    BronzeLoader::new(MobilityConfig::test_config()).unwrap()
}

#[tokio::test]
async fn reads_gzipped_sources() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/daily/20230101_trips.csv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(WELL_FORMED_CSV)))
        .mount(&mock_server)
        .await;

    let sources = vec![format!("{}/daily/20230101_trips.csv.gz", mock_server.uri())];
    let (records, stats) = loader().fetch_all(&sources).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(stats.sources_read, 1);
    assert_eq!(stats.rows_loaded, 2);
    assert_eq!(stats.rows_skipped, 0);
    assert_eq!(records[0].origin_zone, "08019");
    assert_eq!(records[1].trips, 3.0);
}

#[tokio::test]
async fn reads_plain_sources_without_decompression() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/daily/20230101_trips.csv"))
        .respond_with(ResponseTemplate::new(200).set_body_string(WELL_FORMED_CSV))
        .mount(&mock_server)
        .await;

    let sources = vec![format!("{}/daily/20230101_trips.csv", mock_server.uri())];
    let (records, _) = loader().fetch_all(&sources).await.unwrap();

    assert_eq!(records.len(), 2);
}

#[tokio::test]
async fn skips_malformed_rows_and_counts_them() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/daily/20230101_trips.csv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(PARTLY_MALFORMED_CSV)))
        .mount(&mock_server)
        .await;

    let sources = vec![format!("{}/daily/20230101_trips.csv.gz", mock_server.uri())];
    let (records, stats) = loader().fetch_all(&sources).await.unwrap();

    // The bad row disappears silently but stays observable by count
    assert_eq!(records.len(), 2);
    assert_eq!(stats.rows_loaded, 2);
    assert_eq!(stats.rows_skipped, 1);
}

#[tokio::test]
async fn tolerates_a_failing_source_among_readable_ones() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/daily/20230101_trips.csv.gz"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(gzip(WELL_FORMED_CSV)))
        .mount(&mock_server)
        .await;

    // The second source only ever answers 404
    let sources = vec![
        format!("{}/daily/20230101_trips.csv.gz", mock_server.uri()),
        format!("{}/daily/20230102_trips.csv.gz", mock_server.uri()),
    ];

    let (records, stats) = loader().fetch_all(&sources).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(stats.sources_total, 2);
    assert_eq!(stats.sources_read, 1);
}

#[tokio::test]
async fn fails_when_every_source_is_unreadable() {
    let mock_server = MockServer::start().await;

    let sources = vec![
        format!("{}/daily/20230101_trips.csv.gz", mock_server.uri()),
        format!("{}/daily/20230102_trips.csv.gz", mock_server.uri()),
    ];

    let result = loader().fetch_all(&sources).await;

    assert!(matches!(result, Err(MobilityError::NoSources(_))));
}

#[tokio::test]
async fn empty_source_list_yields_empty_read() {
    let (records, stats) = loader().fetch_all(&[]).await.unwrap();

    assert!(records.is_empty());
    assert_eq!(stats.sources_total, 0);
    assert_eq!(stats.rows_loaded, 0);
}
