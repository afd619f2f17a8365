//! Integration tests for archive availability probing
//!
//! These tests validate the discovery contract against a mocked archive:
//! - only an explicit 200 flags a date as present
//! - missing dates and failed checks both persist as absent
//! - the completeness calendar covers the whole range, date-ascending

use chrono::NaiveDate;
use movilake_ingest::mobility::{AvailabilityProber, MobilityConfig, ProbeOutcome};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server_uri: &str, start: NaiveDate, end: NaiveDate) -> MobilityConfig {
    MobilityConfig::builder()
        .date_range(start, end)
        .url_template(format!(
            "{}/daily/{{year_month}}/{{date}}_trips.csv.gz",
            server_uri
        ))
        .worker_count(4)
        .probe_timeout_secs(2)
        .build()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn probe_flags_exactly_the_published_dates() {
    let mock_server = MockServer::start().await;

    // Only January 1st and 3rd exist; every other probe hits the mock
    // server's default 404.
    for day in ["20230101", "20230103"] {
        Mock::given(method("HEAD"))
            .and(path(format!("/daily/2023-01/{}_trips.csv.gz", day)))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;
    }

    let config = config_for(&mock_server.uri(), date(2023, 1, 1), date(2023, 1, 5));
    let prober = AvailabilityProber::new(config).unwrap();

    let probes = prober.probe_all().await.unwrap();
    let calendar = AvailabilityProber::availability_calendar(&probes);

    assert_eq!(calendar.len(), 5);

    let flagged: Vec<NaiveDate> = calendar
        .iter()
        .filter(|d| d.has_data)
        .map(|d| d.date)
        .collect();
    assert_eq!(flagged, vec![date(2023, 1, 1), date(2023, 1, 3)]);

    // Sorted by date ascending regardless of probe completion order
    for window in calendar.windows(2) {
        assert!(window[0].date < window[1].date);
    }
}

#[tokio::test]
async fn probe_treats_non_ok_status_as_absent() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/daily/2023-01/20230101_trips.csv.gz"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server.uri(), date(2023, 1, 1), date(2023, 1, 1));
    let prober = AvailabilityProber::new(config).unwrap();

    let probes = prober.probe_all().await.unwrap();

    assert_eq!(probes.len(), 1);
    assert_eq!(probes[0].outcome, ProbeOutcome::Absent);
    assert!(!probes[0].outcome.has_data());
}

#[tokio::test]
async fn probe_records_transport_failure_as_check_failed() {
    // Nothing listens on this port; the check itself fails rather than the
    // archive answering.
    let config = config_for("http://127.0.0.1:9", date(2023, 1, 1), date(2023, 1, 2));
    let prober = AvailabilityProber::new(config).unwrap();

    let probes = prober.probe_all().await.unwrap();
    let calendar = AvailabilityProber::availability_calendar(&probes);

    assert_eq!(probes.len(), 2);
    assert!(probes.iter().all(|p| p.outcome == ProbeOutcome::CheckFailed));

    // The three-valued outcome collapses to absent at the persistence boundary
    assert!(calendar.iter().all(|d| !d.has_data));
}

#[tokio::test]
async fn valid_sources_follow_probe_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("HEAD"))
        .and(path("/daily/2023-02/20230228_trips.csv.gz"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let config = config_for(&mock_server.uri(), date(2023, 2, 27), date(2023, 2, 28));
    let prober = AvailabilityProber::new(config).unwrap();

    let probes = prober.probe_all().await.unwrap();
    let sources = AvailabilityProber::valid_sources(&probes);

    assert_eq!(sources.len(), 1);
    assert!(sources[0].ends_with("/daily/2023-02/20230228_trips.csv.gz"));
}
