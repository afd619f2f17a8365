//! Silver-layer trip derivation and aggregation
//!
//! Pure transformation from raw trip rows to the cleaned per-day aggregate:
//! timestamp reconstruction at hour granularity, zone trimming, sentinel
//! filtering, and summation per `(timestamp, origin, destination)` key. The
//! storage layer wraps the result in the delete-then-insert partition reload.

use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

use super::models::{RawTripRecord, SilverTripAggregate};

/// Reserved zone identifier for traffic outside the analyzed zone set
pub const EXTERNAL_ZONE_SENTINEL: &str = "externo";

/// Counters for one partition transformation
///
/// Unparseable rows are dropped, not nulled; the counts keep that policy
/// observable for callers and logs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Raw rows considered
    pub rows_in: usize,
    /// Rows dropped because date or hour could not be parsed
    pub rows_rejected: usize,
    /// Rows dropped by the sentinel filter or because they fall outside the
    /// process date
    pub rows_filtered: usize,
    /// Aggregate rows produced
    pub aggregates_out: usize,
}

/// Reconstruct a trip timestamp from the published date and hour fields
///
/// The date is `%Y%m%d`; the hour is an hour-of-day that some files publish
/// zero-padded and some do not. Returns `None` when either part is invalid.
pub fn compose_timestamp(date: &str, hour_period: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date.trim(), "%Y%m%d").ok()?;
    let hour: u32 = hour_period.trim().parse().ok()?;

    date.and_hms_opt(hour, 0, 0)
}

/// Derive the aggregate rows for one process date
///
/// Rows whose origin or destination equals the external-traffic sentinel are
/// excluded, as are rows whose reconstructed timestamp does not fall on
/// `process_date`. Surviving rows are summed per
/// `(trip_timestamp, origin_zone_id, destination_zone_id)`, so the output
/// contains at most one row per key. Output order is deterministic
/// (key-ascending), which makes re-runs byte-identical.
pub fn transform_partition(
    rows: &[RawTripRecord],
    process_date: NaiveDate,
    analysis_id: i32,
) -> (Vec<SilverTripAggregate>, TransformStats) {
    let mut stats = TransformStats {
        rows_in: rows.len(),
        ..TransformStats::default()
    };

    let mut groups: BTreeMap<(NaiveDateTime, String, String), f64> = BTreeMap::new();

    for row in rows {
        let Some(trip_timestamp) = compose_timestamp(&row.date, &row.hour_period) else {
            stats.rows_rejected += 1;
            continue;
        };

        if trip_timestamp.date() != process_date {
            stats.rows_filtered += 1;
            continue;
        }

        let origin = row.origin_zone.trim();
        let destination = row.destination_zone.trim();

        if origin == EXTERNAL_ZONE_SENTINEL || destination == EXTERNAL_ZONE_SENTINEL {
            stats.rows_filtered += 1;
            continue;
        }

        *groups
            .entry((trip_timestamp, origin.to_string(), destination.to_string()))
            .or_insert(0.0) += row.trips;
    }

    let aggregates: Vec<SilverTripAggregate> = groups
        .into_iter()
        .map(
            |((trip_timestamp, origin_zone_id, destination_zone_id), total_trips)| {
                SilverTripAggregate {
                    trip_timestamp,
                    origin_zone_id,
                    destination_zone_id,
                    total_trips,
                    analysis_id,
                }
            },
        )
        .collect();

    stats.aggregates_out = aggregates.len();

    (aggregates, stats)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, hour: &str, origin: &str, destination: &str, trips: f64) -> RawTripRecord {
        RawTripRecord {
            date: date.to_string(),
            hour_period: hour.to_string(),
            origin_zone: origin.to_string(),
            destination_zone: destination.to_string(),
            trips,
        }
    }

    fn process_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 1, 15).unwrap()
    }

    #[test]
    fn test_compose_timestamp_padded_hour() {
        let ts = compose_timestamp("20230115", "07").unwrap();
        assert_eq!(ts, NaiveDate::from_ymd_opt(2023, 1, 15).unwrap().and_hms_opt(7, 0, 0).unwrap());
    }

    #[test]
    fn test_compose_timestamp_unpadded_hour() {
        let ts = compose_timestamp("20230115", "7").unwrap();
        assert_eq!(ts.format("%H").to_string(), "07");
    }

    #[test]
    fn test_compose_timestamp_rejects_garbage() {
        assert!(compose_timestamp("2023-01-15", "07").is_none());
        assert!(compose_timestamp("20230115", "24").is_none());
        assert!(compose_timestamp("20230115", "xx").is_none());
        assert!(compose_timestamp("20231301", "07").is_none());
    }

    #[test]
    fn test_sentinel_rows_never_reach_output() {
        let rows = vec![
            raw("20230115", "08", "externo", "08019", 5.0),
            raw("20230115", "08", "08019", "externo", 5.0),
            raw("20230115", "08", "08019", "08020", 5.0),
        ];

        let (aggregates, stats) = transform_partition(&rows, process_date(), 1);

        assert_eq!(aggregates.len(), 1);
        assert_eq!(stats.rows_filtered, 2);
        assert!(aggregates
            .iter()
            .all(|a| a.origin_zone_id != "externo" && a.destination_zone_id != "externo"));
    }

    #[test]
    fn test_aggregation_sums_trip_counts() {
        let rows = vec![
            raw("20230115", "08", "08019", "08020", 3.0),
            raw("20230115", "08", "08019", "08020", 4.0),
        ];

        let (aggregates, stats) = transform_partition(&rows, process_date(), 1);

        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].total_trips, 7.0);
        assert_eq!(stats.aggregates_out, 1);
    }

    #[test]
    fn test_zone_identifiers_are_trimmed() {
        let rows = vec![
            raw("20230115", "08", " 08019 ", "08020", 1.0),
            raw("20230115", "08", "08019", " 08020", 2.0),
        ];

        let (aggregates, _) = transform_partition(&rows, process_date(), 1);

        // Both rows collapse onto the same trimmed key
        assert_eq!(aggregates.len(), 1);
        assert_eq!(aggregates[0].origin_zone_id, "08019");
        assert_eq!(aggregates[0].destination_zone_id, "08020");
        assert_eq!(aggregates[0].total_trips, 3.0);
    }

    #[test]
    fn test_unparseable_rows_are_dropped_not_nulled() {
        let rows = vec![
            raw("not-a-date", "08", "08019", "08020", 1.0),
            raw("20230115", "99", "08019", "08020", 1.0),
            raw("20230115", "08", "08019", "08020", 1.0),
        ];

        let (aggregates, stats) = transform_partition(&rows, process_date(), 1);

        assert_eq!(stats.rows_rejected, 2);
        assert_eq!(aggregates.len(), 1);
    }

    #[test]
    fn test_rows_outside_process_date_are_filtered() {
        let rows = vec![
            raw("20230114", "08", "08019", "08020", 1.0),
            raw("20230115", "08", "08019", "08020", 1.0),
        ];

        let (aggregates, stats) = transform_partition(&rows, process_date(), 1);

        assert_eq!(aggregates.len(), 1);
        assert_eq!(stats.rows_filtered, 1);
        assert_eq!(aggregates[0].trip_timestamp.date(), process_date());
    }

    #[test]
    fn test_analysis_id_is_stamped_from_configuration() {
        let rows = vec![raw("20230115", "08", "08019", "08020", 1.0)];

        let (aggregates, _) = transform_partition(&rows, process_date(), 42);

        assert_eq!(aggregates[0].analysis_id, 42);
    }

    #[test]
    fn test_repeat_transformation_is_identical() {
        let rows = vec![
            raw("20230115", "10", "08021", "08019", 2.0),
            raw("20230115", "08", "08019", "08020", 3.0),
            raw("20230115", "08", "08019", "08020", 4.0),
        ];

        let (first, _) = transform_partition(&rows, process_date(), 1);
        let (second, _) = transform_partition(&rows, process_date(), 1);

        assert_eq!(first, second);
    }
}
