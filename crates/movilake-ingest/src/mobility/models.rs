// Mobility Data Models

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Probing
// ============================================================================

/// Outcome of a single archive existence check
///
/// `Absent` and `CheckFailed` are kept apart internally so callers can tell a
/// confirmed 404 from a timeout or transport error; both collapse to
/// `has_data = false` at the persistence boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The archive answered 200 OK
    Present,
    /// The archive answered with any non-OK status
    Absent,
    /// The check itself failed (network error or timeout)
    CheckFailed,
}

impl ProbeOutcome {
    /// Collapse to the persisted boolean flag
    pub fn has_data(self) -> bool {
        matches!(self, ProbeOutcome::Present)
    }
}

/// Probe result for one calendar date
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateProbe {
    pub date: NaiveDate,
    pub url: String,
    pub outcome: ProbeOutcome,
}

/// One row of the date-completeness calendar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateAvailability {
    pub date: NaiveDate,
    pub has_data: bool,
    pub observed_at: DateTime<Utc>,
}

// ============================================================================
// Bronze layer
// ============================================================================

/// One raw trip row exactly as published in a daily file
///
/// Field names match the source column headers; `ingestion_date` is added at
/// load time by the storage layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawTripRecord {
    /// Trip date as published, `%Y%m%d`
    pub date: String,
    /// Hour of day, `0`-`23` (zero-padded in some files)
    pub hour_period: String,
    pub origin_zone: String,
    pub destination_zone: String,
    pub trips: f64,
}

// ============================================================================
// Silver layer
// ============================================================================

/// One cleaned, aggregated trip row
#[derive(Debug, Clone, PartialEq)]
pub struct SilverTripAggregate {
    pub trip_timestamp: NaiveDateTime,
    pub origin_zone_id: String,
    pub destination_zone_id: String,
    pub total_trips: f64,
    pub analysis_id: i32,
}

// ============================================================================
// Helpers
// ============================================================================

/// All dates from `start` through `end`, inclusive, ascending
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = start;

    while current <= end {
        dates.push(current);
        current += Duration::days(1);
    }

    dates
}
