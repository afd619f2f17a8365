//! Income normalization and aggregation
//!
//! Pure transformation from raw indicator rows to the aggregated income
//! table: code extraction from composite fields, year extraction from the
//! period text, locale-aware numeric normalization, and arithmetic mean per
//! `(municipality, district, section, year)` key.

use std::collections::BTreeMap;

use super::models::{EconomyDiagnostics, RawEconomyRecord, SilverEconomyAggregate};

/// Rows dropped during aggregation, by reason
///
/// Dropping is policy (unparseable source rows never reach the silver layer);
/// these counters keep the policy observable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionStats {
    /// Income text was blank
    pub blank_income: usize,
    /// Income text did not normalize into a number
    pub unparseable_income: usize,
    /// Period text did not yield a four-digit year
    pub unparseable_year: usize,
}

/// Code part of a composite `"<code> <name...>"` field
///
/// `"08019 Barcelona"` -> `"08019"`.
pub fn extract_code(field: &str) -> String {
    field
        .trim()
        .split(' ')
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Year from the period field, whatever its stored representation
///
/// The period column may be an integer or text; both arrive here as text and
/// the final four characters are taken as the year.
pub fn extract_year(period: &str) -> Option<i32> {
    let trimmed = period.trim();
    let chars: Vec<char> = trimmed.chars().collect();

    if chars.len() < 4 {
        return None;
    }

    let tail: String = chars[chars.len() - 4..].iter().collect();
    tail.parse().ok()
}

/// Normalize locale-formatted income text into a number
///
/// `.` is a thousands separator, `,` the decimal separator:
/// `"1.234,56"` -> `1234.56`. Blank or non-numeric text yields `None`.
pub fn normalize_income(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();

    if trimmed.is_empty() {
        return None;
    }

    trimmed.replace('.', "").replace(',', ".").parse().ok()
}

/// Bronze row counts at increasing filter strictness
pub fn diagnostics(rows: &[RawEconomyRecord]) -> EconomyDiagnostics {
    EconomyDiagnostics {
        total_rows: rows.len(),
        non_blank_rows: rows.iter().filter(|r| !r.total.trim().is_empty()).count(),
        parseable_rows: rows.iter().filter(|r| normalize_income(&r.total).is_some()).count(),
    }
}

/// Aggregate surviving rows into mean income per grouping key
///
/// Rows whose income or year does not parse are dropped and counted. Output
/// order is deterministic (key-ascending), so re-runs over unchanged input
/// produce an identical table.
pub fn aggregate_income(
    rows: &[RawEconomyRecord],
) -> (Vec<SilverEconomyAggregate>, RejectionStats) {
    let mut stats = RejectionStats::default();
    let mut groups: BTreeMap<(String, String, String, i32), (f64, usize)> = BTreeMap::new();

    for row in rows {
        let income = match normalize_income(&row.total) {
            Some(value) => value,
            None => {
                if row.total.trim().is_empty() {
                    stats.blank_income += 1;
                } else {
                    stats.unparseable_income += 1;
                }
                continue;
            },
        };

        let Some(year) = extract_year(&row.period) else {
            stats.unparseable_year += 1;
            continue;
        };

        let key = (
            extract_code(&row.municipality),
            extract_code(&row.district),
            extract_code(&row.section),
            year,
        );

        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += income;
        entry.1 += 1;
    }

    let aggregates: Vec<SilverEconomyAggregate> = groups
        .into_iter()
        .map(|((municipality_code, district_code, section_code, year), (sum, count))| {
            SilverEconomyAggregate {
                municipality_code,
                district_code,
                section_code,
                year,
                avg_income: sum / count as f64,
            }
        })
        .collect();

    (aggregates, stats)
}

// ============================================================================
// Tests
// ============================================================================
