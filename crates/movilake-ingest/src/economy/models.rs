// Economy Data Models

/// One raw indicator row as pre-loaded into the bronze layer
///
/// The administrative fields are composite `"<code> <name...>"` strings; the
/// period is read as text whatever its stored type; the income total is
/// locale-formatted numeric text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEconomyRecord {
    pub municipality: String,
    pub district: String,
    pub section: String,
    pub indicator: String,
    pub period: String,
    pub total: String,
}

/// One aggregated income row
#[derive(Debug, Clone, PartialEq)]
pub struct SilverEconomyAggregate {
    pub municipality_code: String,
    pub district_code: String,
    pub section_code: String,
    pub year: i32,
    pub avg_income: f64,
}

/// Bronze row counts at increasing filter strictness
///
/// Diagnostic only; never gates the aggregate. By construction
/// `parseable_rows <= non_blank_rows <= total_rows`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EconomyDiagnostics {
    /// All bronze rows
    pub total_rows: usize,
    /// Rows whose income text is non-blank
    pub non_blank_rows: usize,
    /// Rows whose income text parses numerically
    pub parseable_rows: usize,
}
