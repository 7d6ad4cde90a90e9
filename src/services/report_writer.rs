//! CSV output for collected reports

use chrono::{DateTime, SecondsFormat};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::io;
use std::path::Path;
use tracing::info;

use crate::error::OracleError;
use crate::models::report::Report;

/// Column order of the output file
pub const CSV_COLUMNS: [&str; 8] = [
    "query_id",
    "requested_timestamp",
    "timestamp_retrieved",
    "datetime",
    "if_retrieve",
    "value_hex",
    "value_length",
    "value_uint256",
];

/// One CSV row; field order is the column order
#[derive(Debug, Serialize)]
struct ReportRow {
    query_id: String,
    requested_timestamp: u64,
    timestamp_retrieved: u64,
    datetime: String,
    if_retrieve: bool,
    value_hex: String,
    value_length: usize,
    value_uint256: Option<String>,
}

impl From<&Report> for ReportRow {
    fn from(report: &Report) -> Self {
        Self {
            query_id: report.query_id.to_string(),
            requested_timestamp: report.requested_before,
            timestamp_retrieved: report.retrieved_at,
            datetime: iso_datetime(report.retrieved_at),
            if_retrieve: report.found,
            value_hex: report.value_hex(),
            value_length: report.value.len(),
            value_uint256: report.decoded_numeric.map(|d| d.to_string()),
        }
    }
}

/// UTC ISO-8601 rendering of a unix timestamp, empty if out of range
pub fn iso_datetime(unix_secs: u64) -> String {
    i64::try_from(unix_secs)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}

/// Write reports to `path`, replacing any existing file.
///
/// Returns the number of rows written. With no reports nothing is
/// written and the file is left untouched.
pub fn write_reports(reports: &[Report], path: impl AsRef<Path>) -> Result<usize, OracleError> {
    let path = path.as_ref();

    if reports.is_empty() {
        info!("No reports to save");
        return Ok(0);
    }

    let file = File::create(path).map_err(|e| {
        OracleError::Output(format!("Failed to create {}: {}", path.display(), e))
    })?;

    let written = write_to(reports, file)?;
    info!(count = written, path = %path.display(), "Saved reports");
    Ok(written)
}

/// Write header and rows to any writer
pub fn write_to<W: io::Write>(reports: &[Report], out: W) -> Result<usize, OracleError> {
    let mut writer = Writer::from_writer(out);

    for report in reports {
        writer
            .serialize(ReportRow::from(report))
            .map_err(|e| OracleError::Output(format!("Failed to write CSV row: {}", e)))?;
    }

    writer
        .flush()
        .map_err(|e| OracleError::Output(format!("Failed to flush CSV: {}", e)))?;

    Ok(reports.len())
}
