use crate::error::{IngestError, Result};
use crate::models::{SourceBatch, SourceRow};
use crate::store::Table;
use crate::utils::constants::{METADATA_COLUMN_COUNT, TIMESTAMP_FORMATS};
use chrono::NaiveDateTime;
use std::path::Path;
use tracing::{debug, warn};

/// Parses one sensor CSV into a normalized single-station batch.
///
/// Layout: five fixed metadata columns (acronym, timestamp, year, day, min)
/// followed by measurement columns; the second line of the file is a units
/// row and is discarded.
pub struct CsvNormalizer;

impl CsvNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize `path` against the destination `table`. Measurement columns
    /// the table does not know are silently dropped (logged at debug level);
    /// a file without a usable `acronym` column or without a single
    /// parseable timestamp is rejected.
    pub fn normalize(&self, path: &Path, table: &Table) -> Result<SourceBatch> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
        if headers.len() < METADATA_COLUMN_COUNT {
            return Err(IngestError::InvalidFormat(format!(
                "{} has {} columns, expected at least {} metadata columns",
                path.display(),
                headers.len(),
                METADATA_COLUMN_COUNT
            )));
        }

        let acronym_idx = headers
            .iter()
            .position(|h| h == "acronym")
            .ok_or_else(|| IngestError::MissingStation {
                path: path.display().to_string(),
            })?;
        let timestamp_idx = headers.iter().position(|h| h == "timestamp").unwrap_or(1);
        let year_idx = headers.iter().position(|h| h == "year").unwrap_or(2);
        let day_idx = headers.iter().position(|h| h == "day").unwrap_or(3);
        let min_idx = headers.iter().position(|h| h == "min").unwrap_or(4);

        let measurement_headers: Vec<String> = headers
            .iter()
            .skip(METADATA_COLUMN_COUNT)
            .cloned()
            .collect();
        let mapping = table.map_columns(&measurement_headers);
        if !mapping.dropped.is_empty() {
            debug!(
                file = %path.display(),
                dropped = ?mapping.dropped,
                "dropping columns not present in table {}",
                table.name()
            );
        }
        let accepted_positions: Vec<usize> = measurement_headers
            .iter()
            .enumerate()
            .filter(|(_, h)| mapping.accepted.contains(*h))
            .map(|(i, _)| i + METADATA_COLUMN_COUNT)
            .collect();

        let mut rows = Vec::new();
        let mut station: Option<String> = None;
        let mut invalid_timestamps = 0usize;

        for (record_idx, record_result) in reader.records().enumerate() {
            let record = record_result?;
            // The second file line carries units, not data.
            if record_idx == 0 {
                continue;
            }

            let acronym = record.get(acronym_idx).filter(|v| !v.is_empty());
            if station.is_none() {
                station = acronym.map(|v| v.to_string());
            }

            let timestamp = record.get(timestamp_idx).and_then(parse_timestamp);
            if timestamp.is_none() {
                invalid_timestamps += 1;
            }

            let values = accepted_positions
                .iter()
                .map(|&i| record.get(i).and_then(normalize_measurement))
                .collect();

            rows.push(SourceRow {
                timestamp,
                year: record.get(year_idx).and_then(|v| v.parse().ok()),
                day: record.get(day_idx).and_then(|v| v.parse().ok()),
                min: record.get(min_idx).and_then(|v| v.parse().ok()),
                values,
            });
        }

        if invalid_timestamps > 0 {
            warn!(
                file = %path.display(),
                count = invalid_timestamps,
                "invalid timestamps found"
            );
        }

        let station = station.ok_or_else(|| IngestError::MissingStation {
            path: path.display().to_string(),
        })?;

        let timestamps: Vec<NaiveDateTime> = rows.iter().filter_map(|r| r.timestamp).collect();
        let (Some(&start), Some(&end)) = (timestamps.iter().min(), timestamps.iter().max()) else {
            return Err(IngestError::InvalidFormat(format!(
                "{} has no parseable timestamps",
                path.display()
            )));
        };

        Ok(SourceBatch {
            station,
            time_range: (start, end),
            columns: mapping.accepted,
            rows,
        })
    }
}

impl Default for CsvNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
}

/// Measurement cell policy: comma decimal separators become periods, a
/// digits-plus-dash sensor error sentinel becomes literal zero, and anything
/// still non-numeric becomes missing.
fn normalize_measurement(raw: &str) -> Option<f32> {
    let token = raw.trim();
    if token.is_empty() {
        return None;
    }
    let token = token.replace(',', ".");
    if is_error_sentinel(&token) {
        return Some(0.0);
    }
    token.parse().ok()
}

fn is_error_sentinel(token: &str) -> bool {
    token.len() >= 2
        && token.ends_with('-')
        && token[..token.len() - 1].chars().all(|c| c.is_ascii_digit())
}
