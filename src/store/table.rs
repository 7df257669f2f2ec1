use crate::error::{IngestError, Result};
use crate::models::{SourceRow, TimeRange};
use chrono::NaiveDateTime;
use std::collections::HashMap;

/// Column type, assigned by name convention when a table is created from a
/// variable list and inferred from the file schema when loaded from Parquet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    Timestamp,
    Integer,
    Float,
}

impl ColumnKind {
    /// Name convention used when creating a fresh table: `acronym` is text,
    /// `timestamp` is a date-time, `year`/`day`/`min` are integers and every
    /// other column is a floating-point measurement.
    pub fn from_column_name(name: &str) -> Self {
        match name {
            "acronym" => ColumnKind::Text,
            "timestamp" => ColumnKind::Timestamp,
            "year" | "day" | "min" => ColumnKind::Integer,
            _ => ColumnKind::Float,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// One stored reading. Measurement values are positionally aligned with the
/// owning table's measurement column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub acronym: Option<String>,
    pub timestamp: Option<NaiveDateTime>,
    pub year: Option<i32>,
    pub day: Option<i32>,
    pub min: Option<i32>,
    pub values: Vec<Option<f32>>,
}

/// Result of matching a file's column set against the table schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMapping {
    pub accepted: Vec<String>,
    pub dropped: Vec<String>,
}

/// A named tabular store with a schema fixed at creation. Maintains a
/// (station, timestamp) key index kept in step with every insert and delete,
/// so existence checks are set lookups with the same inclusion/exclusion
/// semantics as a per-unit query against the rows.
#[derive(Debug, Clone)]
pub struct Table {
    name: String,
    columns: Vec<Column>,
    measurement_columns: Vec<String>,
    rows: Vec<Row>,
    key_index: HashMap<(String, i64), Vec<usize>>,
}

impl Table {
    /// Create an empty table with one column per entry in `variables`, typed
    /// by name convention.
    pub fn with_variables(name: &str, variables: &[&str]) -> Self {
        let columns: Vec<Column> = variables
            .iter()
            .map(|v| Column {
                name: v.to_string(),
                kind: ColumnKind::from_column_name(v),
            })
            .collect();
        Self::with_columns(name, columns)
    }

    /// Create an empty table from an explicit column set (used when loading
    /// a schema inferred from a Parquet file).
    pub fn with_columns(name: &str, columns: Vec<Column>) -> Self {
        let measurement_columns = columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Float)
            .map(|c| c.name.clone())
            .collect();
        Self {
            name: name.to_string(),
            columns,
            measurement_columns,
            rows: Vec::new(),
            key_index: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Measurement (floating-point) columns in schema order.
    pub fn measurement_columns(&self) -> &[String] {
        &self.measurement_columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Split a file's column set into the part the table accepts and the
    /// part it silently drops. Order of `accepted` follows the file.
    pub fn map_columns(&self, file_columns: &[String]) -> ColumnMapping {
        let mut accepted = Vec::new();
        let mut dropped = Vec::new();
        for col in file_columns {
            if self.columns.iter().any(|c| &c.name == col) {
                accepted.push(col.clone());
            } else {
                dropped.push(col.clone());
            }
        }
        ColumnMapping { accepted, dropped }
    }

    fn measurement_index(&self, name: &str) -> Option<usize> {
        self.measurement_columns.iter().position(|c| c == name)
    }

    /// Value of a measurement column in a stored row, by column name.
    pub fn measurement_value(&self, row: &Row, name: &str) -> Option<f32> {
        self.measurement_index(name)
            .and_then(|i| row.values.get(i).copied().flatten())
    }

    fn key_of(station: &str, timestamp: NaiveDateTime) -> (String, i64) {
        (station.to_string(), timestamp.and_utc().timestamp_micros())
    }

    /// Whether a row with this (station, timestamp) key already exists.
    pub fn contains_row(&self, station: &str, timestamp: NaiveDateTime) -> bool {
        self.key_index
            .contains_key(&Self::key_of(station, timestamp))
    }

    /// Whether a row exists with this (station, timestamp) key whose `variable`
    /// column holds exactly `value`. A missing stored value never matches.
    pub fn contains_cell(
        &self,
        station: &str,
        timestamp: NaiveDateTime,
        variable: &str,
        value: f32,
    ) -> bool {
        let Some(indices) = self.key_index.get(&Self::key_of(station, timestamp)) else {
            return false;
        };
        indices
            .iter()
            .filter_map(|&i| self.measurement_value(&self.rows[i], variable))
            .any(|stored| stored == value)
    }

    /// Count rows matching `station` with a timestamp inside `range`
    /// (inclusive bounds). Rows without a timestamp never match.
    pub fn count_in_range(&self, station: &str, range: TimeRange) -> usize {
        self.rows
            .iter()
            .filter(|r| {
                r.acronym.as_deref() == Some(station)
                    && r.timestamp
                        .is_some_and(|ts| ts >= range.0 && ts <= range.1)
            })
            .count()
    }

    /// Delete all rows matching `station` inside `range` (inclusive bounds),
    /// returning how many were removed.
    pub fn delete_range(&mut self, station: &str, range: TimeRange) -> usize {
        let before = self.rows.len();
        self.rows.retain(|r| {
            !(r.acronym.as_deref() == Some(station)
                && r.timestamp
                    .is_some_and(|ts| ts >= range.0 && ts <= range.1))
        });
        let removed = before - self.rows.len();
        if removed > 0 {
            self.rebuild_index();
        }
        removed
    }

    fn rebuild_index(&mut self) {
        self.key_index.clear();
        for i in 0..self.rows.len() {
            self.index_row(i);
        }
    }

    fn index_row(&mut self, i: usize) {
        let row = &self.rows[i];
        if let (Some(station), Some(ts)) = (&row.acronym, row.timestamp) {
            self.key_index
                .entry(Self::key_of(station, ts))
                .or_default()
                .push(i);
        }
    }

    fn push_row(&mut self, row: Row) {
        self.rows.push(row);
        self.index_row(self.rows.len() - 1);
    }

    /// Append a raw row, e.g. when rebuilding a table from its Parquet file.
    /// The value vector must match the measurement column count.
    pub fn append_row(&mut self, row: Row) -> Result<()> {
        if row.values.len() != self.measurement_columns.len() {
            return Err(IngestError::InvalidFormat(format!(
                "row carries {} measurement values, table {} has {} measurement columns",
                row.values.len(),
                self.name,
                self.measurement_columns.len()
            )));
        }
        self.push_row(row);
        Ok(())
    }

    /// Insert one normalized source row. `columns` names the measurement
    /// columns the row's values are aligned with; columns the table does not
    /// know are an error (the caller restricts to the intersection first).
    pub fn insert_row(&mut self, station: &str, row: &SourceRow, columns: &[String]) -> Result<()> {
        let mut values = vec![None; self.measurement_columns.len()];
        for (col, value) in columns.iter().zip(&row.values) {
            let slot = self.measurement_index(col).ok_or_else(|| {
                IngestError::InvalidFormat(format!(
                    "column {} not present in table {}",
                    col, self.name
                ))
            })?;
            values[slot] = *value;
        }
        self.push_row(Row {
            acronym: Some(station.to_string()),
            timestamp: row.timestamp,
            year: row.year,
            day: row.day,
            min: row.min,
            values,
        });
        Ok(())
    }

    /// Insert the metadata columns plus a single measurement variable of a
    /// source row, leaving every other measurement column missing.
    pub fn insert_row_variable(
        &mut self,
        station: &str,
        row: &SourceRow,
        columns: &[String],
        variable: &str,
    ) -> Result<()> {
        let source_pos = columns.iter().position(|c| c == variable).ok_or_else(|| {
            IngestError::InvalidFormat(format!("variable {} not present in source batch", variable))
        })?;
        let slot = self.measurement_index(variable).ok_or_else(|| {
            IngestError::InvalidFormat(format!(
                "column {} not present in table {}",
                variable, self.name
            ))
        })?;
        let mut values = vec![None; self.measurement_columns.len()];
        values[slot] = row.values[source_pos];
        self.push_row(Row {
            acronym: Some(station.to_string()),
            timestamp: row.timestamp,
            year: row.year,
            day: row.day,
            min: row.min,
            values,
        });
        Ok(())
    }

    /// Distinct stations present in the table, sorted.
    pub fn stations(&self) -> Vec<String> {
        let mut stations: Vec<String> = self
            .rows
            .iter()
            .filter_map(|r| r.acronym.clone())
            .collect();
        stations.sort();
        stations.dedup();
        stations
    }

    /// Rows for one station ordered by timestamp (missing timestamps first).
    pub fn rows_for_station(&self, station: &str) -> Vec<&Row> {
        let mut rows: Vec<&Row> = self
            .rows
            .iter()
            .filter(|r| r.acronym.as_deref() == Some(station))
            .collect();
        rows.sort_by_key(|r| r.timestamp);
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn sample_table() -> Table {
        Table::with_variables(
            "base_test",
            &["acronym", "timestamp", "year", "day", "min", "glo_avg", "dif_avg"],
        )
    }

    fn sample_row(hour: u32, minute: u32, glo: f32) -> SourceRow {
        SourceRow {
            timestamp: Some(ts(hour, minute)),
            year: Some(2020),
            day: Some(1),
            min: Some((hour * 60 + minute) as i32),
            values: vec![Some(glo)],
        }
    }

    #[test]
    fn test_column_kinds_by_convention() {
        let table = sample_table();
        let kinds: Vec<ColumnKind> = table.columns().iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ColumnKind::Text,
                ColumnKind::Timestamp,
                ColumnKind::Integer,
                ColumnKind::Integer,
                ColumnKind::Integer,
                ColumnKind::Float,
                ColumnKind::Float,
            ]
        );
        assert_eq!(table.measurement_columns(), &["glo_avg", "dif_avg"]);
    }

    #[test]
    fn test_map_columns_reports_dropped() {
        let table = sample_table();
        let mapping = table.map_columns(&[
            "glo_avg".to_string(),
            "unknown_var".to_string(),
            "dif_avg".to_string(),
        ]);
        assert_eq!(mapping.accepted, vec!["glo_avg", "dif_avg"]);
        assert_eq!(mapping.dropped, vec!["unknown_var"]);
    }

    #[test]
    fn test_insert_and_key_lookup() {
        let mut table = sample_table();
        let columns = vec!["glo_avg".to_string()];
        table
            .insert_row("A1", &sample_row(0, 0, 100.0), &columns)
            .unwrap();

        assert_eq!(table.row_count(), 1);
        assert!(table.contains_row("A1", ts(0, 0)));
        assert!(!table.contains_row("A1", ts(0, 10)));
        assert!(!table.contains_row("B2", ts(0, 0)));
    }

    #[test]
    fn test_contains_cell_matches_on_value() {
        let mut table = sample_table();
        let columns = vec!["glo_avg".to_string()];
        table
            .insert_row("A1", &sample_row(0, 0, 100.0), &columns)
            .unwrap();

        assert!(table.contains_cell("A1", ts(0, 0), "glo_avg", 100.0));
        assert!(!table.contains_cell("A1", ts(0, 0), "glo_avg", 101.0));
        // dif_avg was never supplied, so a missing value matches nothing
        assert!(!table.contains_cell("A1", ts(0, 0), "dif_avg", 0.0));
    }

    #[test]
    fn test_delete_range_inclusive_bounds() {
        let mut table = sample_table();
        let columns = vec!["glo_avg".to_string()];
        for minute in [0, 10, 20, 30] {
            table
                .insert_row("A1", &sample_row(0, minute, minute as f32), &columns)
                .unwrap();
        }
        table
            .insert_row("B2", &sample_row(0, 10, 5.0), &columns)
            .unwrap();

        let removed = table.delete_range("A1", (ts(0, 10), ts(0, 20)));
        assert_eq!(removed, 2);
        assert_eq!(table.row_count(), 3);
        assert!(table.contains_row("A1", ts(0, 0)));
        assert!(!table.contains_row("A1", ts(0, 10)));
        assert!(table.contains_row("B2", ts(0, 10)));
    }

    #[test]
    fn test_count_in_range_ignores_other_stations() {
        let mut table = sample_table();
        let columns = vec!["glo_avg".to_string()];
        table
            .insert_row("A1", &sample_row(0, 0, 1.0), &columns)
            .unwrap();
        table
            .insert_row("B2", &sample_row(0, 0, 2.0), &columns)
            .unwrap();

        assert_eq!(table.count_in_range("A1", (ts(0, 0), ts(0, 30))), 1);
        assert_eq!(table.count_in_range("C3", (ts(0, 0), ts(0, 30))), 0);
    }

    #[test]
    fn test_insert_row_variable_leaves_other_columns_missing() {
        let mut table = sample_table();
        let columns = vec!["glo_avg".to_string(), "dif_avg".to_string()];
        let row = SourceRow {
            timestamp: Some(ts(0, 0)),
            year: Some(2020),
            day: Some(1),
            min: Some(0),
            values: vec![Some(100.0), Some(40.0)],
        };
        table
            .insert_row_variable("A1", &row, &columns, "dif_avg")
            .unwrap();

        assert_eq!(table.row_count(), 1);
        let stored = &table.rows()[0];
        assert_eq!(table.measurement_value(stored, "dif_avg"), Some(40.0));
        assert_eq!(table.measurement_value(stored, "glo_avg"), None);
    }

    #[test]
    fn test_unknown_column_is_an_insert_error() {
        let mut table = sample_table();
        let row = sample_row(0, 0, 1.0);
        let result = table.insert_row("A1", &row, &["bogus".to_string()]);
        assert!(result.is_err());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_stations_sorted_distinct() {
        let mut table = sample_table();
        let columns = vec!["glo_avg".to_string()];
        table
            .insert_row("B2", &sample_row(0, 0, 1.0), &columns)
            .unwrap();
        table
            .insert_row("A1", &sample_row(0, 0, 1.0), &columns)
            .unwrap();
        table
            .insert_row("A1", &sample_row(0, 10, 1.0), &columns)
            .unwrap();
        assert_eq!(table.stations(), vec!["A1", "B2"]);
    }
}
