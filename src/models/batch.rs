use chrono::NaiveDateTime;

/// Inclusive time window covered by one source file.
pub type TimeRange = (NaiveDateTime, NaiveDateTime);

/// One normalized row from a source CSV file. Metadata fields that failed to
/// parse are carried as missing rather than dropping the row; measurement
/// values are aligned with the owning batch's `columns` list.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceRow {
    pub timestamp: Option<NaiveDateTime>,
    pub year: Option<i32>,
    pub day: Option<i32>,
    pub min: Option<i32>,
    pub values: Vec<Option<f32>>,
}

/// The normalized contents of one source CSV file: a single station's
/// readings for a contiguous time range. Created per file and discarded
/// after the insertion attempt.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub station: String,
    pub time_range: TimeRange,
    /// Measurement columns accepted for insertion (already restricted to the
    /// destination table's column set).
    pub columns: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceBatch {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
