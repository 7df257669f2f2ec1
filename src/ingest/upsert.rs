use crate::error::Result;
use crate::models::SourceBatch;
use crate::store::Table;
use tracing::{error, info};

/// Unit of atomicity for insert decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    /// Whole batch at once, guarded by a batch-level overlap pre-check.
    Bulk,
    /// One insert per source row, with a per-row existence check.
    Row,
    /// One insert per source row per measurement column.
    RowVariable,
}

impl Granularity {
    /// Map the configuration surface (`linha_linha`, `var_var`) onto a
    /// granularity. Per-variable mode is only meaningful with row mode on.
    pub fn from_flags(row_by_row: bool, per_variable: bool) -> Self {
        match (row_by_row, per_variable) {
            (true, true) => Granularity::RowVariable,
            (true, false) => Granularity::Row,
            (false, _) => Granularity::Bulk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Number of rows actually inserted (zero is possible in row modes when
    /// every unit already existed).
    Inserted(usize),
    /// Bulk pre-check found overlapping data and the whole batch was skipped.
    SkippedExisting,
}

impl UpsertOutcome {
    pub fn inserted(&self) -> usize {
        match self {
            UpsertOutcome::Inserted(n) => *n,
            UpsertOutcome::SkippedExisting => 0,
        }
    }
}

/// Decides, per configured granularity and overwrite flag, whether each unit
/// of a normalized batch is appended, skipped, or replaces existing data.
pub struct Upserter {
    granularity: Granularity,
    overwrite: bool,
}

impl Upserter {
    pub fn new(granularity: Granularity, overwrite: bool) -> Self {
        Self {
            granularity,
            overwrite,
        }
    }

    pub fn upsert(&self, table: &mut Table, batch: &SourceBatch) -> Result<UpsertOutcome> {
        // Overwrite removes the station's prior rows in the batch window
        // outright; nothing is merged.
        if self.overwrite {
            let removed = table.delete_range(&batch.station, batch.time_range);
            if removed > 0 {
                info!(
                    table = table.name(),
                    station = %batch.station,
                    removed,
                    "overwrite removed existing rows"
                );
            }
        }

        match self.granularity {
            Granularity::Bulk => self.upsert_bulk(table, batch),
            Granularity::Row => self.upsert_rows(table, batch),
            Granularity::RowVariable => self.upsert_row_variables(table, batch),
        }
    }

    /// Bulk mode checks overlap at batch granularity: any existing row in the
    /// batch's (station, time range) skips the entire batch, even when only
    /// part of the range overlaps. Coarser than row mode on purpose.
    fn upsert_bulk(&self, table: &mut Table, batch: &SourceBatch) -> Result<UpsertOutcome> {
        if !self.overwrite && table.count_in_range(&batch.station, batch.time_range) > 0 {
            info!(
                table = table.name(),
                station = %batch.station,
                "data already exists for period {} to {}; use overwrite to replace",
                batch.time_range.0,
                batch.time_range.1
            );
            return Ok(UpsertOutcome::SkippedExisting);
        }

        let mut inserted = 0;
        for row in &batch.rows {
            match table.insert_row(&batch.station, row, &batch.columns) {
                Ok(()) => inserted += 1,
                Err(e) => error!(table = table.name(), "row insert failed: {}", e),
            }
        }
        info!(
            table = table.name(),
            station = %batch.station,
            inserted,
            "inserted batch"
        );
        Ok(UpsertOutcome::Inserted(inserted))
    }

    fn upsert_rows(&self, table: &mut Table, batch: &SourceBatch) -> Result<UpsertOutcome> {
        let mut inserted = 0;
        for row in &batch.rows {
            // A row whose timestamp failed to parse has no key; it is
            // inserted rather than deduplicated.
            let exists = !self.overwrite
                && row
                    .timestamp
                    .is_some_and(|ts| table.contains_row(&batch.station, ts));
            if exists {
                continue;
            }
            match table.insert_row(&batch.station, row, &batch.columns) {
                Ok(()) => inserted += 1,
                Err(e) => error!(table = table.name(), "row insert failed: {}", e),
            }
        }
        info!(
            table = table.name(),
            station = %batch.station,
            inserted,
            skipped = batch.len() - inserted,
            "row-level upsert finished"
        );
        Ok(UpsertOutcome::Inserted(inserted))
    }

    fn upsert_row_variables(&self, table: &mut Table, batch: &SourceBatch) -> Result<UpsertOutcome> {
        let mut inserted = 0;
        for row in &batch.rows {
            for (pos, variable) in batch.columns.iter().enumerate() {
                // The cell key extends the row key with the variable's value;
                // a missing value never matches an existing cell.
                let exists = !self.overwrite
                    && row.timestamp.is_some_and(|ts| {
                        row.values[pos]
                            .is_some_and(|v| table.contains_cell(&batch.station, ts, variable, v))
                    });
                if exists {
                    continue;
                }
                match table.insert_row_variable(&batch.station, row, &batch.columns, variable) {
                    Ok(()) => inserted += 1,
                    Err(e) => {
                        error!(
                            table = table.name(),
                            variable = %variable,
                            "variable insert failed: {}",
                            e
                        )
                    }
                }
            }
        }
        info!(
            table = table.name(),
            station = %batch.station,
            inserted,
            "variable-level upsert finished"
        );
        Ok(UpsertOutcome::Inserted(inserted))
    }
}
