pub mod table;

pub use table::{Column, ColumnKind, ColumnMapping, Row, Table};

use crate::error::{IngestError, Result};
use crate::writers::ParquetReader;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// The run's table catalog. Every component receives this handle explicitly;
/// there is no process-global connection, so tests construct their own
/// isolated session.
#[derive(Debug, Default)]
pub struct Session {
    tables: HashMap<String, Table>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create-if-absent: load the table verbatim from `path` when a backing
    /// Parquet file exists, otherwise create it empty with columns typed by
    /// name convention. Calling twice is a no-op.
    pub fn ensure_table(&mut self, path: &Path, name: &str, variables: &[&str]) -> Result<()> {
        if self.tables.contains_key(name) {
            return Ok(());
        }
        let table = if path.exists() {
            let table = ParquetReader::new().read_table(path, name)?;
            info!(
                table = name,
                rows = table.row_count(),
                "loaded existing table from {}",
                path.display()
            );
            table
        } else {
            Table::with_variables(name, variables)
        };
        self.tables.insert(name.to_string(), table);
        Ok(())
    }

    pub fn table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| IngestError::TableNotFound(name.to_string()))
    }

    pub fn table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| IngestError::TableNotFound(name.to_string()))
    }

    pub fn row_count(&self, name: &str) -> Result<usize> {
        Ok(self.table(name)?.row_count())
    }
}
