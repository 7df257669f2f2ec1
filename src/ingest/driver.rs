use crate::error::Result;
use crate::ingest::upsert::{Granularity, UpsertOutcome, Upserter};
use crate::readers::CsvNormalizer;
use crate::store::Session;
use crate::utils::ProgressReporter;
use std::path::PathBuf;
use tracing::{error, info};

/// Aggregate counts for one driver run over a file list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub files_total: usize,
    pub files_failed: usize,
    pub batches_skipped: usize,
    pub rows_inserted: usize,
    pub final_rows: usize,
}

/// Sequences the upsert engine over a file list for one table. Processing is
/// strictly sequential: each file is fully parsed, normalized and upserted
/// before the next begins, and a failing file never aborts the run.
pub struct IngestRunner {
    normalizer: CsvNormalizer,
    upserter: Upserter,
    silent: bool,
}

impl IngestRunner {
    pub fn new(granularity: Granularity, overwrite: bool) -> Self {
        Self {
            normalizer: CsvNormalizer::new(),
            upserter: Upserter::new(granularity, overwrite),
            silent: false,
        }
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    pub fn run(
        &self,
        session: &mut Session,
        table_name: &str,
        files: &[PathBuf],
    ) -> Result<RunSummary> {
        info!(
            table = table_name,
            files = files.len(),
            "processing files"
        );

        let progress = ProgressReporter::new(
            files.len() as u64,
            &format!("Ingesting into {}", table_name),
            self.silent,
        );

        let mut summary = RunSummary {
            files_total: files.len(),
            ..RunSummary::default()
        };

        for file in files {
            let table = session.table_mut(table_name)?;
            match self.normalizer.normalize(file, table) {
                Ok(batch) => match self.upserter.upsert(table, &batch) {
                    Ok(UpsertOutcome::Inserted(n)) => summary.rows_inserted += n,
                    Ok(UpsertOutcome::SkippedExisting) => summary.batches_skipped += 1,
                    Err(e) => {
                        error!(file = %file.display(), "upsert failed: {}", e);
                        summary.files_failed += 1;
                    }
                },
                Err(e) => {
                    error!(file = %file.display(), "error processing file: {}", e);
                    summary.files_failed += 1;
                }
            }
            progress.increment(1);
        }

        summary.final_rows = session.row_count(table_name)?;
        progress.finish_with_message(&format!(
            "{}: {} rows after processing",
            table_name, summary.final_rows
        ));
        info!(
            table = table_name,
            final_rows = summary.final_rows,
            inserted = summary.rows_inserted,
            failed = summary.files_failed,
            "run finished"
        );

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;

    const VARIABLES: &[&str] = &["acronym", "timestamp", "year", "day", "min", "glo_avg"];

    fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        write!(file, "{}", content).unwrap();
        path
    }

    fn session_with_table() -> Session {
        let mut session = Session::new();
        session
            .ensure_table(Path::new("/nonexistent.parquet"), "base_test", VARIABLES)
            .unwrap();
        session
    }

    #[test]
    fn test_run_aggregates_counts() {
        let temp_dir = TempDir::new().unwrap();
        let good = write_file(
            temp_dir.path(),
            "A_20200101.csv",
            "acronym,timestamp,year,day,min,glo_avg\n\
             ,,,,,W/m2\n\
             A1,2020-01-01 00:00:00,2020,1,0,1.0\n\
             A1,2020-01-01 00:10:00,2020,1,10,2.0\n\
             A1,2020-01-01 00:30:00,2020,1,30,3.0\n",
        );
        let bad = write_file(
            temp_dir.path(),
            "broken.csv",
            "station,timestamp,year,day,min,glo_avg\n\
             ,,,,,\n\
             A1,2020-01-01 00:00:00,2020,1,0,1.0\n",
        );

        let mut session = session_with_table();
        let runner = IngestRunner::new(Granularity::Bulk, false).with_silent(true);
        let summary = runner
            .run(&mut session, "base_test", &[good.clone(), bad])
            .unwrap();

        assert_eq!(summary.files_total, 2);
        assert_eq!(summary.files_failed, 1);
        assert_eq!(summary.rows_inserted, 3);
        assert_eq!(summary.final_rows, 3);

        // A second pass over the same file is fully skipped.
        let summary = runner.run(&mut session, "base_test", &[good]).unwrap();
        assert_eq!(summary.batches_skipped, 1);
        assert_eq!(summary.final_rows, 3);
    }

    #[test]
    fn test_unknown_table_fails() {
        let mut session = Session::new();
        let runner = IngestRunner::new(Granularity::Bulk, false).with_silent(true);
        assert!(runner.run(&mut session, "missing", &[]).is_err());
    }
}
