use crate::cli::args::{Cli, Commands};
use crate::error::Result;
use crate::ingest::{Granularity, IngestRunner};
use crate::models::Domain;
use crate::readers::StationReader;
use crate::store::Session;
use crate::utils::files::collect_domain_files;
use crate::writers::{ParquetReader, ParquetWriter, WebExporter};
use std::path::{Path, PathBuf};
use tracing::info;

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Build {
            data_dir,
            output_dir,
            domain,
            row_by_row,
            per_variable,
            overwrite,
            compression,
        } => build(
            &data_dir,
            &output_dir,
            domain,
            Granularity::from_flags(row_by_row, per_variable),
            overwrite,
            &compression,
        ),

        Commands::Export {
            parquet,
            domain,
            stations_file,
            output_dir,
            skip_annual,
            skip_monthly,
        } => export(
            &parquet,
            domain,
            &stations_file,
            &output_dir,
            skip_annual,
            skip_monthly,
        ),

        Commands::Info { file, sample } => show_info(&file, sample),
    }
}

fn build(
    data_dir: &Path,
    output_dir: &Path,
    domain: Option<Domain>,
    granularity: Granularity,
    overwrite: bool,
    compression: &str,
) -> Result<()> {
    let writer = ParquetWriter::new().with_compression(compression)?;
    let domains: Vec<Domain> = match domain {
        Some(d) => vec![d],
        None => Domain::all().to_vec(),
    };

    std::fs::create_dir_all(output_dir)?;
    let mut session = Session::new();
    let runner = IngestRunner::new(granularity, overwrite);

    for &domain in &domains {
        let parquet_path = output_dir.join(domain.parquet_file_name());
        session.ensure_table(&parquet_path, domain.table_name(), domain.variables())?;

        let files = collect_domain_files(data_dir, domain)?;
        let summary = runner.run(&mut session, domain.table_name(), &files)?;
        println!(
            "{}: {} rows after processing ({} inserted, {} batches skipped, {} files failed)",
            domain.table_name(),
            summary.final_rows,
            summary.rows_inserted,
            summary.batches_skipped,
            summary.files_failed
        );
    }

    // Persist only non-empty tables; empty bases are reported and left alone.
    for &domain in &domains {
        let table = session.table(domain.table_name())?;
        let parquet_path = output_dir.join(domain.parquet_file_name());
        if table.is_empty() {
            println!(
                "Table {} is empty, nothing was saved.",
                domain.table_name()
            );
            continue;
        }
        writer.write_table(table, &parquet_path)?;
        println!(
            "Saved {} ({} rows) to {}",
            domain.table_name(),
            table.row_count(),
            parquet_path.display()
        );
    }

    Ok(())
}

fn export(
    parquet: &Path,
    domain: Domain,
    stations_file: &Path,
    output_dir: &Path,
    skip_annual: bool,
    skip_monthly: bool,
) -> Result<()> {
    let table = ParquetReader::new().read_table(parquet, domain.table_name())?;
    if table.is_empty() {
        println!("Table {} holds no rows, export omitted.", domain.table_name());
        return Ok(());
    }

    let stations = StationReader::new().read_stations_map(stations_file)?;
    info!(stations = stations.len(), "loaded station metadata");

    let exporter = WebExporter::new()
        .with_annual(!skip_annual)
        .with_monthly(!skip_monthly);
    let summary = exporter.export(&table, domain, &stations, output_dir)?;

    println!(
        "Exported {} stations: {} yearly and {} monthly archives under {}",
        summary.stations,
        summary.annual_archives,
        summary.monthly_archives,
        output_dir.display()
    );
    Ok(())
}

fn show_info(file: &PathBuf, sample: usize) -> Result<()> {
    println!("Analyzing Parquet file: {}", file.display());

    let writer = ParquetWriter::new();
    let file_info = writer.file_info(file)?;
    println!("\n{}", file_info.summary());

    if sample > 0 {
        let table = ParquetReader::new().read_table(file, "sample")?;
        println!("\nSample rows (showing up to {}):", sample);
        for (i, row) in table.rows().iter().take(sample).enumerate() {
            let filled = row.values.iter().filter(|v| v.is_some()).count();
            println!(
                "{}. {} at {}: {}/{} measurements present",
                i + 1,
                row.acronym.as_deref().unwrap_or("?"),
                row.timestamp
                    .map(|ts| ts.to_string())
                    .unwrap_or_else(|| "<no timestamp>".to_string()),
                filled,
                table.measurement_columns().len()
            );
        }
    }

    Ok(())
}
