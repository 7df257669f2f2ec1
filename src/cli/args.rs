use crate::models::Domain;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sonda-processor")]
#[command(about = "SONDA sensor data ingestion and web archive export")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true, help = "Enable verbose logging")]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest sensor CSV files into the per-domain Parquet bases
    Build {
        #[arg(short, long, help = "Root of the formatted sensor CSV tree")]
        data_dir: PathBuf,

        #[arg(
            short,
            long,
            default_value = "output",
            help = "Directory holding the per-domain Parquet files"
        )]
        output_dir: PathBuf,

        #[arg(long, value_enum, help = "Restrict the run to a single domain")]
        domain: Option<Domain>,

        #[arg(long, help = "Insert row by row instead of whole batches")]
        row_by_row: bool,

        #[arg(
            long,
            help = "Insert variable by variable (only meaningful with --row-by-row)"
        )]
        per_variable: bool,

        #[arg(
            long,
            help = "Replace existing data in each file's station/time range"
        )]
        overwrite: bool,

        #[arg(short, long, default_value = "snappy")]
        compression: String,
    },

    /// Export per-station yearly/monthly web archives from a Parquet base
    Export {
        #[arg(short, long, help = "Parquet base to export from")]
        parquet: PathBuf,

        #[arg(short, long, value_enum)]
        domain: Domain,

        #[arg(short, long, help = "Station metadata CSV (Tabela-estacao layout)")]
        stations_file: PathBuf,

        #[arg(short, long, default_value = "output_web")]
        output_dir: PathBuf,

        #[arg(long, help = "Skip the yearly archives")]
        skip_annual: bool,

        #[arg(long, help = "Skip the monthly archives")]
        skip_monthly: bool,
    },

    /// Display information about a Parquet base
    Info {
        #[arg(short, long)]
        file: PathBuf,

        #[arg(short, long, default_value = "10")]
        sample: usize,
    },
}
