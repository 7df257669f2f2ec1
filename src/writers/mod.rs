pub mod parquet;
pub mod web;

pub use parquet::{ParquetFileInfo, ParquetReader, ParquetWriter};
pub use web::WebExporter;
