pub mod cli;
pub mod error;
pub mod ingest;
pub mod models;
pub mod readers;
pub mod store;
pub mod utils;
pub mod writers;

pub use error::{IngestError, Result};
