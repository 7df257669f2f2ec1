pub mod driver;
pub mod upsert;

pub use driver::{IngestRunner, RunSummary};
pub use upsert::{Granularity, UpsertOutcome, Upserter};
