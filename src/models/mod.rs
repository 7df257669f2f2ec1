pub mod batch;
pub mod domain;
pub mod station;

pub use batch::{SourceBatch, SourceRow, TimeRange};
pub use domain::Domain;
pub use station::StationInfo;
