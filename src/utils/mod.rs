pub mod constants;
pub mod files;
pub mod progress;

pub use progress::ProgressReporter;
