/// Maximum rows per Parquet row group.
pub const DEFAULT_ROW_GROUP_SIZE: usize = 100_000;

/// Fixed metadata columns at the head of every sensor CSV:
/// acronym, timestamp, year, day, min.
pub const METADATA_COLUMN_COUNT: usize = 5;

/// Source files whose name contains this marker are layout templates and
/// quality-control scratch files, never sensor data.
pub const TEMPLATE_FILE_MARKER: &str = "YYYY_MM";

/// Timestamp layouts accepted by the normalizer, tried in order.
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M",
];
