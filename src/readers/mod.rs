pub mod csv_reader;
pub mod station_reader;

pub use csv_reader::CsvNormalizer;
pub use station_reader::StationReader;
