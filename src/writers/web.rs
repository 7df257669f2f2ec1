use crate::error::Result;
use crate::models::domain::variable_unit;
use crate::models::{Domain, StationInfo};
use crate::store::{Row, Table};
use chrono::Datelike;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::path::Path;
use tracing::{error, info};
use zip::write::FileOptions;
use zip::CompressionMethod;

pub const NETWORK_NAME: &str = "SONDA Network";
pub const NETWORK_URL: &str = "http://sonda.ccst.inpe.br";
pub const NETWORK_CONTACT: &str = "sonda@inpe.br";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    pub stations: usize,
    pub annual_archives: usize,
    pub monthly_archives: usize,
}

/// Writes per-station yearly and monthly archives for web publication: one
/// `.dat` delimited-text file per period, bundled into a single-file zip,
/// with two extra header rows (station metadata, column units) above the
/// column names.
pub struct WebExporter {
    annual: bool,
    monthly: bool,
}

impl WebExporter {
    pub fn new() -> Self {
        Self {
            annual: true,
            monthly: true,
        }
    }

    pub fn with_annual(mut self, annual: bool) -> Self {
        self.annual = annual;
        self
    }

    pub fn with_monthly(mut self, monthly: bool) -> Self {
        self.monthly = monthly;
        self
    }

    pub fn export(
        &self,
        table: &Table,
        domain: Domain,
        stations: &HashMap<String, StationInfo>,
        output_root: &Path,
    ) -> Result<ExportSummary> {
        // Publish only the domain's columns of interest that the table holds.
        let columns: Vec<String> = domain
            .export_columns()
            .iter()
            .filter(|c| table.column_names().contains(*c))
            .map(|c| c.to_string())
            .collect();

        let mut summary = ExportSummary::default();

        for acronym in table.stations() {
            let station = match stations.get(&acronym) {
                Some(info) => info.clone(),
                None => {
                    error!(
                        station = %acronym,
                        "station information not found in metadata table"
                    );
                    StationInfo::unknown(&acronym)
                }
            };
            info!(station = %acronym, "exporting station");

            let rows = table.rows_for_station(&acronym);

            if self.annual {
                summary.annual_archives +=
                    self.export_annual(table, domain, &station, &columns, &rows, output_root)?;
            }
            if self.monthly {
                summary.monthly_archives +=
                    self.export_monthly(table, domain, &station, &columns, &rows, output_root)?;
            }
            summary.stations += 1;
        }

        info!(
            stations = summary.stations,
            annual = summary.annual_archives,
            monthly = summary.monthly_archives,
            "export finished"
        );
        Ok(summary)
    }

    /// Yearly grouping follows the `year` column; rows without one are left
    /// out of the annual archives.
    fn export_annual(
        &self,
        table: &Table,
        domain: Domain,
        station: &StationInfo,
        columns: &[String],
        rows: &[&Row],
        output_root: &Path,
    ) -> Result<usize> {
        let mut by_year: BTreeMap<i32, Vec<&Row>> = BTreeMap::new();
        for row in rows {
            if let Some(year) = row.year {
                by_year.entry(year).or_default().push(row);
            }
        }

        let mut written = 0;
        for (year, group) in by_year {
            let stem = format!("{}_{}_{}", station.acronym, year, domain.archive_suffix());
            let dir = output_root
                .join("anual")
                .join(domain.export_dir_name())
                .join(&station.acronym)
                .join(year.to_string());
            self.write_archive(table, station, columns, &group, &dir, &stem)?;
            written += 1;
        }
        Ok(written)
    }

    /// Monthly grouping follows the timestamp; rows without one are left out.
    fn export_monthly(
        &self,
        table: &Table,
        domain: Domain,
        station: &StationInfo,
        columns: &[String],
        rows: &[&Row],
        output_root: &Path,
    ) -> Result<usize> {
        let mut by_month: BTreeMap<(i32, u32), Vec<&Row>> = BTreeMap::new();
        for row in rows {
            if let Some(ts) = row.timestamp {
                by_month
                    .entry((ts.year(), ts.month()))
                    .or_default()
                    .push(row);
            }
        }

        let mut written = 0;
        for ((year, month), group) in by_month {
            let stem = format!(
                "{}_{}_{:02}_{}",
                station.acronym,
                year,
                month,
                domain.archive_suffix()
            );
            let dir = output_root
                .join("mensal")
                .join(domain.export_dir_name())
                .join(&station.acronym)
                .join(year.to_string());
            self.write_archive(table, station, columns, &group, &dir, &stem)?;
            written += 1;
        }
        Ok(written)
    }

    fn write_archive(
        &self,
        table: &Table,
        station: &StationInfo,
        columns: &[String],
        rows: &[&Row],
        dir: &Path,
        stem: &str,
    ) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let dat = build_dat(table, station, columns, rows)?;

        let zip_path = dir.join(format!("{}.zip", stem));
        let file = std::fs::File::create(zip_path)?;
        let mut zip = zip::ZipWriter::new(file);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        zip.start_file(format!("{}.dat", stem), options)?;
        zip.write_all(&dat)?;
        zip.finish()?;
        Ok(())
    }
}

impl Default for WebExporter {
    fn default() -> Self {
        Self::new()
    }
}

/// Station metadata entries for the first header row, padded with empty
/// cells to the column count.
fn metadata_header(station: &StationInfo, width: usize) -> Vec<String> {
    let mut header = vec![
        station.acronym.clone(),
        station.name.clone(),
        station.latitude_label(),
        station.longitude_label(),
        station.altitude_label(),
        NETWORK_NAME.to_string(),
        NETWORK_URL.to_string(),
        NETWORK_CONTACT.to_string(),
    ];
    header.truncate(width);
    header.resize(width, String::new());
    header
}

fn build_dat(
    table: &Table,
    station: &StationInfo,
    columns: &[String],
    rows: &[&Row],
) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(metadata_header(station, columns.len()))?;
    writer.write_record(columns)?;
    writer.write_record(columns.iter().map(|c| variable_unit(c)))?;

    for row in rows {
        let record: Vec<String> = columns.iter().map(|c| cell_value(table, row, c)).collect();
        writer.write_record(&record)?;
    }

    writer
        .into_inner()
        .map_err(|e| crate::error::IngestError::InvalidFormat(e.to_string()))
}

fn cell_value(table: &Table, row: &Row, column: &str) -> String {
    match column {
        "acronym" => row.acronym.clone().unwrap_or_default(),
        "timestamp" => row
            .timestamp
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default(),
        "year" => row.year.map(|v| v.to_string()).unwrap_or_default(),
        "day" => row.day.map(|v| v.to_string()).unwrap_or_default(),
        "min" => row.min.map(|v| v.to_string()).unwrap_or_default(),
        _ => table
            .measurement_value(row, column)
            .map(|v| v.to_string())
            .unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceRow;
    use chrono::NaiveDate;
    use std::io::Read;
    use tempfile::TempDir;

    fn ts(month: u32, minute: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2020, month, 1)
            .unwrap()
            .and_hms_opt(0, minute, 0)
            .unwrap()
    }

    fn populated_table() -> Table {
        let mut table = Table::with_variables(
            "base_solarimetrica",
            &["acronym", "timestamp", "year", "day", "min", "glo_avg", "dif_avg"],
        );
        let columns = vec!["glo_avg".to_string(), "dif_avg".to_string()];
        for (month, minute) in [(1, 0), (1, 10), (2, 0)] {
            let row = SourceRow {
                timestamp: Some(ts(month, minute)),
                year: Some(2020),
                day: Some(1),
                min: Some(minute as i32),
                values: vec![Some(100.0), Some(40.0)],
            };
            table.insert_row("BRB", &row, &columns).unwrap();
        }
        table
    }

    fn station_map() -> HashMap<String, StationInfo> {
        let mut map = HashMap::new();
        map.insert(
            "BRB".to_string(),
            StationInfo {
                acronym: "BRB".to_string(),
                name: "Brasilia".to_string(),
                latitude: Some(-15.6),
                longitude: Some(-47.71),
                altitude: Some(1023.0),
            },
        );
        map
    }

    #[test]
    fn test_export_layout_and_counts() {
        let temp_dir = TempDir::new().unwrap();
        let summary = WebExporter::new()
            .export(
                &populated_table(),
                Domain::Solarimetric,
                &station_map(),
                temp_dir.path(),
            )
            .unwrap();

        assert_eq!(summary.stations, 1);
        assert_eq!(summary.annual_archives, 1);
        assert_eq!(summary.monthly_archives, 2);

        let annual = temp_dir
            .path()
            .join("anual/Solarimetrico/BRB/2020/BRB_2020_SD.zip");
        let monthly = temp_dir
            .path()
            .join("mensal/Solarimetrico/BRB/2020/BRB_2020_01_SD.zip");
        assert!(annual.exists());
        assert!(monthly.exists());
    }

    #[test]
    fn test_archive_content_has_three_header_rows() {
        let temp_dir = TempDir::new().unwrap();
        WebExporter::new()
            .with_monthly(false)
            .export(
                &populated_table(),
                Domain::Solarimetric,
                &station_map(),
                temp_dir.path(),
            )
            .unwrap();

        let zip_path = temp_dir
            .path()
            .join("anual/Solarimetrico/BRB/2020/BRB_2020_SD.zip");
        let mut archive = zip::ZipArchive::new(std::fs::File::open(zip_path).unwrap()).unwrap();
        let mut dat = archive.by_name("BRB_2020_SD.dat").unwrap();
        let mut content = String::new();
        dat.read_to_string(&mut content).unwrap();

        let lines: Vec<&str> = content.lines().collect();
        // metadata row + column row + units row + 3 data rows
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("BRB,Brasilia,lat:-15.6,lon:-47.71,alt:1023"));
        assert!(lines[0].contains(NETWORK_URL));
        assert!(lines[1].starts_with("acronym,timestamp,year,day,min"));
        assert!(lines[2].contains("W/m2"));
        assert!(lines[3].starts_with("BRB,2020-01-01 00:00:00,2020,1,0,100"));
    }

    #[test]
    fn test_unknown_station_still_exported() {
        let temp_dir = TempDir::new().unwrap();
        let summary = WebExporter::new()
            .with_monthly(false)
            .export(
                &populated_table(),
                Domain::Solarimetric,
                &HashMap::new(),
                temp_dir.path(),
            )
            .unwrap();

        assert_eq!(summary.stations, 1);
        let zip_path = temp_dir
            .path()
            .join("anual/Solarimetrico/BRB/2020/BRB_2020_SD.zip");
        let mut archive = zip::ZipArchive::new(std::fs::File::open(zip_path).unwrap()).unwrap();
        let mut dat = archive.by_name("BRB_2020_SD.dat").unwrap();
        let mut content = String::new();
        dat.read_to_string(&mut content).unwrap();
        assert!(content.starts_with("BRB,Desconhecida,lat:Desconhecida"));
    }
}
