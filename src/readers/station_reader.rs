use crate::error::Result;
use crate::models::StationInfo;
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::path::Path;

/// Reads the station metadata table (`Tabela-estacao.csv`). Coordinates may
/// use comma decimal separators; unparseable cells become missing.
pub struct StationReader;

#[derive(Debug, Deserialize)]
struct RawStation {
    #[serde(rename = "Sigla")]
    sigla: String,

    #[serde(rename = "Nome", default)]
    nome: String,

    #[serde(rename = "Latitude", default, deserialize_with = "tolerant_float")]
    latitude: Option<f64>,

    #[serde(rename = "Longitude", default, deserialize_with = "tolerant_float")]
    longitude: Option<f64>,

    #[serde(rename = "Alt.(m)", default, deserialize_with = "tolerant_float")]
    altitude: Option<f64>,
}

fn tolerant_float<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| s.trim().replace(',', ".").parse().ok()))
}

impl StationReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read_stations(&self, path: &Path) -> Result<Vec<StationInfo>> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;

        let mut stations = Vec::new();
        for record in reader.deserialize() {
            let raw: RawStation = record?;
            if raw.sigla.is_empty() {
                continue;
            }
            let name = if raw.nome.is_empty() {
                raw.sigla.clone()
            } else {
                raw.nome
            };
            stations.push(StationInfo {
                acronym: raw.sigla,
                name,
                latitude: raw.latitude,
                longitude: raw.longitude,
                altitude: raw.altitude,
            });
        }
        Ok(stations)
    }

    pub fn read_stations_map(&self, path: &Path) -> Result<HashMap<String, StationInfo>> {
        let stations = self.read_stations(path)?;
        let mut map = HashMap::with_capacity(stations.len());
        for station in stations {
            map.insert(station.acronym.clone(), station);
        }
        Ok(map)
    }
}

impl Default for StationReader {
    fn default() -> Self {
        Self::new()
    }
}
