/// One row of the station metadata table (`Tabela-estacao.csv`), used by the
/// web export to fill the archive header rows.
#[derive(Debug, Clone)]
pub struct StationInfo {
    pub acronym: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

impl StationInfo {
    /// Placeholder used when a station present in the data has no entry in
    /// the metadata table. The export still runs for it.
    pub fn unknown(acronym: &str) -> Self {
        Self {
            acronym: acronym.to_string(),
            name: "Desconhecida".to_string(),
            latitude: None,
            longitude: None,
            altitude: None,
        }
    }

    pub fn latitude_label(&self) -> String {
        match self.latitude {
            Some(lat) => format!("lat:{}", lat),
            None => "lat:Desconhecida".to_string(),
        }
    }

    pub fn longitude_label(&self) -> String {
        match self.longitude {
            Some(lon) => format!("lon:{}", lon),
            None => "lon:Desconhecida".to_string(),
        }
    }

    pub fn altitude_label(&self) -> String {
        match self.altitude {
            Some(alt) => format!("alt:{}", alt),
            None => "alt:Desconhecida".to_string(),
        }
    }
}
