use clap::ValueEnum;

/// Canonical column list for the meteorological base.
pub const METEO_VARIABLES: &[&str] = &[
    "acronym", "timestamp", "year", "day", "min", "tp_sfc", "humid_sfc", "press", "rain",
    "ws10_avg", "ws10_std", "wd10_avg", "wd10_std",
];

/// Canonical column list for the solarimetric base.
pub const SOLAR_VARIABLES: &[&str] = &[
    "acronym", "timestamp", "year", "day", "min", "glo_avg", "glo_std", "glo_max", "glo_min",
    "dif_avg", "dif_std", "dif_max", "dif_min", "par_avg", "par_std", "par_max", "par_min",
    "lux_avg", "lux_std", "lux_max", "lux_min", "dir_avg", "dir_std", "dir_max", "dir_min",
    "lw_calc_avg", "lw_calc_std", "lw_calc_max", "lw_calc_min", "lw_raw_avg", "lw_raw_std",
    "lw_raw_max", "lw_raw_min", "tp_glo", "tp_dir", "tp_dif", "tp_lw_dome", "tp_lw_case",
];

/// Canonical column list for the anemometric base.
pub const ANEMO_VARIABLES: &[&str] = &[
    "acronym", "timestamp", "year", "day", "min", "ws10_avg", "ws10_std", "ws10_min", "ws10_max",
    "wd10_avg", "wd10_std", "ws25_avg", "ws25_std", "ws25_min", "ws25_max", "wd25_avg", "wd25_std",
    "tp_25", "ws50_avg", "ws50_std", "ws50_min", "ws50_max", "wd50_avg", "wd50_std", "tp_50",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Domain {
    Meteorological,
    Solarimetric,
    Anemometric,
}

impl Domain {
    pub fn all() -> [Domain; 3] {
        [
            Domain::Meteorological,
            Domain::Solarimetric,
            Domain::Anemometric,
        ]
    }

    /// Name of the in-session table backing this domain.
    pub fn table_name(&self) -> &'static str {
        match self {
            Domain::Meteorological => "base_meteorologica",
            Domain::Solarimetric => "base_solarimetrica",
            Domain::Anemometric => "base_anemometrica",
        }
    }

    /// Canonical Parquet file name for the domain's table.
    pub fn parquet_file_name(&self) -> &'static str {
        match self {
            Domain::Meteorological => "dados_meteorologicos.parquet",
            Domain::Solarimetric => "dados_solarimetricos.parquet",
            Domain::Anemometric => "dados_anemometricos.parquet",
        }
    }

    /// Subdirectory of the source tree holding this domain's CSV files.
    pub fn source_dir_name(&self) -> &'static str {
        match self {
            Domain::Meteorological => "Meteorologicos",
            Domain::Solarimetric => "Solarimetricos",
            Domain::Anemometric => "Anemometricos",
        }
    }

    /// Directory segment used by the web export layout.
    pub fn export_dir_name(&self) -> &'static str {
        match self {
            Domain::Meteorological => "Meteorologico",
            Domain::Solarimetric => "Solarimetrico",
            Domain::Anemometric => "Anemometrico",
        }
    }

    /// Two-letter archive suffix embedded in web export file names.
    pub fn archive_suffix(&self) -> &'static str {
        match self {
            Domain::Meteorological => "MD",
            Domain::Solarimetric => "SD",
            Domain::Anemometric => "AD",
        }
    }

    pub fn variables(&self) -> &'static [&'static str] {
        match self {
            Domain::Meteorological => METEO_VARIABLES,
            Domain::Solarimetric => SOLAR_VARIABLES,
            Domain::Anemometric => ANEMO_VARIABLES,
        }
    }

    /// Columns published by the web export, in order. Only columns that
    /// actually exist in the source table are emitted.
    pub fn export_columns(&self) -> &'static [&'static str] {
        match self {
            Domain::Solarimetric => &[
                "acronym", "timestamp", "year", "day", "min", "glo_avg", "dir_avg", "dif_avg",
                "lw_calc_avg", "par_avg", "lux_avg",
            ],
            Domain::Meteorological => METEO_VARIABLES,
            Domain::Anemometric => ANEMO_VARIABLES,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Meteorological => "Meteorological",
            Domain::Solarimetric => "Solarimetric",
            Domain::Anemometric => "Anemometric",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Measurement unit printed in the web export's units header row. Metadata
/// columns and unknown variables carry an empty unit.
pub fn variable_unit(name: &str) -> &'static str {
    match name {
        "glo_avg" | "glo_std" | "glo_max" | "glo_min" | "dir_avg" | "dir_std" | "dir_max"
        | "dir_min" | "dif_avg" | "dif_std" | "dif_max" | "dif_min" | "lw_calc_avg"
        | "lw_calc_std" | "lw_calc_max" | "lw_calc_min" | "lw_raw_avg" | "lw_raw_std"
        | "lw_raw_max" | "lw_raw_min" => "W/m2",
        "par_avg" | "par_std" | "par_max" | "par_min" => "µmols/m2.s",
        "lux_avg" | "lux_std" | "lux_max" | "lux_min" => "klux",
        "rain" => "mm",
        "press" => "mb",
        "humid_sfc" => "%",
        name if name.starts_with("tp_") => "°C",
        name if name.starts_with("ws") => "m/s",
        name if name.starts_with("wd") => "°",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_table_names() {
        assert_eq!(Domain::Meteorological.table_name(), "base_meteorologica");
        assert_eq!(Domain::Solarimetric.table_name(), "base_solarimetrica");
        assert_eq!(Domain::Anemometric.table_name(), "base_anemometrica");
    }

    #[test]
    fn test_variable_lists_start_with_metadata_columns() {
        for domain in Domain::all() {
            let vars = domain.variables();
            assert_eq!(&vars[..5], &["acronym", "timestamp", "year", "day", "min"]);
        }
    }

    #[test]
    fn test_variable_units() {
        assert_eq!(variable_unit("glo_avg"), "W/m2");
        assert_eq!(variable_unit("par_avg"), "µmols/m2.s");
        assert_eq!(variable_unit("lux_avg"), "klux");
        assert_eq!(variable_unit("ws10_avg"), "m/s");
        assert_eq!(variable_unit("acronym"), "");
        assert_eq!(variable_unit("timestamp"), "");
    }

    #[test]
    fn test_export_columns_subset_semantics() {
        // The solarimetric export list intentionally narrows the table.
        let export = Domain::Solarimetric.export_columns();
        assert!(export.len() < SOLAR_VARIABLES.len());
        assert!(export.contains(&"glo_avg"));
    }
}
