//! Configuration models and loaders for trajsim catalogs, flights, and runs.

use std::fs::File;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// One row of an aircraft performance table.
#[derive(Debug, Deserialize, Clone)]
pub struct AdbRowConfig {
    pub altitude_ft: f64,
    pub cruise_tas_knots: f64,
    pub climb_tas_knots: f64,
    pub climb_rate_low_fpm: f64,
    pub climb_rate_nominal_fpm: f64,
    pub climb_rate_high_fpm: f64,
    pub descent_tas_knots: f64,
    pub descent_rate_nominal_fpm: f64,
}

/// Reference masses for the three mass categories.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct MassConfig {
    pub low: f64,
    pub nominal: f64,
    pub high: f64,
}

/// Performance table for one aircraft type, one file per type.
#[derive(Debug, Deserialize, Clone)]
pub struct AdbTableConfig {
    pub actype: String,
    pub max_altitude_ft: f64,
    #[serde(default)]
    pub mass_kg: Option<MassConfig>,
    pub rows: Vec<AdbRowConfig>,
}

/// Aircraft type alias resolved onto a table that exists in the catalog.
#[derive(Debug, Deserialize, Clone)]
pub struct SynonymConfig {
    pub synonym: String,
    pub actype: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RunwayConfig {
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub true_heading_deg: f64,
}

/// Surface layout node referenced by id-style taxi plans.
#[derive(Debug, Deserialize, Clone)]
pub struct LayoutNodeConfig {
    pub id: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AirportConfig {
    pub code: String,
    #[serde(default)]
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub elevation_ft: f64,
    /// Magnetic declination, east positive.
    #[serde(default)]
    pub magnetic_declination_deg: f64,
    #[serde(default)]
    pub runways: Vec<RunwayConfig>,
    #[serde(default)]
    pub layout: Vec<LayoutNodeConfig>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FixKind {
    #[default]
    Fix,
    Navaid,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FixConfig {
    pub name: String,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    #[serde(default)]
    pub kind: FixKind,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureKindConfig {
    #[serde(rename = "SID")]
    Sid,
    #[serde(rename = "STAR")]
    Star,
    #[serde(rename = "APPROACH")]
    Approach,
    #[serde(other)]
    Unsupported,
}

/// One ARINC 424 leg. Codes stay textual here and are validated by the nav-data builder.
#[derive(Debug, Deserialize, Clone)]
pub struct LegConfig {
    #[serde(default)]
    pub waypoint: Option<String>,
    pub path_terminator: String,
    #[serde(default)]
    pub alt_desc: Option<String>,
    #[serde(default)]
    pub alt_1_ft: Option<f64>,
    #[serde(default)]
    pub alt_2_ft: Option<f64>,
    #[serde(default)]
    pub speed_limit_knots: Option<f64>,
    #[serde(default)]
    pub speed_desc: Option<String>,
    #[serde(default)]
    pub magnetic_course_deg: Option<f64>,
    #[serde(default)]
    pub navaid: Option<String>,
    #[serde(default)]
    pub theta_deg: Option<f64>,
    #[serde(default)]
    pub rho_nm: Option<f64>,
    #[serde(default)]
    pub distance_nm: Option<f64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProcedureConfig {
    pub name: String,
    pub airport: String,
    pub kind: ProcedureKindConfig,
    pub legs: Vec<LegConfig>,
}

/// Mass category of a flight, selecting the climb-rate column of its table.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum MassCategoryConfig {
    Low,
    #[default]
    Nominal,
    High,
}

/// Flight record: identity, initial state, and the route string.
#[derive(Debug, Deserialize, Clone)]
pub struct FlightConfig {
    pub callsign: String,
    pub actype: String,
    #[serde(default)]
    pub departure_time_s: f64,
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_ft: f64,
    #[serde(default)]
    pub tas_knots: f64,
    #[serde(default)]
    pub course_deg: f64,
    pub cruise_altitude_ft: f64,
    #[serde(default)]
    pub cruise_tas_knots: Option<f64>,
    #[serde(default)]
    pub mass_category: MassCategoryConfig,
    pub route: String,
}

/// Run parameters. Every field has a default so an empty file is valid.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    pub surface_step_s: f64,
    pub airborne_step_s: f64,
    pub duration_s: f64,
    pub taxi_speed_knots: f64,
    pub ramp_speed_knots: f64,
    pub waypoint_tolerance_ft: f64,
    pub heading_leg_climb_divisor: f64,
    pub min_cruise_altitude_ft: f64,
    pub max_flight_plan_length: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            surface_step_s: 5.0,
            airborne_step_s: 10.0,
            duration_s: 14_400.0,
            taxi_speed_knots: 18.0,
            ramp_speed_knots: 5.0,
            waypoint_tolerance_ft: 100.0,
            heading_leg_climb_divisor: 3.0,
            min_cruise_altitude_ft: 10_000.0,
            max_flight_plan_length: 110,
        }
    }
}

/// All static catalogs read from one data directory.
#[derive(Debug, Clone, Default)]
pub struct CatalogConfig {
    pub adb_tables: Vec<AdbTableConfig>,
    pub synonyms: Vec<SynonymConfig>,
    pub airports: Vec<AirportConfig>,
    pub fixes: Vec<FixConfig>,
    pub procedures: Vec<ProcedureConfig>,
}

/// Errors that can occur while loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("failed to parse TOML: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Load performance tables from a directory of TOML files or a YAML list.
pub fn load_adb_tables<P: AsRef<Path>>(path: P) -> Result<Vec<AdbTableConfig>, ConfigError> {
    let mut tables: Vec<AdbTableConfig> = load_records(path)?;
    for table in &mut tables {
        if table.rows.is_empty() {
            return Err(ConfigError::Invalid(format!(
                "performance table {} has no rows",
                table.actype
            )));
        }
        table
            .rows
            .sort_by(|a, b| a.altitude_ft.total_cmp(&b.altitude_ft));
        table.actype = table.actype.trim().to_ascii_uppercase();
    }
    Ok(tables)
}

pub fn load_synonyms<P: AsRef<Path>>(path: P) -> Result<Vec<SynonymConfig>, ConfigError> {
    load_records(path)
}

pub fn load_airports<P: AsRef<Path>>(path: P) -> Result<Vec<AirportConfig>, ConfigError> {
    load_records(path)
}

pub fn load_fixes<P: AsRef<Path>>(path: P) -> Result<Vec<FixConfig>, ConfigError> {
    load_records(path)
}

pub fn load_procedures<P: AsRef<Path>>(path: P) -> Result<Vec<ProcedureConfig>, ConfigError> {
    load_records(path)
}

/// Load flight records from a YAML list, a TOML file, or a directory of TOML files.
pub fn load_flights<P: AsRef<Path>>(path: P) -> Result<Vec<FlightConfig>, ConfigError> {
    load_records(path)
}

/// Load run parameters from a single YAML or TOML document.
pub fn load_simulation_config<P: AsRef<Path>>(path: P) -> Result<SimulationConfig, ConfigError> {
    let path = path.as_ref();
    let config: SimulationConfig = if is_toml(path) {
        toml::from_str(&std::fs::read_to_string(path)?)?
    } else {
        serde_yaml::from_reader(File::open(path)?)?
    };
    if config.surface_step_s <= 0.0 || config.airborne_step_s <= 0.0 {
        return Err(ConfigError::Invalid("time steps must be positive".into()));
    }
    if config.max_flight_plan_length < 4 {
        return Err(ConfigError::Invalid(
            "max_flight_plan_length must leave room for TOC and TOD".into(),
        ));
    }
    Ok(config)
}

/// Load every catalog from the conventional layout under `root`:
/// `adb/`, `synonyms.yaml`, `airports.yaml`, `fixes.yaml`, `procedures.yaml`.
pub fn load_catalog<P: AsRef<Path>>(root: P) -> Result<CatalogConfig, ConfigError> {
    let root = root.as_ref();
    let optional = |name: &str| {
        let path = root.join(name);
        path.exists().then_some(path)
    };
    Ok(CatalogConfig {
        adb_tables: load_adb_tables(root.join("adb"))?,
        synonyms: optional("synonyms.yaml")
            .map(load_synonyms)
            .transpose()?
            .unwrap_or_default(),
        airports: load_airports(root.join("airports.yaml"))?,
        fixes: optional("fixes.yaml")
            .map(load_fixes)
            .transpose()?
            .unwrap_or_default(),
        procedures: optional("procedures.yaml")
            .map(load_procedures)
            .transpose()?
            .unwrap_or_default(),
    })
}

fn is_toml(path: &Path) -> bool {
    path.extension().map(|ext| ext == "toml").unwrap_or(false)
}

fn load_records<T, P>(path: P) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if path.is_dir() {
        read_dir_records(path)
    } else if is_toml(path) {
        let contents = std::fs::read_to_string(path)?;
        let record: T = toml::from_str(&contents)?;
        Ok(vec![record])
    } else {
        let reader = File::open(path)?;
        Ok(serde_yaml::from_reader(reader)?)
    }
}

fn read_dir_records<T>(dir: &Path) -> Result<Vec<T>, ConfigError>
where
    T: for<'de> Deserialize<'de>,
{
    let mut records = Vec::new();
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| is_toml(path))
        .collect();
    entries.sort();
    for path in entries {
        let contents = std::fs::read_to_string(&path)?;
        let record: T = toml::from_str(&contents)?;
        records.push(record);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulation_defaults_fill_missing_fields() {
        let cfg: SimulationConfig = serde_yaml::from_str("airborne_step_s: 2.0").expect("yaml");
        assert_eq!(cfg.airborne_step_s, 2.0);
        assert_eq!(cfg.surface_step_s, 5.0);
        assert_eq!(cfg.max_flight_plan_length, 110);
    }

    #[test]
    fn flight_mass_category_defaults_to_nominal() {
        let base = "callsign: A1\nactype: B733\nlatitude_deg: 0.0\nlongitude_deg: 0.0\naltitude_ft: 0.0\ncruise_altitude_ft: 30000.0\nroute: X\n";
        let cfg: FlightConfig = serde_yaml::from_str(base).expect("yaml");
        assert_eq!(cfg.mass_category, MassCategoryConfig::Nominal);
        let cfg: FlightConfig =
            serde_yaml::from_str(&format!("{base}mass_category: high\n")).expect("yaml");
        assert_eq!(cfg.mass_category, MassCategoryConfig::High);
    }

    #[test]
    fn unknown_procedure_kind_is_unsupported() {
        let yaml = "name: X\nairport: KSFO\nkind: TRANSITION\nlegs: []\n";
        let cfg: ProcedureConfig = serde_yaml::from_str(yaml).expect("yaml");
        assert_eq!(cfg.kind, ProcedureKindConfig::Unsupported);
    }

    #[test]
    fn leg_optionals_default_to_none() {
        let cfg: LegConfig = serde_yaml::from_str("path_terminator: TF\nwaypoint: PORTE").expect("yaml");
        assert_eq!(cfg.waypoint.as_deref(), Some("PORTE"));
        assert!(cfg.alt_1_ft.is_none());
        assert!(cfg.navaid.is_none());
    }
}
