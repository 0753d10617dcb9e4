//! Airports, fixes, and terminal procedures keyed for route parsing.

use std::collections::HashMap;

use thiserror::Error;
use trajsim_config::{
    AirportConfig, CatalogConfig, FixConfig, FixKind, LegConfig, ProcedureConfig,
    ProcedureKindConfig,
};
use trajsim_core::angle::normalize_deg;
use trajsim_geodesy::Geodetic;

use crate::types::{AltitudeDescriptor, PathTerminator, ProcedureType, SpeedDescriptor};

#[derive(Debug, Error, PartialEq)]
pub enum NavDataError {
    #[error("duplicate airport {0}")]
    DuplicateAirport(String),
    #[error("procedure {procedure}: unknown path terminator '{code}'")]
    UnknownPathTerminator { procedure: String, code: String },
    #[error("procedure {procedure}: invalid descriptor '{value}'")]
    InvalidDescriptor { procedure: String, value: String },
    #[error("procedure {procedure} references unknown airport {airport}")]
    UnknownAirport { procedure: String, airport: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Runway {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub true_heading_deg: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub elevation_ft: f64,
    /// East-positive; true = magnetic + declination.
    pub magnetic_declination_deg: f64,
    pub runways: Vec<Runway>,
    layout: HashMap<String, (f64, f64)>,
}

impl Airport {
    fn from_config(config: &AirportConfig) -> Self {
        Self {
            code: config.code.trim().to_ascii_uppercase(),
            name: config.name.clone(),
            lat_deg: config.latitude_deg,
            lon_deg: config.longitude_deg,
            elevation_ft: config.elevation_ft,
            magnetic_declination_deg: config.magnetic_declination_deg,
            runways: config
                .runways
                .iter()
                .map(|r| Runway {
                    name: r.name.trim().to_ascii_uppercase(),
                    lat_deg: r.latitude_deg,
                    lon_deg: r.longitude_deg,
                    true_heading_deg: r.true_heading_deg,
                })
                .collect(),
            layout: config
                .layout
                .iter()
                .map(|n| (n.id.clone(), (n.latitude_deg, n.longitude_deg)))
                .collect(),
        }
    }

    pub fn runway(&self, name: &str) -> Option<&Runway> {
        self.runways.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Position of a surface-layout node.
    pub fn layout_node(&self, id: &str) -> Option<(f64, f64)> {
        self.layout.get(id).copied()
    }

    pub fn to_true(&self, magnetic_deg: f64) -> f64 {
        normalize_deg(magnetic_deg + self.magnetic_declination_deg)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Fix {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub kind: FixKind,
}

impl Fix {
    pub fn position(&self, alt_ft: f64) -> Geodetic {
        Geodetic::new(self.lat_deg, self.lon_deg, alt_ft)
    }
}

/// One procedure leg with codes already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub waypoint: Option<String>,
    pub path_terminator: PathTerminator,
    pub alt_desc: AltitudeDescriptor,
    pub alt_1_ft: Option<f64>,
    pub alt_2_ft: Option<f64>,
    pub speed_limit_knots: Option<f64>,
    pub speed_desc: SpeedDescriptor,
    pub magnetic_course_deg: Option<f64>,
    pub navaid: Option<String>,
    pub theta_deg: Option<f64>,
    pub rho_nm: Option<f64>,
    pub distance_nm: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Procedure {
    pub name: String,
    pub airport: String,
    pub kind: ProcedureType,
    pub legs: Vec<Leg>,
}

/// Read-only nav-data context shared by every compilation.
#[derive(Debug, Clone, Default)]
pub struct NavDatabase {
    airports: HashMap<String, Airport>,
    fixes: HashMap<String, Fix>,
    procedures: HashMap<String, Vec<Procedure>>,
}

impl NavDatabase {
    /// Build the context from catalog records. Procedures of unsupported kinds are skipped.
    pub fn from_config(catalog: &CatalogConfig) -> Result<Self, NavDataError> {
        let mut db = Self::default();
        for config in &catalog.airports {
            let airport = Airport::from_config(config);
            if db.airports.contains_key(&airport.code) {
                return Err(NavDataError::DuplicateAirport(airport.code));
            }
            db.airports.insert(airport.code.clone(), airport);
        }
        for config in &catalog.fixes {
            db.add_fix(config);
        }
        for config in &catalog.procedures {
            if let Some(procedure) = db.build_procedure(config)? {
                db.procedures
                    .entry(procedure.name.clone())
                    .or_default()
                    .push(procedure);
            }
        }
        Ok(db)
    }

    fn add_fix(&mut self, config: &FixConfig) {
        let name = config.name.trim().to_ascii_uppercase();
        self.fixes.insert(
            name.clone(),
            Fix {
                name,
                lat_deg: config.latitude_deg,
                lon_deg: config.longitude_deg,
                kind: config.kind,
            },
        );
    }

    fn build_procedure(&self, config: &ProcedureConfig) -> Result<Option<Procedure>, NavDataError> {
        let kind = match config.kind {
            ProcedureKindConfig::Sid => ProcedureType::Sid,
            ProcedureKindConfig::Star => ProcedureType::Star,
            ProcedureKindConfig::Approach => ProcedureType::Approach,
            ProcedureKindConfig::Unsupported => return Ok(None),
        };
        let name = config.name.trim().to_ascii_uppercase();
        let airport = config.airport.trim().to_ascii_uppercase();
        if !self.airports.contains_key(&airport) {
            return Err(NavDataError::UnknownAirport {
                procedure: name,
                airport,
            });
        }
        let legs = config
            .legs
            .iter()
            .map(|leg| build_leg(&name, leg))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(Procedure {
            name,
            airport,
            kind,
            legs,
        }))
    }

    pub fn airport(&self, code: &str) -> Option<&Airport> {
        self.airports.get(&code.trim().to_ascii_uppercase())
    }

    pub fn fix(&self, name: &str) -> Option<&Fix> {
        self.fixes.get(&name.trim().to_ascii_uppercase())
    }

    /// Procedure `name` published for `airport`.
    pub fn procedure(&self, name: &str, airport: &str) -> Option<&Procedure> {
        self.procedures
            .get(&name.trim().to_ascii_uppercase())?
            .iter()
            .find(|p| p.airport.eq_ignore_ascii_case(airport.trim()))
    }

    /// Whether any airport publishes a procedure called `name`.
    pub fn has_procedure(&self, name: &str) -> bool {
        self.procedures
            .contains_key(&name.trim().to_ascii_uppercase())
    }
}

fn build_leg(procedure: &str, config: &LegConfig) -> Result<Leg, NavDataError> {
    let path_terminator = config.path_terminator.parse().map_err(|code| {
        NavDataError::UnknownPathTerminator {
            procedure: procedure.to_string(),
            code,
        }
    })?;
    let invalid = |value: String| NavDataError::InvalidDescriptor {
        procedure: procedure.to_string(),
        value,
    };
    let alt_desc = match config.alt_desc.as_deref() {
        Some(s) => s.parse().map_err(invalid)?,
        None => AltitudeDescriptor::Unconstrained,
    };
    let speed_desc = match config.speed_desc.as_deref() {
        Some(s) => s.parse().map_err(invalid)?,
        None => SpeedDescriptor::Unconstrained,
    };
    Ok(Leg {
        waypoint: config
            .waypoint
            .as_ref()
            .map(|w| w.trim().to_ascii_uppercase())
            .filter(|w| !w.is_empty()),
        path_terminator,
        alt_desc,
        alt_1_ft: config.alt_1_ft.filter(|a| *a >= 0.0),
        alt_2_ft: config.alt_2_ft.filter(|a| *a >= 0.0),
        speed_limit_knots: config.speed_limit_knots.filter(|s| *s > 0.0),
        speed_desc,
        magnetic_course_deg: config.magnetic_course_deg,
        navaid: config.navaid.as_ref().map(|n| n.trim().to_ascii_uppercase()),
        theta_deg: config.theta_deg,
        rho_nm: config.rho_nm,
        distance_nm: config.distance_nm,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Small SFO/LAX nav-data and performance fixture shared by this crate's tests.

    use trajsim_adb::AdbCatalog;
    use trajsim_config::*;

    use super::NavDatabase;

    fn leg(waypoint: Option<&str>, pt: &str) -> LegConfig {
        LegConfig {
            waypoint: waypoint.map(str::to_string),
            path_terminator: pt.to_string(),
            alt_desc: None,
            alt_1_ft: None,
            alt_2_ft: None,
            speed_limit_knots: None,
            speed_desc: None,
            magnetic_course_deg: None,
            navaid: None,
            theta_deg: None,
            rho_nm: None,
            distance_nm: None,
        }
    }

    fn fix(name: &str, lat: f64, lon: f64, kind: FixKind) -> FixConfig {
        FixConfig {
            name: name.into(),
            latitude_deg: lat,
            longitude_deg: lon,
            kind,
        }
    }

    fn node(id: &str, lat: f64, lon: f64) -> LayoutNodeConfig {
        LayoutNodeConfig {
            id: id.into(),
            latitude_deg: lat,
            longitude_deg: lon,
        }
    }

    pub fn catalog() -> CatalogConfig {
        let ksfo = AirportConfig {
            code: "KSFO".into(),
            name: "San Francisco Intl".into(),
            latitude_deg: 37.6188,
            longitude_deg: -122.375,
            elevation_ft: 13.0,
            magnetic_declination_deg: 13.0,
            runways: vec![RunwayConfig {
                name: "RW01R".into(),
                latitude_deg: 37.6067,
                longitude_deg: -122.381,
                true_heading_deg: 28.0,
            }],
            layout: vec![
                node("Gate_A5", 37.6155, -122.3860),
                node("Txy_A_01", 37.6120, -122.3850),
                node("Txy_A_02", 37.6090, -122.3830),
                node("Rwy_01R_001", 37.6070, -122.3812),
            ],
        };
        let klax = AirportConfig {
            code: "KLAX".into(),
            name: "Los Angeles Intl".into(),
            latitude_deg: 33.9425,
            longitude_deg: -118.4081,
            elevation_ft: 128.0,
            magnetic_declination_deg: 12.0,
            runways: vec![RunwayConfig {
                name: "RW24R".into(),
                latitude_deg: 33.9521,
                longitude_deg: -118.4019,
                true_heading_deg: 263.0,
            }],
            layout: vec![
                node("Rwy_24R_001", 33.9515, -118.4060),
                node("Txy_B_01", 33.9480, -118.4070),
                node("Gate_32", 33.9440, -118.4050),
            ],
        };

        let mut va = leg(Some("RW01R"), "VA");
        va.magnetic_course_deg = Some(15.0);
        va.alt_desc = Some("+".into());
        va.alt_1_ft = Some(1000.0);
        let mut vi = leg(None, "VI");
        vi.magnetic_course_deg = Some(257.0);
        let mut cf = leg(Some("PORTE"), "CF");
        cf.magnetic_course_deg = Some(167.0);
        cf.alt_desc = Some("+".into());
        cf.alt_1_ft = Some(6000.0);
        let sid = ProcedureConfig {
            name: "PORTE3".into(),
            airport: "KSFO".into(),
            kind: ProcedureKindConfig::Sid,
            legs: vec![va, vi, cf],
        };

        let mut sadde = leg(Some("SADDE"), "IF");
        sadde.alt_desc = Some("B".into());
        sadde.alt_1_ft = Some(14000.0);
        sadde.alt_2_ft = Some(12000.0);
        let star = ProcedureConfig {
            name: "SADDE6".into(),
            airport: "KLAX".into(),
            kind: ProcedureKindConfig::Star,
            legs: vec![sadde, leg(Some("ROMEN"), "TF")],
        };

        let mut romen = leg(Some("ROMEN"), "IF");
        romen.alt_desc = Some("@".into());
        romen.alt_1_ft = Some(6000.0);
        let mut rw = leg(Some("RW24R"), "TF");
        rw.alt_1_ft = Some(128.0);
        let approach = ProcedureConfig {
            name: "I24R".into(),
            airport: "KLAX".into(),
            kind: ProcedureKindConfig::Approach,
            legs: vec![romen, rw],
        };

        CatalogConfig {
            adb_tables: vec![b733()],
            synonyms: vec![SynonymConfig {
                synonym: "B737".into(),
                actype: "B733".into(),
            }],
            airports: vec![ksfo, klax],
            fixes: vec![
                fix("PORTE", 37.4900, -122.4700, FixKind::Fix),
                fix("SJC", 37.3747, -121.9450, FixKind::Navaid),
                fix("BSR", 36.1810, -121.6420, FixKind::Navaid),
                fix("RZS", 34.5090, -119.7710, FixKind::Navaid),
                fix("SADDE", 34.2000, -118.9000, FixKind::Fix),
                fix("ROMEN", 34.0150, -118.6000, FixKind::Fix),
            ],
            procedures: vec![sid, star, approach],
        }
    }

    pub fn b733() -> AdbTableConfig {
        let row = |alt: f64, cruise: f64, climb: f64, rate: f64, descent: f64, drate: f64| {
            AdbRowConfig {
                altitude_ft: alt,
                cruise_tas_knots: cruise,
                climb_tas_knots: climb,
                climb_rate_low_fpm: rate * 1.1,
                climb_rate_nominal_fpm: rate,
                climb_rate_high_fpm: rate * 0.8,
                descent_tas_knots: descent,
                descent_rate_nominal_fpm: drate,
            }
        };
        AdbTableConfig {
            actype: "B733".into(),
            max_altitude_ft: 37000.0,
            mass_kg: None,
            rows: vec![
                row(0.0, 200.0, 170.0, 2500.0, 160.0, 1000.0),
                row(5000.0, 260.0, 220.0, 2300.0, 220.0, 1800.0),
                row(10000.0, 300.0, 280.0, 2100.0, 280.0, 2200.0),
                row(20000.0, 380.0, 340.0, 1700.0, 340.0, 2400.0),
                row(30000.0, 430.0, 400.0, 1100.0, 400.0, 2400.0),
                row(37000.0, 450.0, 420.0, 500.0, 420.0, 2000.0),
            ],
        }
    }

    pub fn navdata() -> NavDatabase {
        NavDatabase::from_config(&catalog()).expect("fixture nav data")
    }

    pub fn adb() -> AdbCatalog {
        let c = catalog();
        AdbCatalog::from_config(&c.adb_tables, &c.synonyms).expect("fixture tables")
    }

    pub fn flight(route: &str) -> FlightConfig {
        FlightConfig {
            callsign: "SWA1".into(),
            actype: "B733".into(),
            departure_time_s: 0.0,
            latitude_deg: 37.6155,
            longitude_deg: -122.3860,
            altitude_ft: 13.0,
            tas_knots: 0.0,
            course_deg: 28.0,
            cruise_altitude_ft: 33000.0,
            cruise_tas_knots: None,
            mass_category: MassCategoryConfig::Nominal,
            route: route.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn procedures_are_keyed_by_airport() {
        let db = fixtures::navdata();
        assert!(db.procedure("porte3", "KSFO").is_some());
        assert!(db.procedure("PORTE3", "KLAX").is_none());
        let sid = db.procedure("PORTE3", "KSFO").unwrap();
        assert_eq!(sid.legs[1].path_terminator, PathTerminator::VI);
        assert_eq!(sid.legs[0].alt_desc, AltitudeDescriptor::AtOrAbove);
    }

    #[test]
    fn magnetic_courses_convert_with_declination() {
        let db = fixtures::navdata();
        let sfo = db.airport("ksfo").unwrap();
        assert!((sfo.to_true(355.0) - 8.0).abs() < 1e-9);
        assert_eq!(sfo.layout_node("Txy_A_01"), Some((37.6120, -122.3850)));
    }

    #[test]
    fn rejects_unknown_path_terminator() {
        let mut catalog = fixtures::catalog();
        catalog.procedures[0].legs[0].path_terminator = "QQ".into();
        let err = NavDatabase::from_config(&catalog).unwrap_err();
        assert!(matches!(err, NavDataError::UnknownPathTerminator { .. }));
    }
}
