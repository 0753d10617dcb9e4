use std::fmt;
use std::str::FromStr;

use trajsim_core::constants::HEADING_OR_COURSE_PREFIX;

use crate::route::{RouteError, is_runway_ident};
use crate::toc_tod::path_length_ft;

/// Procedure family a route point belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcedureType {
    Sid,
    Enroute,
    Star,
    Approach,
}

impl fmt::Display for ProcedureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Sid => "SID",
            Self::Enroute => "ENROUTE",
            Self::Star => "STAR",
            Self::Approach => "APPROACH",
        })
    }
}

/// ARINC 424 leg path-and-terminator codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PathTerminator {
    /// Initial fix.
    IF,
    /// Track to fix.
    TF,
    /// Course to fix.
    CF,
    /// Direct to fix.
    DF,
    FA,
    FC,
    FD,
    FM,
    /// Course to altitude.
    CA,
    /// Course to DME distance.
    CD,
    /// Course to intercept.
    CI,
    /// Course to radial.
    CR,
    RF,
    AF,
    /// Heading to altitude.
    VA,
    /// Heading to DME distance.
    VD,
    /// Heading to intercept.
    VI,
    VM,
    /// Heading to radial.
    VR,
    PI,
    HA,
    HF,
    HM,
}

impl PathTerminator {
    /// Legs that end without a fix of their own and must be resolved geometrically.
    pub fn is_parametric(self) -> bool {
        matches!(
            self,
            Self::VA | Self::CA | Self::VD | Self::CD | Self::VR | Self::CR | Self::VI | Self::CI
        )
    }
}

impl FromStr for PathTerminator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "IF" => Self::IF,
            "TF" => Self::TF,
            "CF" => Self::CF,
            "DF" => Self::DF,
            "FA" => Self::FA,
            "FC" => Self::FC,
            "FD" => Self::FD,
            "FM" => Self::FM,
            "CA" => Self::CA,
            "CD" => Self::CD,
            "CI" => Self::CI,
            "CR" => Self::CR,
            "RF" => Self::RF,
            "AF" => Self::AF,
            "VA" => Self::VA,
            "VD" => Self::VD,
            "VI" => Self::VI,
            "VM" => Self::VM,
            "VR" => Self::VR,
            "PI" => Self::PI,
            "HA" => Self::HA,
            "HF" => Self::HF,
            "HM" => Self::HM,
            other => return Err(other.to_string()),
        })
    }
}

/// Altitude constraint descriptor (ARINC 424 §5.29).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AltitudeDescriptor {
    At,
    AtOrAbove,
    AtOrBelow,
    Between,
    #[default]
    Unconstrained,
}

impl FromStr for AltitudeDescriptor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "AT" | "@" => Self::At,
            "AT_OR_ABOVE" | "+" => Self::AtOrAbove,
            "AT_OR_BELOW" | "_" => Self::AtOrBelow,
            "BETWEEN" | "B" => Self::Between,
            "" | "NONE" => Self::Unconstrained,
            _ => return Err(s.to_string()),
        })
    }
}

/// Speed constraint descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpeedDescriptor {
    At,
    AtOrAbove,
    AtOrBelow,
    #[default]
    Unconstrained,
}

impl FromStr for SpeedDescriptor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "AT" | "@" => Self::At,
            "AT_OR_ABOVE" | "+" => Self::AtOrAbove,
            "AT_OR_BELOW" | "_" => Self::AtOrBelow,
            "" | "NONE" => Self::Unconstrained,
            _ => return Err(s.to_string()),
        })
    }
}

/// One point of a parsed or compiled route.
///
/// Constraints are `None` when unset. Courses and radials are stored as true bearings;
/// magnetic values from procedure data are converted when the route is parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePoint {
    pub name: String,
    pub lat_deg: f64,
    pub lon_deg: f64,
    /// Estimated altitude at this point, when known (runway elevation, synthetic points).
    pub alt_ft: Option<f64>,
    pub alt_desc: AltitudeDescriptor,
    pub alt_1_ft: Option<f64>,
    pub alt_2_ft: Option<f64>,
    pub speed_limit_knots: Option<f64>,
    pub speed_desc: SpeedDescriptor,
    pub procedure_name: String,
    pub proctype: ProcedureType,
    pub path_terminator: Option<PathTerminator>,
    pub recommended_navaid: Option<String>,
    pub course_true_deg: Option<f64>,
    pub theta_true_deg: Option<f64>,
    pub rho_nm: Option<f64>,
    pub distance_nm: Option<f64>,
    /// Leg has no fix of its own; its position is only the leg start.
    pub floating: bool,
}

impl RoutePoint {
    /// Plain en-route fix with no constraints.
    pub fn enroute(name: &str, lat_deg: f64, lon_deg: f64) -> Self {
        Self {
            name: name.to_string(),
            lat_deg,
            lon_deg,
            alt_ft: None,
            alt_desc: AltitudeDescriptor::Unconstrained,
            alt_1_ft: None,
            alt_2_ft: None,
            speed_limit_knots: None,
            speed_desc: SpeedDescriptor::Unconstrained,
            procedure_name: String::new(),
            proctype: ProcedureType::Enroute,
            path_terminator: None,
            recommended_navaid: None,
            course_true_deg: None,
            theta_true_deg: None,
            rho_nm: None,
            distance_nm: None,
            floating: false,
        }
    }

    /// Synthetic point derived from `parent`, carrying its procedure identity.
    pub fn synthetic(name: String, lat_deg: f64, lon_deg: f64, alt_ft: f64, parent: &Self) -> Self {
        Self {
            name,
            lat_deg,
            lon_deg,
            alt_ft: Some(alt_ft),
            procedure_name: parent.procedure_name.clone(),
            proctype: parent.proctype,
            ..Self::enroute("", lat_deg, lon_deg)
        }
    }

    pub fn is_runway(&self) -> bool {
        is_runway_ident(&self.name)
    }

    pub fn is_heading_or_course(&self) -> bool {
        self.name.starts_with(HEADING_OR_COURSE_PREFIX)
    }

    /// Best available altitude: the estimate, else the first constraint value.
    pub fn altitude_estimate_ft(&self) -> Option<f64> {
        self.alt_ft.or(self.alt_1_ft)
    }
}

/// A flight's compiled plan: endpoints, surface segments, and the resolved airborne route.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightPlan {
    pub route_string: String,
    pub origin: String,
    pub origin_name: String,
    pub origin_lat_deg: f64,
    pub origin_lon_deg: f64,
    pub origin_elevation_ft: f64,
    pub destination: String,
    pub destination_name: String,
    pub destination_lat_deg: f64,
    pub destination_lon_deg: f64,
    pub destination_elevation_ft: f64,
    pub departing_runway: Option<String>,
    pub landing_runway: Option<String>,
    pub departing_taxi_plan: Option<String>,
    pub landing_taxi_plan: Option<String>,
    pub initial_target: Option<String>,
    pub route: Vec<RoutePoint>,
    pub toc_index: Option<usize>,
    pub tod_index: Option<usize>,
    pub cruise_altitude_ft: f64,
    pub cruise_tas_knots: f64,
    pub climb_distance_ft: f64,
    pub descent_distance_ft: f64,
}

impl FlightPlan {
    /// Sum of great-circle leg lengths along the route (ft).
    pub fn path_length_ft(&self) -> f64 {
        path_length_ft(&self.route)
    }

    /// Move one waypoint. Derived quantities such as TOC/TOD are left untouched.
    pub fn set_waypoint_position(
        &mut self,
        index: usize,
        lat_deg: f64,
        lon_deg: f64,
    ) -> Result<(), RouteError> {
        let len = self.route.len();
        let point = self
            .route
            .get_mut(index)
            .ok_or(RouteError::IndexOutOfRange { index, len })?;
        point.lat_deg = lat_deg;
        point.lon_deg = lon_deg;
        Ok(())
    }
}
