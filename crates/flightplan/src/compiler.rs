//! Flight-plan compilation: route string to a resolved airborne route with TOC/TOD.

use thiserror::Error;
use tracing::{debug, warn};
use trajsim_adb::{AdbCatalog, AdbError, AdbIndex, PerformanceTable, climb_distance_ft, descent_distance_ft};
use trajsim_config::{FlightConfig, SimulationConfig};
use trajsim_geodesy::GeodesyError;

use crate::legs::LegResolver;
use crate::navdata::{Airport, NavDatabase};
use crate::route::{RouteError, is_runway_ident, parse_route};
use crate::taxi::{TaxiPlanError, TaxiSide, TaxiWaypoint, parse_taxi_plan};
use crate::toc_tod::{insert_top_of_climb, insert_top_of_descent, path_length_ft, truncate_middle};
use crate::types::{AltitudeDescriptor, FlightPlan, PathTerminator, ProcedureType, RoutePoint};

/// Height above the runway at which the prepended departure leg ends.
const INITIAL_CLIMB_FT: f64 = 1000.0;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error("taxi plan: {0}")]
    Taxi(#[from] TaxiPlanError),
    #[error(transparent)]
    Adb(#[from] AdbError),
    #[error(transparent)]
    Geodesy(#[from] GeodesyError),
    #[error("No intermediate airborne route points")]
    NoAirborneRoute,
    #[error("route is too short to fly from {altitude_ft} ft")]
    RouteTooShort { altitude_ft: f64 },
    #[error("departing runway {runway} not found at {airport}")]
    UnknownRunway { runway: String, airport: String },
    #[error("Cruise altitude can't be lower than {min_ft} ft; route of {path_ft:.0} ft is too short")]
    CruiseAltitudeTooLow { min_ft: f64, path_ft: f64 },
}

/// Compiler knobs taken from the run configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompilerSettings {
    pub min_cruise_altitude_ft: f64,
    pub max_flight_plan_length: usize,
    pub heading_leg_climb_divisor: f64,
}

impl From<&SimulationConfig> for CompilerSettings {
    fn from(config: &SimulationConfig) -> Self {
        Self {
            min_cruise_altitude_ft: config.min_cruise_altitude_ft,
            max_flight_plan_length: config.max_flight_plan_length,
            heading_leg_climb_divisor: config.heading_leg_climb_divisor,
        }
    }
}

impl Default for CompilerSettings {
    fn default() -> Self {
        Self::from(&SimulationConfig::default())
    }
}

/// Shared read-only inputs of a compilation.
#[derive(Debug, Clone, Copy)]
pub struct CompileContext<'a> {
    pub navdata: &'a NavDatabase,
    pub adb: &'a AdbCatalog,
    pub settings: CompilerSettings,
}

/// A flight ready to be turned into waypoint lists.
#[derive(Debug, Clone)]
pub struct CompiledFlight {
    pub plan: FlightPlan,
    pub adb_index: AdbIndex,
    pub departing_taxi: Vec<TaxiWaypoint>,
    pub landing_taxi: Vec<TaxiWaypoint>,
    /// Points removed to respect the route capacity.
    pub dropped_points: usize,
}

/// Compile one flight record.
pub fn compile_flight(flight: &FlightConfig, ctx: &CompileContext<'_>) -> Result<CompiledFlight, CompileError> {
    let callsign = flight.callsign.as_str();
    let parsed = parse_route(&flight.route, ctx.navdata)?;
    let origin = airport(ctx.navdata, &parsed.origin)?;
    let destination = airport(ctx.navdata, &parsed.destination)?;
    let adb_index = ctx.adb.resolve(&flight.actype)?;
    let table = ctx.adb.table(adb_index);

    let departing_taxi = match &parsed.departing_taxi_plan {
        Some(text) => parse_taxi_plan(text, origin, parsed.departing_runway.as_deref(), TaxiSide::Departing)?,
        None => Vec::new(),
    };
    let landing_taxi = match &parsed.landing_taxi_plan {
        Some(text) => parse_taxi_plan(text, destination, parsed.landing_runway.as_deref(), TaxiSide::Landing)?,
        None => Vec::new(),
    };

    if parsed.points.is_empty() {
        return Err(CompileError::NoAirborneRoute);
    }
    if parsed.points.len() < 2
        && !parsed.points[0].is_runway()
        && destination.elevation_ft < flight.altitude_ft
    {
        return Err(CompileError::RouteTooShort {
            altitude_ft: flight.altitude_ft,
        });
    }

    let initial_target = parsed
        .departing_runway
        .clone()
        .filter(|_| !parsed.airborne_start);
    let route = match &initial_target {
        Some(runway) => prepend_runway(&parsed.points, origin, runway)?,
        None => parsed.points.clone(),
    };

    let start_alt = flight.altitude_ft.max(origin.elevation_ft);
    let route = LegResolver::new(table, ctx.navdata, ctx.settings.heading_leg_climb_divisor)
        .resolve(&route, start_alt, callsign)?;

    let (route, dropped_points) = truncate_middle(&route, ctx.settings.max_flight_plan_length.saturating_sub(2));
    if dropped_points > 0 {
        warn!(%callsign, dropped_points, "route exceeds capacity; points dropped from the middle");
    }

    let first_type = route.first().map_or(ProcedureType::Enroute, |p| p.proctype);
    let climb_from = match first_type {
        ProcedureType::Sid => origin.elevation_ft,
        _ => start_alt,
    };
    let profile = VerticalProfile {
        table,
        climb_from_ft: climb_from,
        destination_elevation_ft: destination.elevation_ft,
        climbs: !matches!(first_type, ProcedureType::Star | ProcedureType::Approach),
        descends: first_type != ProcedureType::Approach,
    };

    let path_ft = path_length_ft(&route);
    let mut cruise_alt = flight.cruise_altitude_ft.min(table.max_altitude_ft());
    if cruise_alt < flight.cruise_altitude_ft {
        warn!(%callsign, requested = flight.cruise_altitude_ft, cruise_alt, "cruise altitude capped at aircraft ceiling");
    }
    let (mut climb_ft, mut descent_ft) = profile.distances(cruise_alt)?;
    if path_ft < climb_ft + descent_ft {
        let step_down = table
            .altitudes()
            .iter()
            .rev()
            .copied()
            .filter(|alt| *alt < cruise_alt);
        let mut fitted = false;
        for alt in step_down {
            if alt < ctx.settings.min_cruise_altitude_ft {
                break;
            }
            let (c, d) = profile.distances(alt)?;
            if path_ft >= c + d {
                (cruise_alt, climb_ft, descent_ft, fitted) = (alt, c, d, true);
                break;
            }
        }
        if !fitted {
            return Err(CompileError::CruiseAltitudeTooLow {
                min_ft: ctx.settings.min_cruise_altitude_ft,
                path_ft,
            });
        }
        warn!(%callsign, cruise_alt, "cruise altitude lowered to fit the route");
    }

    let (route, toc_index) = if climb_ft > 0.0 {
        insert_top_of_climb(&route, climb_ft, cruise_alt)
    } else {
        (route, None)
    };
    let (route, tod_index) = if descent_ft > 0.0 {
        insert_top_of_descent(&route, descent_ft, cruise_alt, toc_index)
    } else {
        (route, None)
    };

    let cruise_tas_knots = match flight.cruise_tas_knots {
        Some(tas) => tas,
        None => table.cruise_tas(cruise_alt)?,
    };

    debug!(
        %callsign,
        points = route.len(),
        cruise_alt,
        cruise_tas_knots,
        ?toc_index,
        ?tod_index,
        "compiled flight plan"
    );

    Ok(CompiledFlight {
        plan: FlightPlan {
            route_string: flight.route.clone(),
            origin: origin.code.clone(),
            origin_name: origin.name.clone(),
            origin_lat_deg: origin.lat_deg,
            origin_lon_deg: origin.lon_deg,
            origin_elevation_ft: origin.elevation_ft,
            destination: destination.code.clone(),
            destination_name: destination.name.clone(),
            destination_lat_deg: destination.lat_deg,
            destination_lon_deg: destination.lon_deg,
            destination_elevation_ft: destination.elevation_ft,
            departing_runway: parsed.departing_runway,
            landing_runway: parsed.landing_runway,
            departing_taxi_plan: parsed.departing_taxi_plan,
            landing_taxi_plan: parsed.landing_taxi_plan,
            initial_target,
            route,
            toc_index,
            tod_index,
            cruise_altitude_ft: cruise_alt,
            cruise_tas_knots,
            climb_distance_ft: climb_ft,
            descent_distance_ft: descent_ft,
        },
        adb_index,
        departing_taxi,
        landing_taxi,
        dropped_points,
    })
}

fn airport<'a>(navdata: &'a NavDatabase, code: &str) -> Result<&'a Airport, CompileError> {
    navdata
        .airport(code)
        .ok_or_else(|| RouteError::UnknownAirport(code.to_string()).into())
}

struct VerticalProfile<'a> {
    table: &'a PerformanceTable,
    climb_from_ft: f64,
    destination_elevation_ft: f64,
    climbs: bool,
    descends: bool,
}

impl VerticalProfile<'_> {
    /// Climb and descent distances (ft) for a candidate cruise altitude.
    fn distances(&self, cruise_alt_ft: f64) -> Result<(f64, f64), AdbError> {
        let climb = if self.climbs {
            climb_distance_ft(self.table, self.climb_from_ft, cruise_alt_ft)?
        } else {
            0.0
        };
        let descent = if self.descends {
            descent_distance_ft(self.table, self.destination_elevation_ft, cruise_alt_ft)?
        } else {
            0.0
        };
        Ok((climb, descent))
    }
}

/// Prepend the departure runway and an initial heading-to-altitude leg when the route
/// does not already start on a runway.
fn prepend_runway(points: &[RoutePoint], origin: &Airport, runway: &str) -> Result<Vec<RoutePoint>, CompileError> {
    if points.first().is_some_and(RoutePoint::is_runway) || !is_runway_ident(runway) {
        return Ok(points.to_vec());
    }
    let rw = origin.runway(runway).ok_or_else(|| CompileError::UnknownRunway {
        runway: runway.to_string(),
        airport: origin.code.clone(),
    })?;
    let mut threshold = RoutePoint::enroute(&format!("{}-{}", rw.name, origin.code), rw.lat_deg, rw.lon_deg);
    threshold.alt_ft = Some(origin.elevation_ft);
    threshold.alt_desc = AltitudeDescriptor::AtOrAbove;
    threshold.alt_1_ft = Some(origin.elevation_ft + INITIAL_CLIMB_FT);
    threshold.course_true_deg = Some(rw.true_heading_deg);
    threshold.path_terminator = Some(PathTerminator::VA);
    threshold.proctype = ProcedureType::Sid;
    threshold.procedure_name = points.first().map(|p| p.procedure_name.clone()).unwrap_or_default();

    Ok(std::iter::once(threshold).chain(points.iter().cloned()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navdata::fixtures;
    use trajsim_core::constants::{TOP_OF_CLIMB_PT, TOP_OF_DESCENT_PT};

    const DEP_TAXI: &str = r#"<{"id":"Gate_A5"},{"id":"Txy_A_01"},{"id":"Txy_A_02"},{"id":"Rwy_01R_001"}>"#;
    const ARR_TAXI: &str = r#"<{"id":"Rwy_24R_001"},{"id":"Txy_B_01"},{"id":"Gate_32"}>"#;

    fn compile(route: &str) -> Result<CompiledFlight, CompileError> {
        let db = fixtures::navdata();
        let adb = fixtures::adb();
        let ctx = CompileContext {
            navdata: &db,
            adb: &adb,
            settings: CompilerSettings::default(),
        };
        compile_flight(&fixtures::flight(route), &ctx)
    }

    #[test]
    fn compiles_gate_to_gate_flight() {
        let route = format!("KSFO.{DEP_TAXI}.RW01R.PORTE3.BSR.RZS.SADDE6.I24R.RW24R.{ARR_TAXI}.KLAX");
        let compiled = compile(&route).unwrap();
        let plan = &compiled.plan;
        assert_eq!(plan.initial_target.as_deref(), Some("RW01R"));
        assert_eq!(compiled.departing_taxi.len(), 4);
        assert_eq!(compiled.landing_taxi.len(), 3);
        assert_eq!(plan.cruise_altitude_ft, 33000.0);
        assert!(plan.cruise_tas_knots > 430.0 && plan.cruise_tas_knots < 450.0);

        let toc = plan.toc_index.unwrap();
        let tod = plan.tod_index.unwrap();
        assert!(0 < toc && toc < tod && tod < plan.route.len() - 1);
        assert_eq!(plan.route[toc].name, TOP_OF_CLIMB_PT);
        assert_eq!(plan.route[tod].name, TOP_OF_DESCENT_PT);
        assert!(plan.route.iter().all(|p| !p.floating));
        assert!(plan.route.len() <= CompilerSettings::default().max_flight_plan_length);
        assert_eq!(plan.route.last().unwrap().name, "RW24R");
    }

    #[test]
    fn runway_start_without_sid_gets_initial_climb_leg() {
        let compiled = compile("KSFO.RW01R.BSR.RZS.SADDE6.I24R.KLAX").unwrap();
        let names: Vec<&str> = compiled.plan.route.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names[0], "RW01R-KSFO");
        assert_eq!(names[1], "HEADING OR COURSE_TO_ALTITUDE_RW01R-KSFO");
        assert_eq!(compiled.plan.route[1].alt_ft, Some(1013.0));
    }

    #[test]
    fn short_route_steps_cruise_down_through_table_rows() {
        // About 114 nm: too short for FL330 or FL300, long enough for FL200.
        let compiled = compile("KSFO.RW01R.PORTE3.SJC.BSR.KLAX").unwrap();
        let plan = &compiled.plan;
        assert_eq!(plan.cruise_altitude_ft, 20000.0);
        assert!(plan.climb_distance_ft + plan.descent_distance_ft <= plan.path_length_ft() + 1.0);
        assert!(plan.toc_index.unwrap() < plan.tod_index.unwrap());
    }

    #[test]
    fn route_too_short_for_minimum_cruise_is_rejected() {
        let err = compile("KSFO.RW01R.PORTE3.KLAX").unwrap_err();
        assert!(matches!(err, CompileError::CruiseAltitudeTooLow { .. }), "{err}");
    }

    #[test]
    fn airborne_start_skips_runway_and_taxi() {
        let compiled = compile("KSFO./.RZS.SADDE6.I24R.KLAX").unwrap();
        assert!(compiled.plan.initial_target.is_none());
        assert!(compiled.departing_taxi.is_empty());
        assert_eq!(compiled.plan.route[0].name, "RZS");
    }

    #[test]
    fn malformed_taxi_plan_rejects_flight() {
        let route = r#"KSFO.<{"id":"Gate_A5"},{"id":"Txy_A_01",{"id":"Rwy_01R_001"}>.RW01R.PORTE3.BSR.KLAX"#;
        let err = compile(route).unwrap_err();
        assert!(matches!(err, CompileError::Taxi(TaxiPlanError::MissingCloseBrace)));
    }

    #[test]
    fn unknown_aircraft_type_rejects_flight() {
        let db = fixtures::navdata();
        let adb = fixtures::adb();
        let ctx = CompileContext {
            navdata: &db,
            adb: &adb,
            settings: CompilerSettings::default(),
        };
        let mut flight = fixtures::flight("KSFO.RW01R.BSR.KLAX");
        flight.actype = "ZZZZ".into();
        assert!(matches!(
            compile_flight(&flight, &ctx),
            Err(CompileError::Adb(AdbError::TypeNotFound(_)))
        ));
        flight.actype = "b737".into();
        assert!(compile_flight(&flight, &ctx).is_ok());
    }

    #[test]
    fn waypoint_edits_move_one_point() {
        let mut plan = compile("KSFO.RW01R.PORTE3.BSR.RZS.SADDE6.I24R.KLAX").unwrap().plan;
        let before = plan.route[2].clone();
        plan.set_waypoint_position(2, 37.0, -122.0).unwrap();
        assert_eq!(plan.route[2].lat_deg, 37.0);
        assert_eq!(plan.route[2].name, before.name);
        assert!(plan.set_waypoint_position(999, 0.0, 0.0).is_err());
    }
}
