//! Batch loading: compile, build waypoint lists, and initialize every flight.

use std::sync::{Mutex, PoisonError};

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use trajsim_adb::{AdbIndex, MassCategory};
use trajsim_config::{FlightConfig, SimulationConfig};
use trajsim_flightplan::{CompileContext, CompileError, FlightPlan, compile_flight};
use trajsim_waypoints::{FlightWaypoints, ListKind};

use crate::init::{InitError, InitialPosition, InitialTarget, initialize_phase};
use crate::{AircraftState, FlightPhase};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Init(#[from] InitError),
}

/// Immutable per-flight data used during propagation.
#[derive(Debug, Clone)]
pub struct Flight {
    pub callsign: String,
    pub actype: String,
    pub departure_time_s: f64,
    pub plan: FlightPlan,
    pub waypoints: FlightWaypoints,
    pub adb_index: AdbIndex,
    pub mass: MassCategory,
    /// Phase and target entered once the flight leaves PREDEPARTURE.
    pub entry: InitialTarget,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub total: usize,
    pub ignored: usize,
    pub valid: usize,
}

/// A flight dropped at load time, with the reason it was ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightRejection {
    pub callsign: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct LoadedFlights {
    pub flights: Vec<Flight>,
    pub states: Vec<AircraftState>,
    pub rejections: Vec<FlightRejection>,
    pub report: LoadReport,
}

/// Prepare every flight in parallel. Rejected flights are logged, counted, and left out.
pub fn load_flights(
    configs: &[FlightConfig],
    ctx: &CompileContext<'_>,
    config: &SimulationConfig,
) -> LoadedFlights {
    let ignored = Mutex::new(0usize);
    let results: Vec<Result<(Flight, AircraftState), FlightRejection>> = configs
        .par_iter()
        .map(|flight| {
            prepare_flight(flight, ctx, config).map_err(|e| {
                warn!(callsign = %flight.callsign, error = %e, "flight ignored");
                *ignored.lock().unwrap_or_else(PoisonError::into_inner) += 1;
                FlightRejection {
                    callsign: flight.callsign.clone(),
                    reason: e.to_string(),
                }
            })
        })
        .collect();

    let mut loaded = LoadedFlights::default();
    for result in results {
        match result {
            Ok((flight, state)) => {
                loaded.flights.push(flight);
                loaded.states.push(state);
            }
            Err(rejection) => loaded.rejections.push(rejection),
        }
    }
    loaded.report = LoadReport {
        total: configs.len(),
        ignored: ignored.into_inner().unwrap_or_else(PoisonError::into_inner),
        valid: loaded.flights.len(),
    };
    loaded
}

fn prepare_flight(
    record: &FlightConfig,
    ctx: &CompileContext<'_>,
    config: &SimulationConfig,
) -> Result<(Flight, AircraftState), LoadError> {
    let compiled = compile_flight(record, ctx)?;
    let waypoints = FlightWaypoints::from_compiled(&compiled);
    let position = InitialPosition {
        lat_deg: record.latitude_deg,
        lon_deg: record.longitude_deg,
        alt_ft: record.altitude_ft,
    };
    let entry = initialize_phase(position, &compiled.plan, &waypoints, config.waypoint_tolerance_ft)?;
    debug!(
        callsign = %record.callsign,
        phase = %entry.phase,
        list = ?entry.list,
        index = entry.index,
        "initialized flight"
    );

    let toc_index = waypoints.airborne.toc_index();
    let tod_index = waypoints.airborne.tod_index();
    let passed = |marker: Option<usize>| match entry.list {
        ListKind::Departing => false,
        ListKind::Airborne => marker.is_some_and(|m| m < entry.index),
        ListKind::Landing => true,
    };
    let state = AircraftState {
        lat_deg: record.latitude_deg,
        lon_deg: record.longitude_deg,
        alt_ft: record.altitude_ft,
        rocd_fps: 0.0,
        tas_knots: record.tas_knots,
        ground_speed_knots: record.tas_knots,
        course_rad: record.course_deg.to_radians(),
        fpa_rad: 0.0,
        phase: if record.departure_time_s > 0.0 {
            FlightPhase::Predeparture
        } else {
            entry.phase
        },
        target_list: entry.list,
        target_index: Some(entry.index),
        cruise_alt_ft: compiled.plan.cruise_altitude_ft,
        cruise_tas_knots: compiled.plan.cruise_tas_knots,
        toc_index,
        tod_index,
        time_s: 0.0,
        landed: false,
        passed_toc: passed(toc_index),
        passed_tod: passed(tod_index),
    };
    let flight = Flight {
        callsign: record.callsign.clone(),
        actype: record.actype.clone(),
        departure_time_s: record.departure_time_s,
        plan: compiled.plan,
        waypoints,
        adb_index: compiled.adb_index,
        mass: record.mass_category.into(),
        entry,
    };
    Ok((flight, state))
}
