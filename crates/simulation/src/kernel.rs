//! Per-flight propagation step.

use std::f64::consts::FRAC_PI_2;

use tracing::warn;
use trajsim_adb::{AdbCatalog, AdbError};
use trajsim_config::SimulationConfig;
use trajsim_core::angle::abs_diff_rad;
use trajsim_core::constants::TRACON_ALT_FT;
use trajsim_core::units::{fpm_to_fps, knots_to_fps};
use trajsim_flightplan::SpeedDescriptor;
use trajsim_geodesy::{destination, distance_ft, heading_rad};
use trajsim_waypoints::{ListKind, WaypointNode};

use crate::init::is_ramp_or_gate;
use crate::{AircraftState, Flight, FlightPhase, Trajectory};

/// Upper bound on nodes captured in one tick.
const MAX_CAPTURES_PER_TICK: usize = 256;
/// Height above the origin at which the takeoff phase ends.
const TAKEOFF_CLIMB_FT: f64 = 1000.0;
/// Cap on the final-approach glide rate, as a multiple of the table descent rate.
const MAX_GLIDE_FACTOR: f64 = 2.0;

pub(crate) struct KernelEnv<'a> {
    pub adb: &'a AdbCatalog,
    pub config: &'a SimulationConfig,
}

/// Advance one flight by one tick and record the resulting sample.
///
/// Inactive flights are left untouched and record nothing.
pub(crate) fn advance(flight: &Flight, st: &mut AircraftState, traj: &mut Trajectory, env: &KernelEnv<'_>) {
    if !st.is_active(env.config.duration_s) {
        return;
    }
    let dt = if st.phase.is_airborne() {
        env.config.airborne_step_s
    } else {
        env.config.surface_step_s
    };
    let result = match st.phase {
        FlightPhase::Predeparture => {
            if st.time_s + dt >= flight.departure_time_s {
                st.phase = flight.entry.phase;
            }
            Ok(())
        }
        phase if phase.is_surface() => {
            surface_step(flight, st, dt, env);
            Ok(())
        }
        _ => airborne_step(flight, st, dt, env),
    };
    st.time_s += dt;
    if let Err(e) = result {
        warn!(callsign = %flight.callsign, error = %e, "propagation stopped");
        park(st);
    }
    traj.record(st);
}

fn target_node<'a>(flight: &'a Flight, st: &AircraftState) -> Option<&'a WaypointNode> {
    st.target_index
        .and_then(|i| flight.waypoints.list(st.target_list).get(i))
}

fn targets_final_airborne(flight: &Flight, st: &AircraftState) -> bool {
    st.target_list == ListKind::Airborne
        && st.target_index.is_some()
        && st.target_index == flight.waypoints.airborne.final_index()
}

fn distance_to(st: &AircraftState, node: &WaypointNode) -> f64 {
    distance_ft(st.lat_deg, st.lon_deg, node.lat_deg, node.lon_deg, 0.0)
}

fn move_toward(st: &mut AircraftState, node: &WaypointNode, range_ft: f64) {
    let course = heading_rad(st.lat_deg, st.lon_deg, node.lat_deg, node.lon_deg);
    let (lat, lon) = destination(st.lat_deg, st.lon_deg, course, range_ft, 0.0);
    st.lat_deg = lat;
    st.lon_deg = lon;
    st.course_rad = course;
}

fn snap_to(st: &mut AircraftState, node: &WaypointNode) {
    if distance_to(st, node) > 0.0 {
        st.course_rad = heading_rad(st.lat_deg, st.lon_deg, node.lat_deg, node.lon_deg);
    }
    st.lat_deg = node.lat_deg;
    st.lon_deg = node.lon_deg;
}

/// Aircraft already beyond `node` along its inbound leg.
fn passed_abeam(flight: &Flight, st: &AircraftState, node: &WaypointNode) -> bool {
    let list = flight.waypoints.list(st.target_list);
    let Some(inbound) = node
        .prev()
        .and_then(|p| list.get(p))
        .and_then(|p| p.course_rad_to_next_node)
    else {
        return false;
    };
    if distance_to(st, node) == 0.0 {
        return true;
    }
    let bearing = heading_rad(node.lat_deg, node.lon_deg, st.lat_deg, st.lon_deg);
    abs_diff_rad(bearing, inbound) < FRAC_PI_2
}

fn park(st: &mut AircraftState) {
    st.landed = true;
    st.target_index = None;
    st.tas_knots = 0.0;
    st.ground_speed_knots = 0.0;
    st.rocd_fps = 0.0;
    st.fpa_rad = 0.0;
}

fn surface_step(flight: &Flight, st: &mut AircraftState, dt: f64, env: &KernelEnv<'_>) {
    let speed = if st.phase.uses_ramp_speed() {
        env.config.ramp_speed_knots
    } else {
        env.config.taxi_speed_knots
    };
    st.tas_knots = speed;
    st.ground_speed_knots = speed;
    st.rocd_fps = 0.0;
    st.fpa_rad = 0.0;

    let mut remaining = knots_to_fps(speed) * dt;
    for _ in 0..MAX_CAPTURES_PER_TICK {
        let Some(node) = target_node(flight, st) else {
            leave_list(flight, st, env);
            break;
        };
        let d = distance_to(st, node);
        if d > remaining {
            move_toward(st, node, remaining);
            break;
        }
        snap_to(st, node);
        remaining -= d;
        capture(flight, st, env);
        if st.landed || st.phase.is_airborne() {
            break;
        }
    }
}

fn airborne_step(flight: &Flight, st: &mut AircraftState, dt: f64, env: &KernelEnv<'_>) -> Result<(), AdbError> {
    let Some(node) = target_node(flight, st) else {
        leave_list(flight, st, env);
        return Ok(());
    };
    let table = env.adb.table(flight.adb_index);
    let alt = st.alt_ft.max(0.0);
    let phase = st.phase;
    let dest_elev = flight.plan.destination_elevation_ft;

    let mut tas = if phase.is_climbing() {
        table.climb_tas(alt)?
    } else if phase.is_descending() {
        table.descent_tas(alt)?
    } else {
        st.cruise_tas_knots
    };
    if let (Some(limit), SpeedDescriptor::At | SpeedDescriptor::AtOrBelow) =
        (node.speed_limit_knots, node.speed_desc)
    {
        tas = tas.min(limit);
    }
    let v = knots_to_fps(tas);

    let final_target = targets_final_airborne(flight, st);
    let new_alt = if phase.is_climbing() || (phase == FlightPhase::Cruise && alt < st.cruise_alt_ft) {
        let rate = fpm_to_fps(table.climb_rate(alt, flight.mass)?);
        alt + (rate * dt).min((st.cruise_alt_ft - alt).max(0.0))
    } else if phase.is_descending() {
        let floor = if final_target {
            dest_elev
        } else {
            node.altitude_estimate_ft.unwrap_or(dest_elev).max(dest_elev)
        };
        let table_rate = fpm_to_fps(table.descent_rate(alt)?);
        let mut rate = table_rate;
        if phase == FlightPhase::FinalApproach {
            // Steepen toward the runway node if the table rate would arrive high.
            let d = distance_to(st, node).max(1.0);
            rate = rate
                .max((alt - floor).max(0.0) * v / d)
                .min(MAX_GLIDE_FACTOR * table_rate);
        }
        if alt <= floor {
            alt
        } else {
            (alt - rate * dt).max(floor)
        }
    } else {
        alt
    };
    let dh = new_alt - alt;

    st.tas_knots = tas;
    st.ground_speed_knots = tas;
    st.rocd_fps = dh / dt;
    st.fpa_rad = if v > 0.0 {
        (st.rocd_fps / v).clamp(-1.0, 1.0).asin()
    } else {
        0.0
    };
    st.alt_ft = new_alt;

    let mut remaining = v * st.fpa_rad.cos() * dt;
    for _ in 0..MAX_CAPTURES_PER_TICK {
        let Some(node) = target_node(flight, st) else {
            leave_list(flight, st, env);
            break;
        };
        let d = distance_to(st, node);
        // The runway node is captured only once the aircraft is down.
        let holding = targets_final_airborne(flight, st) && st.alt_ft > dest_elev;
        if d <= remaining {
            snap_to(st, node);
            if holding {
                break;
            }
            remaining -= d;
        } else if holding || !passed_abeam(flight, st, node) {
            move_toward(st, node, remaining);
            break;
        }
        capture(flight, st, env);
        if !st.phase.is_airborne() {
            break;
        }
    }

    if st.phase.is_airborne() {
        update_airborne_phase(flight, st);
    }
    Ok(())
}

/// The current target has been reached: mark TOC/TOD, then move to the next node.
fn capture(flight: &Flight, st: &mut AircraftState, env: &KernelEnv<'_>) {
    if st.target_list == ListKind::Airborne {
        if st.target_index.is_some() && st.target_index == st.toc_index {
            st.passed_toc = true;
        }
        if st.target_index.is_some() && st.target_index == st.tod_index {
            st.passed_tod = true;
        }
    }
    let next = target_node(flight, st).and_then(WaypointNode::next);
    match next {
        Some(n) => {
            st.target_index = Some(n);
            let name = flight
                .waypoints
                .list(st.target_list)
                .get(n)
                .map_or("", |node| node.name.as_str());
            match st.target_list {
                ListKind::Departing => {
                    st.phase = if name.starts_with("Ramp") {
                        FlightPhase::RampDeparting
                    } else {
                        FlightPhase::TaxiDeparting
                    };
                }
                ListKind::Landing => {
                    st.phase = if is_ramp_or_gate(name) {
                        FlightPhase::RampArriving
                    } else {
                        FlightPhase::TaxiArriving
                    };
                }
                ListKind::Airborne => {}
            }
        }
        None => leave_list(flight, st, env),
    }
}

/// The current list is exhausted.
fn leave_list(flight: &Flight, st: &mut AircraftState, env: &KernelEnv<'_>) {
    match st.target_list {
        ListKind::Departing if !flight.waypoints.airborne.is_empty() => {
            let airborne = &flight.waypoints.airborne;
            let first_ahead = airborne
                .iter()
                .position(|n| distance_to(st, n) > env.config.waypoint_tolerance_ft)
                .or(airborne.final_index());
            st.target_list = ListKind::Airborne;
            st.target_index = first_ahead;
            st.phase = FlightPhase::Takeoff;
        }
        ListKind::Departing | ListKind::Airborne => {
            touchdown(flight, st);
            if !st.landed {
                st.target_list = ListKind::Landing;
                st.target_index = flight.waypoints.landing.head();
            }
        }
        ListKind::Landing => park(st),
    }
}

fn touchdown(flight: &Flight, st: &mut AircraftState) {
    st.phase = FlightPhase::Land;
    st.alt_ft = flight.plan.destination_elevation_ft;
    st.rocd_fps = 0.0;
    st.fpa_rad = 0.0;
    if flight.waypoints.landing.is_empty() {
        park(st);
    }
}

fn update_airborne_phase(flight: &Flight, st: &mut AircraftState) {
    let plan = &flight.plan;
    let alt = st.alt_ft;
    if st.phase == FlightPhase::Takeoff && alt >= plan.origin_elevation_ft + TAKEOFF_CLIMB_FT {
        st.phase = FlightPhase::Climbout;
    }
    if st.phase == FlightPhase::Climbout && alt >= TRACON_ALT_FT {
        st.phase = FlightPhase::ClimbToCruiseAltitude;
    }
    if st.phase.is_climbing() && st.passed_toc {
        st.phase = FlightPhase::Cruise;
    }
    if st.phase == FlightPhase::ClimbToCruiseAltitude && alt >= st.cruise_alt_ft {
        st.phase = FlightPhase::Cruise;
    }
    if (st.phase.is_climbing() || st.phase == FlightPhase::Cruise)
        && (st.passed_tod || targets_final_airborne(flight, st))
    {
        st.phase = FlightPhase::InitialDescent;
    }
    if st.phase == FlightPhase::InitialDescent && alt < TRACON_ALT_FT {
        st.phase = FlightPhase::Approach;
    }
    if st.phase == FlightPhase::Approach && targets_final_airborne(flight, st) {
        st.phase = FlightPhase::FinalApproach;
    }
    if st.phase == FlightPhase::FinalApproach && alt <= plan.destination_elevation_ft {
        touchdown(flight, st);
    }
}
