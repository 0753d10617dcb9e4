//! Initial flight phase and target waypoint, decided once at load time.

use thiserror::Error;
use trajsim_core::angle::abs_diff_rad;
use trajsim_core::constants::TRACON_ALT_FT;
use trajsim_flightplan::{FlightPlan, ProcedureType};
use trajsim_geodesy::{distance_ft, heading_rad};
use trajsim_waypoints::{FlightWaypoints, ListKind, WaypointList};

use crate::FlightPhase;

#[derive(Debug, Error, PartialEq)]
pub enum InitError {
    #[error("Altitude value is not valid: {0} ft")]
    InvalidAltitude(f64),
    #[error("initial altitude {altitude_ft} ft is inconsistent with a {proctype} start: {reason}")]
    InconsistentAltitude {
        altitude_ft: f64,
        proctype: ProcedureType,
        reason: &'static str,
    },
    #[error("no waypoint list yields a target")]
    NoTarget,
}

/// Where propagation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitialTarget {
    pub phase: FlightPhase,
    pub list: ListKind,
    pub index: usize,
}

/// Initial aircraft position used for phase inference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialPosition {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_ft: f64,
}

/// Pick the initial phase and target.
///
/// The departing surface list is tried first, then the airborne list by the procedure
/// type of its first node, then the landing surface list. An approach start exactly at
/// destination elevation yields no airborne target and falls through to the landing list.
/// Results depend only on the inputs.
pub fn initialize_phase(
    pos: InitialPosition,
    plan: &FlightPlan,
    waypoints: &FlightWaypoints,
    tolerance_ft: f64,
) -> Result<InitialTarget, InitError> {
    let alt = pos.alt_ft;
    if !waypoints.departing.is_empty() && (0.0..=plan.origin_elevation_ft).contains(&alt) {
        return Ok(departing(pos, &waypoints.departing, tolerance_ft));
    }
    if let Some(first) = waypoints.airborne.get(0) {
        let proctype = first.proctype.unwrap_or(ProcedureType::Enroute);
        if let Some(target) = airborne(pos, plan, &waypoints.airborne, proctype)? {
            return Ok(target);
        }
    }
    if !waypoints.landing.is_empty() {
        if alt < 0.0 {
            return Err(InitError::InvalidAltitude(alt));
        }
        let index = skip_if_at_first(pos, &waypoints.landing, tolerance_ft);
        let name = node_name(&waypoints.landing, index);
        let phase = if name.starts_with("Rwy") {
            FlightPhase::Land
        } else if is_ramp_or_gate(name) {
            FlightPhase::RampArriving
        } else {
            FlightPhase::TaxiArriving
        };
        return Ok(InitialTarget {
            phase,
            list: ListKind::Landing,
            index,
        });
    }
    Err(InitError::NoTarget)
}

fn departing(pos: InitialPosition, list: &WaypointList, tolerance_ft: f64) -> InitialTarget {
    let index = skip_if_at_first(pos, list, tolerance_ft);
    let first = node_name(list, 0);
    let at_gate = index > 0 && (first.starts_with("Gate") || first.starts_with("Parking"));
    let phase = if at_gate {
        FlightPhase::OriginGate
    } else if node_name(list, index).starts_with("Ramp") {
        FlightPhase::RampDeparting
    } else {
        FlightPhase::TaxiDeparting
    };
    InitialTarget {
        phase,
        list: ListKind::Departing,
        index,
    }
}

fn airborne(
    pos: InitialPosition,
    plan: &FlightPlan,
    list: &WaypointList,
    proctype: ProcedureType,
) -> Result<Option<InitialTarget>, InitError> {
    let alt = pos.alt_ft;
    let inconsistent = |reason| InitError::InconsistentAltitude {
        altitude_ft: alt,
        proctype,
        reason,
    };
    let target = |phase, index| {
        Some(InitialTarget {
            phase,
            list: ListKind::Airborne,
            index,
        })
    };
    // Second node, when the list has one.
    let second = 1.min(list.len() - 1);

    match proctype {
        ProcedureType::Sid => {
            if alt < plan.origin_elevation_ft {
                return Err(inconsistent("below origin elevation"));
            }
            let first = node_name(list, 0);
            if alt == plan.origin_elevation_ft {
                return Ok(match plan.departing_runway.as_deref() {
                    Some(runway) if first.contains(runway) => {
                        let phase = if node_name(list, 1).contains("HEADING") {
                            FlightPhase::Takeoff
                        } else {
                            FlightPhase::Climbout
                        };
                        target(phase, second)
                    }
                    Some(_) => target(FlightPhase::Climbout, 0),
                    None => {
                        let index = if first.contains("RW") { second } else { 0 };
                        target(FlightPhase::Climbout, index)
                    }
                });
            }
            if alt < TRACON_ALT_FT {
                let index = if first.starts_with("RW") { second } else { 0 };
                Ok(target(FlightPhase::Climbout, index))
            } else {
                Ok(target(FlightPhase::ClimbToCruiseAltitude, 0))
            }
        }
        ProcedureType::Enroute => {
            if alt <= plan.origin_elevation_ft || alt <= plan.destination_elevation_ft {
                return Err(inconsistent("at or below airport elevation"));
            }
            if alt < TRACON_ALT_FT {
                return Err(inconsistent("below the terminal-area ceiling"));
            }
            let phase = if alt < plan.cruise_altitude_ft {
                FlightPhase::ClimbToCruiseAltitude
            } else {
                FlightPhase::Cruise
            };
            Ok(target(phase, 0))
        }
        ProcedureType::Star => {
            if alt <= plan.destination_elevation_ft {
                return Err(inconsistent("at or below destination elevation"));
            }
            if alt < TRACON_ALT_FT {
                return Err(inconsistent("below the terminal-area ceiling"));
            }
            let phase = if alt == plan.cruise_altitude_ft {
                FlightPhase::Cruise
            } else {
                FlightPhase::InitialDescent
            };
            Ok(target(phase, 0))
        }
        ProcedureType::Approach => {
            if alt < plan.destination_elevation_ft {
                return Err(inconsistent("below destination elevation"));
            }
            if alt == plan.destination_elevation_ft {
                return Ok(None);
            }
            Ok(target(FlightPhase::FinalApproach, 0))
        }
    }
}

/// Index 1 when the aircraft already sits on the first node, else 0.
fn skip_if_at_first(pos: InitialPosition, list: &WaypointList, tolerance_ft: f64) -> usize {
    match list.get(0) {
        Some(first)
            if list.len() > 1
                && distance_ft(pos.lat_deg, pos.lon_deg, first.lat_deg, first.lon_deg, 0.0)
                    <= tolerance_ft =>
        {
            1
        }
        _ => 0,
    }
}

fn node_name(list: &WaypointList, index: usize) -> &str {
    list.get(index).map_or("", |n| n.name.as_str())
}

pub(crate) fn is_ramp_or_gate(name: &str) -> bool {
    name.starts_with("Ramp") || name.starts_with("Gate") || name.starts_with("Parking")
}

/// Node the aircraft has most clearly passed.
///
/// Within `tolerance_ft` of the first node the second node is returned. Otherwise every
/// node from the second up to the one before the last is scored by the angular
/// deviation between its outbound course and the bearing from the node to the aircraft,
/// and the node with the largest deviation wins. `None` for an empty list, a list too
/// short to score, or when no node deviates at all.
pub fn target_waypoint_node(
    list: &WaypointList,
    lat_deg: f64,
    lon_deg: f64,
    tolerance_ft: f64,
) -> Option<usize> {
    let first = list.get(0)?;
    if distance_ft(lat_deg, lon_deg, first.lat_deg, first.lon_deg, 0.0) <= tolerance_ft {
        return first.next();
    }
    let mut best: Option<(usize, f64)> = None;
    let mut index = first.next();
    while let Some(i) = index {
        let Some(node) = list.get(i) else { break };
        if node.next().is_none() {
            break;
        }
        if let Some(course) = node.course_rad_to_next_node {
            let bearing = heading_rad(node.lat_deg, node.lon_deg, lat_deg, lon_deg);
            let deviation = abs_diff_rad(bearing, course);
            if deviation > best.map_or(0.0, |(_, max)| max) {
                best = Some((i, deviation));
            }
        }
        index = node.next();
    }
    best.map(|(i, _)| i)
}
