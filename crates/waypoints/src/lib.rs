//! Arena-indexed waypoint lists for a flight's three segments.
//!
//! Each list owns its nodes in a `Vec`; `prev`/`next` are indices into that vector, so
//! lists are acyclic by construction and can be read from many threads at once.

mod list;

pub use list::{WaypointList, WaypointNode};

use thiserror::Error;
use trajsim_flightplan::CompiledFlight;

#[derive(Debug, Error, PartialEq)]
pub enum WaypointError {
    #[error("waypoint index {index} out of range for list of {len} nodes")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("waypoint list does not terminate within {len} steps")]
    Cycle { len: usize },
    #[error("waypoint list reaches {reached} of {len} nodes")]
    Disconnected { reached: usize, len: usize },
}

/// Which of a flight's lists to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Departing,
    Airborne,
    Landing,
}

/// The three lists owned by one flight. Absent segments are empty lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlightWaypoints {
    pub departing: WaypointList,
    pub airborne: WaypointList,
    pub landing: WaypointList,
}

impl FlightWaypoints {
    pub fn from_compiled(compiled: &CompiledFlight) -> Self {
        let plan = &compiled.plan;
        Self {
            departing: WaypointList::from_taxi(&compiled.departing_taxi),
            airborne: WaypointList::from_route(&plan.route, plan.toc_index, plan.tod_index),
            landing: WaypointList::from_taxi(&compiled.landing_taxi),
        }
    }

    pub fn list(&self, kind: ListKind) -> &WaypointList {
        match kind {
            ListKind::Departing => &self.departing,
            ListKind::Airborne => &self.airborne,
            ListKind::Landing => &self.landing,
        }
    }

    pub fn list_mut(&mut self, kind: ListKind) -> &mut WaypointList {
        match kind {
            ListKind::Departing => &mut self.departing,
            ListKind::Airborne => &mut self.airborne,
            ListKind::Landing => &mut self.landing,
        }
    }
}
