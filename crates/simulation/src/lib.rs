//! Flight-phase initialization and lock-step trajectory propagation for batches of flights.

mod init;
mod kernel;
mod loader;
mod phase;
mod simulation;
mod state;
mod trajectory;

use thiserror::Error;
use trajsim_adb::AdbError;
use trajsim_flightplan::{NavDataError, RouteError};
use trajsim_waypoints::WaypointError;

pub use init::{InitError, InitialPosition, InitialTarget, initialize_phase, target_waypoint_node};
pub use loader::{Flight, FlightRejection, LoadError, LoadReport};
pub use phase::FlightPhase;
pub use simulation::{Simulation, SimulationStatus};
pub use state::{AircraftState, CpuStateStore, StateStore};
pub use trajectory::{Trajectory, TrajectorySample};

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    NavData(#[from] NavDataError),
    #[error(transparent)]
    Adb(#[from] AdbError),
    #[error(transparent)]
    Route(#[from] RouteError),
    #[error(transparent)]
    Waypoint(#[from] WaypointError),
    #[error("cannot {action} a simulation that is {status:?}")]
    InvalidTransition {
        action: &'static str,
        status: SimulationStatus,
    },
    #[error("flight index {index} out of range for {len} flights")]
    FlightIndex { index: usize, len: usize },
}
