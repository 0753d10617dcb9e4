//! Batch aircraft trajectory simulation.
//!
//! Routes are compiled from navigation and performance catalogs into per-flight
//! waypoint lists, then every flight is propagated in lock-step. The member crates
//! are re-exported here so front-ends and tests share one entry point.

pub use trajsim_adb as adb;
pub use trajsim_config as config;
pub use trajsim_core as base;
pub use trajsim_export as export;
pub use trajsim_flightplan as flightplan;
pub use trajsim_geodesy as geodesy;
pub use trajsim_simulation as simulation;
pub use trajsim_waypoints as waypoints;

/// Returns the version of the library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
