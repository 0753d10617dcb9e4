//! Flight-plan model, route and taxi-plan parsing, and the flight-plan compiler.
//!
//! Compilation turns a route string into a fully resolved airborne route: procedure legs
//! are expanded from the nav-data context, parametric legs (heading/course to altitude,
//! DME distance, radial, or intercept) are replaced by concrete points, and the synthetic
//! top-of-climb/top-of-descent waypoints are placed from the aircraft performance model.

pub mod compiler;
pub mod legs;
pub mod navdata;
pub mod route;
pub mod taxi;
pub mod toc_tod;
pub mod types;

pub use compiler::{CompileContext, CompileError, CompiledFlight, CompilerSettings, compile_flight};
pub use navdata::{Airport, NavDataError, NavDatabase, Procedure, Runway};
pub use route::{ParsedRoute, RouteError, is_runway_ident, parse_route};
pub use taxi::{TaxiPlanError, TaxiSide, TaxiWaypoint, parse_taxi_plan};
pub use types::{
    AltitudeDescriptor, FlightPlan, PathTerminator, ProcedureType, RoutePoint, SpeedDescriptor,
};
