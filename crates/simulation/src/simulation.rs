//! The batch simulation: load, run control, and per-flight queries.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info};
use trajsim_adb::AdbCatalog;
use trajsim_config::{CatalogConfig, FlightConfig, SimulationConfig};
use trajsim_flightplan::{CompileContext, CompilerSettings, FlightPlan, NavDatabase};
use trajsim_waypoints::{ListKind, WaypointList};

use crate::init::target_waypoint_node;
use crate::kernel::{self, KernelEnv};
use crate::loader::{Flight, FlightRejection, LoadReport, load_flights};
use crate::{AircraftState, CpuStateStore, SimulationError, StateStore, Trajectory};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SimulationStatus {
    Ready,
    Running,
    Paused,
    Stopped,
    Ended,
}

/// A loaded batch of flights propagated in lock-step.
pub struct Simulation<S: StateStore = CpuStateStore> {
    config: SimulationConfig,
    adb: AdbCatalog,
    flights: Vec<Flight>,
    store: S,
    trajectories: Vec<Trajectory>,
    status: SimulationStatus,
    tick: usize,
    report: LoadReport,
    rejections: Vec<FlightRejection>,
}

impl Simulation<CpuStateStore> {
    /// Build the nav data and performance catalogs, then compile and initialize every flight.
    pub fn load(
        catalog: &CatalogConfig,
        flights: &[FlightConfig],
        config: SimulationConfig,
    ) -> Result<Self, SimulationError> {
        Self::load_with_store(
            catalog,
            flights,
            config,
            CpuStateStore::with_capacity(flights.len()),
        )
    }
}

impl<S: StateStore> Simulation<S> {
    pub fn load_with_store(
        catalog: &CatalogConfig,
        flights: &[FlightConfig],
        config: SimulationConfig,
        mut store: S,
    ) -> Result<Self, SimulationError> {
        let navdata = NavDatabase::from_config(catalog)?;
        let adb = AdbCatalog::from_config(&catalog.adb_tables, &catalog.synonyms)?;
        let ctx = CompileContext {
            navdata: &navdata,
            adb: &adb,
            settings: CompilerSettings::from(&config),
        };
        let loaded = load_flights(flights, &ctx, &config);
        for state in &loaded.states {
            store.push(state);
        }
        info!(
            total = loaded.report.total,
            ignored = loaded.report.ignored,
            valid = loaded.report.valid,
            "flights loaded"
        );
        let trajectories = vec![Trajectory::default(); loaded.flights.len()];
        Ok(Self {
            config,
            adb,
            flights: loaded.flights,
            store,
            trajectories,
            status: SimulationStatus::Ready,
            tick: 0,
            report: loaded.report,
            rejections: loaded.rejections,
        })
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ticks executed so far.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }

    pub fn rejections(&self) -> &[FlightRejection] {
        &self.rejections
    }

    pub fn start(&mut self) -> Result<(), SimulationError> {
        self.transition("start", &[SimulationStatus::Ready], SimulationStatus::Running)
    }

    pub fn pause(&mut self) -> Result<(), SimulationError> {
        self.transition("pause", &[SimulationStatus::Running], SimulationStatus::Paused)
    }

    pub fn resume(&mut self) -> Result<(), SimulationError> {
        self.transition("resume", &[SimulationStatus::Paused], SimulationStatus::Running)
    }

    pub fn stop(&mut self) -> Result<(), SimulationError> {
        self.transition(
            "stop",
            &[
                SimulationStatus::Ready,
                SimulationStatus::Running,
                SimulationStatus::Paused,
            ],
            SimulationStatus::Stopped,
        )
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: &[SimulationStatus],
        to: SimulationStatus,
    ) -> Result<(), SimulationError> {
        if !from.contains(&self.status) {
            return Err(SimulationError::InvalidTransition {
                action,
                status: self.status,
            });
        }
        debug!(?to, "simulation status");
        self.status = to;
        Ok(())
    }

    fn any_active(&self) -> bool {
        (0..self.store.len())
            .filter_map(|i| self.store.get(i))
            .any(|s| s.is_active(self.config.duration_s))
    }

    /// Advance every flight by one tick. Returns whether any flight is still active.
    ///
    /// Stepping is allowed while ready or paused, so a caller can single-step a run.
    pub fn step(&mut self) -> Result<bool, SimulationError> {
        if matches!(
            self.status,
            SimulationStatus::Stopped | SimulationStatus::Ended
        ) {
            return Err(SimulationError::InvalidTransition {
                action: "step",
                status: self.status,
            });
        }
        if !self.any_active() {
            self.status = SimulationStatus::Ended;
            return Ok(false);
        }

        let mut states = self.store.snapshot();
        let env = KernelEnv {
            adb: &self.adb,
            config: &self.config,
        };
        self.flights
            .par_iter()
            .zip(states.par_iter_mut())
            .zip(self.trajectories.par_iter_mut())
            .for_each(|((flight, state), trajectory)| {
                kernel::advance(flight, state, trajectory, &env)
            });
        self.store.commit(&states)?;
        self.tick += 1;

        let active = states.iter().any(|s| s.is_active(self.config.duration_s));
        if !active {
            info!(ticks = self.tick, "all flights finished");
            self.status = SimulationStatus::Ended;
        }
        Ok(active)
    }

    /// Run until every flight has landed or exhausted its clock. Returns the ticks executed.
    pub fn run_to_end(&mut self) -> Result<usize, SimulationError> {
        if self.status == SimulationStatus::Ready {
            self.start()?;
        }
        if self.status != SimulationStatus::Running {
            return Err(SimulationError::InvalidTransition {
                action: "run",
                status: self.status,
            });
        }
        let first = self.tick;
        while self.step()? {}
        Ok(self.tick - first)
    }

    pub fn num_flights(&self) -> usize {
        self.flights.len()
    }

    fn flight(&self, index: usize) -> Result<&Flight, SimulationError> {
        self.flights.get(index).ok_or(SimulationError::FlightIndex {
            index,
            len: self.flights.len(),
        })
    }

    pub fn flights(&self) -> impl Iterator<Item = &Flight> + '_ {
        self.flights.iter()
    }

    pub fn flight_plan(&self, index: usize) -> Result<&FlightPlan, SimulationError> {
        Ok(&self.flight(index)?.plan)
    }

    pub fn state(&self, index: usize) -> Result<AircraftState, SimulationError> {
        self.store.get(index).ok_or(SimulationError::FlightIndex {
            index,
            len: self.store.len(),
        })
    }

    pub fn trajectory(&self, index: usize) -> Result<&Trajectory, SimulationError> {
        self.flight(index)?;
        Ok(&self.trajectories[index])
    }

    pub fn waypoints(&self, index: usize, kind: ListKind) -> Result<&WaypointList, SimulationError> {
        Ok(self.flight(index)?.waypoints.list(kind))
    }

    pub fn callsign(&self, index: usize) -> Result<&str, SimulationError> {
        Ok(&self.flight(index)?.callsign)
    }

    pub fn origin(&self, index: usize) -> Result<&str, SimulationError> {
        Ok(&self.flight(index)?.plan.origin)
    }

    pub fn destination(&self, index: usize) -> Result<&str, SimulationError> {
        Ok(&self.flight(index)?.plan.destination)
    }

    pub fn cruise_altitude_ft(&self, index: usize) -> Result<f64, SimulationError> {
        Ok(self.flight(index)?.plan.cruise_altitude_ft)
    }

    pub fn cruise_tas_knots(&self, index: usize) -> Result<f64, SimulationError> {
        Ok(self.flight(index)?.plan.cruise_tas_knots)
    }

    /// Node of the flight's current list that it has most clearly passed, judged from
    /// its current position.
    pub fn passed_waypoint(&self, index: usize) -> Result<Option<usize>, SimulationError> {
        let flight = self.flight(index)?;
        let state = self.state(index)?;
        Ok(target_waypoint_node(
            flight.waypoints.list(state.target_list),
            state.lat_deg,
            state.lon_deg,
            self.config.waypoint_tolerance_ft,
        ))
    }

    /// Move an airborne waypoint and refresh the course/distance links around it.
    ///
    /// Only allowed before the run starts.
    pub fn set_waypoint_position(
        &mut self,
        index: usize,
        node: usize,
        lat_deg: f64,
        lon_deg: f64,
    ) -> Result<(), SimulationError> {
        if self.status != SimulationStatus::Ready {
            return Err(SimulationError::InvalidTransition {
                action: "edit",
                status: self.status,
            });
        }
        let len = self.flights.len();
        let flight = self
            .flights
            .get_mut(index)
            .ok_or(SimulationError::FlightIndex { index, len })?;
        flight.plan.set_waypoint_position(node, lat_deg, lon_deg)?;
        flight.waypoints.airborne.set_position(node, lat_deg, lon_deg)?;
        Ok(())
    }
}
