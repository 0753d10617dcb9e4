//! Per-flight kinematic state and its storage backend.

use trajsim_waypoints::ListKind;

use crate::{FlightPhase, SimulationError};

/// Snapshot of one aircraft's state.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftState {
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_ft: f64,
    pub rocd_fps: f64,
    pub tas_knots: f64,
    pub ground_speed_knots: f64,
    pub course_rad: f64,
    pub fpa_rad: f64,
    pub phase: FlightPhase,
    pub target_list: ListKind,
    pub target_index: Option<usize>,
    pub cruise_alt_ft: f64,
    pub cruise_tas_knots: f64,
    pub toc_index: Option<usize>,
    pub tod_index: Option<usize>,
    pub time_s: f64,
    pub landed: bool,
    pub passed_toc: bool,
    pub passed_tod: bool,
}

impl AircraftState {
    /// Still propagating: not landed and with time left on its clock.
    pub fn is_active(&self, duration_s: f64) -> bool {
        !self.landed && self.time_s < duration_s
    }
}

/// Storage backend for aircraft state, addressed by flight index.
///
/// The kernel works on a gathered snapshot and commits it back once per tick, so a
/// backend only needs indexed get/set.
pub trait StateStore: Send {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<AircraftState>;

    fn set(&mut self, index: usize, state: &AircraftState) -> Result<(), SimulationError>;

    fn push(&mut self, state: &AircraftState);

    fn snapshot(&self) -> Vec<AircraftState> {
        (0..self.len()).filter_map(|i| self.get(i)).collect()
    }

    fn commit(&mut self, states: &[AircraftState]) -> Result<(), SimulationError> {
        for (i, state) in states.iter().enumerate() {
            self.set(i, state)?;
        }
        Ok(())
    }
}

/// Structure-of-arrays store held in host memory.
#[derive(Debug, Clone, Default)]
pub struct CpuStateStore {
    lat_deg: Vec<f64>,
    lon_deg: Vec<f64>,
    alt_ft: Vec<f64>,
    rocd_fps: Vec<f64>,
    tas_knots: Vec<f64>,
    ground_speed_knots: Vec<f64>,
    course_rad: Vec<f64>,
    fpa_rad: Vec<f64>,
    phase: Vec<FlightPhase>,
    target_list: Vec<ListKind>,
    target_index: Vec<Option<usize>>,
    cruise_alt_ft: Vec<f64>,
    cruise_tas_knots: Vec<f64>,
    toc_index: Vec<Option<usize>>,
    tod_index: Vec<Option<usize>>,
    time_s: Vec<f64>,
    landed: Vec<bool>,
    passed_toc: Vec<bool>,
    passed_tod: Vec<bool>,
}

impl CpuStateStore {
    pub fn with_capacity(n: usize) -> Self {
        Self {
            lat_deg: Vec::with_capacity(n),
            lon_deg: Vec::with_capacity(n),
            alt_ft: Vec::with_capacity(n),
            rocd_fps: Vec::with_capacity(n),
            tas_knots: Vec::with_capacity(n),
            ground_speed_knots: Vec::with_capacity(n),
            course_rad: Vec::with_capacity(n),
            fpa_rad: Vec::with_capacity(n),
            phase: Vec::with_capacity(n),
            target_list: Vec::with_capacity(n),
            target_index: Vec::with_capacity(n),
            cruise_alt_ft: Vec::with_capacity(n),
            cruise_tas_knots: Vec::with_capacity(n),
            toc_index: Vec::with_capacity(n),
            tod_index: Vec::with_capacity(n),
            time_s: Vec::with_capacity(n),
            landed: Vec::with_capacity(n),
            passed_toc: Vec::with_capacity(n),
            passed_tod: Vec::with_capacity(n),
        }
    }

    /// Latitude column, one entry per flight.
    pub fn latitudes(&self) -> &[f64] {
        &self.lat_deg
    }

    pub fn longitudes(&self) -> &[f64] {
        &self.lon_deg
    }

    pub fn altitudes(&self) -> &[f64] {
        &self.alt_ft
    }

    pub fn phases(&self) -> &[FlightPhase] {
        &self.phase
    }
}

impl StateStore for CpuStateStore {
    fn len(&self) -> usize {
        self.lat_deg.len()
    }

    fn get(&self, i: usize) -> Option<AircraftState> {
        if i >= self.len() {
            return None;
        }
        Some(AircraftState {
            lat_deg: self.lat_deg[i],
            lon_deg: self.lon_deg[i],
            alt_ft: self.alt_ft[i],
            rocd_fps: self.rocd_fps[i],
            tas_knots: self.tas_knots[i],
            ground_speed_knots: self.ground_speed_knots[i],
            course_rad: self.course_rad[i],
            fpa_rad: self.fpa_rad[i],
            phase: self.phase[i],
            target_list: self.target_list[i],
            target_index: self.target_index[i],
            cruise_alt_ft: self.cruise_alt_ft[i],
            cruise_tas_knots: self.cruise_tas_knots[i],
            toc_index: self.toc_index[i],
            tod_index: self.tod_index[i],
            time_s: self.time_s[i],
            landed: self.landed[i],
            passed_toc: self.passed_toc[i],
            passed_tod: self.passed_tod[i],
        })
    }

    fn set(&mut self, i: usize, s: &AircraftState) -> Result<(), SimulationError> {
        let len = self.len();
        if i >= len {
            return Err(SimulationError::FlightIndex { index: i, len });
        }
        self.lat_deg[i] = s.lat_deg;
        self.lon_deg[i] = s.lon_deg;
        self.alt_ft[i] = s.alt_ft;
        self.rocd_fps[i] = s.rocd_fps;
        self.tas_knots[i] = s.tas_knots;
        self.ground_speed_knots[i] = s.ground_speed_knots;
        self.course_rad[i] = s.course_rad;
        self.fpa_rad[i] = s.fpa_rad;
        self.phase[i] = s.phase;
        self.target_list[i] = s.target_list;
        self.target_index[i] = s.target_index;
        self.cruise_alt_ft[i] = s.cruise_alt_ft;
        self.cruise_tas_knots[i] = s.cruise_tas_knots;
        self.toc_index[i] = s.toc_index;
        self.tod_index[i] = s.tod_index;
        self.time_s[i] = s.time_s;
        self.landed[i] = s.landed;
        self.passed_toc[i] = s.passed_toc;
        self.passed_tod[i] = s.passed_tod;
        Ok(())
    }

    fn push(&mut self, s: &AircraftState) {
        self.lat_deg.push(s.lat_deg);
        self.lon_deg.push(s.lon_deg);
        self.alt_ft.push(s.alt_ft);
        self.rocd_fps.push(s.rocd_fps);
        self.tas_knots.push(s.tas_knots);
        self.ground_speed_knots.push(s.ground_speed_knots);
        self.course_rad.push(s.course_rad);
        self.fpa_rad.push(s.fpa_rad);
        self.phase.push(s.phase);
        self.target_list.push(s.target_list);
        self.target_index.push(s.target_index);
        self.cruise_alt_ft.push(s.cruise_alt_ft);
        self.cruise_tas_knots.push(s.cruise_tas_knots);
        self.toc_index.push(s.toc_index);
        self.tod_index.push(s.tod_index);
        self.time_s.push(s.time_s);
        self.landed.push(s.landed);
        self.passed_toc.push(s.passed_toc);
        self.passed_tod.push(s.passed_tod);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn parked() -> AircraftState {
        AircraftState {
            lat_deg: 37.6155,
            lon_deg: -122.386,
            alt_ft: 13.0,
            rocd_fps: 0.0,
            tas_knots: 0.0,
            ground_speed_knots: 0.0,
            course_rad: 0.0,
            fpa_rad: 0.0,
            phase: FlightPhase::OriginGate,
            target_list: ListKind::Departing,
            target_index: Some(1),
            cruise_alt_ft: 33000.0,
            cruise_tas_knots: 440.0,
            toc_index: Some(4),
            tod_index: Some(9),
            time_s: 0.0,
            landed: false,
            passed_toc: false,
            passed_tod: false,
        }
    }

    #[test]
    fn soa_store_round_trips_snapshots() {
        let mut store = CpuStateStore::with_capacity(2);
        let a = parked();
        let mut b = parked();
        b.phase = FlightPhase::Cruise;
        b.alt_ft = 33000.0;
        store.push(&a);
        store.push(&b);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(1), Some(b.clone()));
        assert_eq!(store.altitudes(), [13.0, 33000.0]);

        let mut snapshot = store.snapshot();
        snapshot[0].lat_deg = 37.0;
        store.commit(&snapshot).unwrap();
        assert_eq!(store.latitudes()[0], 37.0);
        assert!(store.get(2).is_none());
        assert!(matches!(
            store.set(5, &a),
            Err(SimulationError::FlightIndex { index: 5, len: 2 })
        ));
    }
}
