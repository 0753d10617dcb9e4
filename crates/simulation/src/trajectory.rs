use serde::Serialize;

use crate::{AircraftState, FlightPhase};

/// One recorded tick of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrajectorySample {
    pub tick: usize,
    pub time_s: f64,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub alt_ft: f64,
    pub rocd_fps: f64,
    pub tas_knots: f64,
    pub ground_speed_knots: f64,
    pub course_deg: f64,
    pub fpa_deg: f64,
    pub phase: FlightPhase,
}

/// Append-only time series of one flight, stored as parallel arrays.
///
/// Index `i` holds the sample recorded on the flight's `i`-th tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trajectory {
    time_s: Vec<f64>,
    lat_deg: Vec<f64>,
    lon_deg: Vec<f64>,
    alt_ft: Vec<f64>,
    rocd_fps: Vec<f64>,
    tas_knots: Vec<f64>,
    ground_speed_knots: Vec<f64>,
    course_rad: Vec<f64>,
    fpa_rad: Vec<f64>,
    phase: Vec<FlightPhase>,
}

impl Trajectory {
    pub fn record(&mut self, state: &AircraftState) {
        self.time_s.push(state.time_s);
        self.lat_deg.push(state.lat_deg);
        self.lon_deg.push(state.lon_deg);
        self.alt_ft.push(state.alt_ft);
        self.rocd_fps.push(state.rocd_fps);
        self.tas_knots.push(state.tas_knots);
        self.ground_speed_knots.push(state.ground_speed_knots);
        self.course_rad.push(state.course_rad);
        self.fpa_rad.push(state.fpa_rad);
        self.phase.push(state.phase);
    }

    pub fn len(&self) -> usize {
        self.time_s.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time_s.is_empty()
    }

    pub fn times(&self) -> &[f64] {
        &self.time_s
    }

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

    pub fn sample(&self, tick: usize) -> Option<TrajectorySample> {
        if tick >= self.len() {
            return None;
        }
        Some(TrajectorySample {
            tick,
            time_s: self.time_s[tick],
            lat_deg: self.lat_deg[tick],
            lon_deg: self.lon_deg[tick],
            alt_ft: self.alt_ft[tick],
            rocd_fps: self.rocd_fps[tick],
            tas_knots: self.tas_knots[tick],
            ground_speed_knots: self.ground_speed_knots[tick],
            course_deg: self.course_rad[tick].to_degrees(),
            fpa_deg: self.fpa_rad[tick].to_degrees(),
            phase: self.phase[tick],
        })
    }

    pub fn samples(&self) -> impl Iterator<Item = TrajectorySample> + '_ {
        (0..self.len()).filter_map(|i| self.sample(i))
    }
}
