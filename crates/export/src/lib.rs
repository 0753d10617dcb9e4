//! Export helpers for CSV and JSON trajectory artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;
use trajsim_simulation::SimulationError;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Io(#[from] io::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod trajectory {
    //! One CSV row per recorded sample, all flights in load order.

    use std::io::Write;

    use serde::Serialize;
    use trajsim_simulation::{FlightPhase, Simulation, StateStore};

    use crate::ExportError;

    #[derive(Debug, Serialize)]
    struct Row<'a> {
        callsign: &'a str,
        tick: usize,
        time_s: f64,
        lat: f64,
        lon: f64,
        alt: f64,
        rocd_fps: f64,
        tas_knots: f64,
        ground_speed_knots: f64,
        course_deg: f64,
        fpa_deg: f64,
        phase: FlightPhase,
    }

    /// Write every trajectory as CSV. Returns the number of rows written.
    pub fn write_csv<S: StateStore, W: Write>(
        sim: &Simulation<S>,
        writer: W,
    ) -> Result<usize, ExportError> {
        let mut out = csv::Writer::from_writer(writer);
        let mut rows = 0;
        for i in 0..sim.num_flights() {
            let callsign = sim.callsign(i)?;
            for sample in sim.trajectory(i)?.samples() {
                out.serialize(Row {
                    callsign,
                    tick: sample.tick,
                    time_s: sample.time_s,
                    lat: sample.lat_deg,
                    lon: sample.lon_deg,
                    alt: sample.alt_ft,
                    rocd_fps: sample.rocd_fps,
                    tas_knots: sample.tas_knots,
                    ground_speed_knots: sample.ground_speed_knots,
                    course_deg: sample.course_deg,
                    fpa_deg: sample.fpa_deg,
                    phase: sample.phase,
                })?;
                rows += 1;
            }
        }
        out.flush()?;
        Ok(rows)
    }
}

pub mod run {
    //! A single JSON document describing the whole run.

    use std::io::Write;

    use serde::Serialize;
    use serde_json::to_writer_pretty;
    use trajsim_simulation::{
        FlightPhase, LoadReport, Simulation, SimulationStatus, StateStore, TrajectorySample,
    };

    use crate::ExportError;

    #[derive(Serialize)]
    struct RunDocument<'a> {
        metadata: Metadata,
        flights: Vec<FlightDocument<'a>>,
    }

    #[derive(Serialize)]
    struct Metadata {
        status: SimulationStatus,
        ticks: usize,
        surface_step_s: f64,
        airborne_step_s: f64,
        duration_s: f64,
        report: LoadReport,
    }

    #[derive(Serialize)]
    struct FlightDocument<'a> {
        callsign: &'a str,
        actype: &'a str,
        origin: &'a str,
        destination: &'a str,
        route: &'a str,
        cruise_altitude_ft: f64,
        cruise_tas_knots: f64,
        final_phase: FlightPhase,
        landed: bool,
        samples: Vec<TrajectorySample>,
    }

    /// Write the run metadata and every flight's samples as pretty-printed JSON.
    pub fn write_json<S: StateStore, W: Write>(
        sim: &Simulation<S>,
        mut writer: W,
    ) -> Result<(), ExportError> {
        let config = sim.config();
        let mut flights = Vec::with_capacity(sim.num_flights());
        for (i, flight) in sim.flights().enumerate() {
            let state = sim.state(i)?;
            flights.push(FlightDocument {
                callsign: &flight.callsign,
                actype: &flight.actype,
                origin: &flight.plan.origin,
                destination: &flight.plan.destination,
                route: &flight.plan.route_string,
                cruise_altitude_ft: flight.plan.cruise_altitude_ft,
                cruise_tas_knots: flight.plan.cruise_tas_knots,
                final_phase: state.phase,
                landed: state.landed,
                samples: sim.trajectory(i)?.samples().collect(),
            });
        }
        let document = RunDocument {
            metadata: Metadata {
                status: sim.status(),
                ticks: sim.tick(),
                surface_step_s: config.surface_step_s,
                airborne_step_s: config.airborne_step_s,
                duration_s: config.duration_s,
                report: sim.report(),
            },
            flights,
        };
        to_writer_pretty(&mut writer, &document)?;
        writer.flush()?;
        Ok(())
    }
}
