use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trajsim::config::{SimulationConfig, load_catalog, load_flights, load_simulation_config};
use trajsim::export::{run, trajectory, writer_for_path};
use trajsim::simulation::Simulation;

#[derive(Parser)]
#[command(author, version, about = "Batch aircraft trajectory simulator")]
struct Cli {
    /// Catalog root holding adb/, airports.yaml, fixes.yaml, procedures.yaml
    #[arg(long, default_value = "configs")]
    data: PathBuf,

    /// Flight records (YAML list, TOML file, or directory of TOML files)
    #[arg(long)]
    flights: PathBuf,

    /// Run parameters; defaults are used when omitted
    #[arg(long)]
    simulation: Option<PathBuf>,

    /// Override the simulated duration in seconds
    #[arg(long)]
    duration: Option<f64>,

    /// Write all samples as CSV (`-` for stdout)
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the run document as JSON (`-` for stdout)
    #[arg(long)]
    json: Option<PathBuf>,

    /// Worker threads for loading and propagation
    #[arg(long)]
    threads: Option<usize>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Some(n) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .context("configuring worker threads")?;
    }

    let catalog = load_catalog(&cli.data)
        .with_context(|| format!("loading catalogs from {}", cli.data.display()))?;
    let flights = load_flights(&cli.flights)
        .with_context(|| format!("loading flights from {}", cli.flights.display()))?;
    let mut config = match &cli.simulation {
        Some(path) => load_simulation_config(path)
            .with_context(|| format!("loading run parameters from {}", path.display()))?,
        None => SimulationConfig::default(),
    };
    if let Some(duration) = cli.duration {
        anyhow::ensure!(duration > 0.0, "--duration must be positive");
        config.duration_s = duration;
    }

    let mut sim = Simulation::load(&catalog, &flights, config)?;
    let report = sim.report();
    let ticks = sim.run_to_end()?;
    info!(ticks, status = ?sim.status(), "run finished");

    // Keep stdout free for an export written to `-`.
    let to_stdout = [&cli.csv, &cli.json]
        .iter()
        .any(|p| p.as_deref().is_some_and(|p| p.as_os_str() == "-"));
    let summary = |line: String| {
        if to_stdout {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    };

    summary(format!(
        "Flights: total {}, ignored {}, valid {}",
        report.total, report.ignored, report.valid
    ));
    for rejection in sim.rejections() {
        summary(format!("  ignored {}: {}", rejection.callsign, rejection.reason));
    }
    summary(format!("Ticks: {ticks}"));
    for i in 0..sim.num_flights() {
        let state = sim.state(i)?;
        let samples = sim.trajectory(i)?.len();
        summary(format!(
            "{:<8} {}->{} cruise {:.0} ft @ {:.0} kt, {} samples, final {} at {:.0} ft{}",
            sim.callsign(i)?,
            sim.origin(i)?,
            sim.destination(i)?,
            sim.cruise_altitude_ft(i)?,
            sim.cruise_tas_knots(i)?,
            samples,
            state.phase,
            state.alt_ft,
            if state.landed { " (landed)" } else { "" },
        ));
    }

    if let Some(path) = &cli.csv {
        let rows = trajectory::write_csv(&sim, writer_for_path(path)?)?;
        summary(format!("Wrote {rows} CSV rows to {}", path.display()));
    }
    if let Some(path) = &cli.json {
        run::write_json(&sim, writer_for_path(path)?)?;
        summary(format!("Wrote run document to {}", path.display()));
    }
    Ok(())
}
