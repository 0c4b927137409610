//! Batch experiment runner.
//!
//! Runs many independent clinic days in parallel, one seed per run,
//! writes the per-run mean time in system to `clinic_results.csv` and
//! then reads the file back for a cross-run summary.
//!
//! Usage:
//!   cargo run --release --bin run_experiment

use std::path::Path;
use std::process::ExitCode;

use clinic::output::{self, RunRecord};
use clinic::{Config, Simulation};
use des::parallel::{ParallelRunner, simple_progress_reporter};
use tracing_subscriber::EnvFilter;

const NUM_RUNS: usize = 100;
const HORIZON_MINUTES: f64 = 480.0;
const BASE_SEED: u64 = 42;
const RESULTS_FILE: &str = "clinic_results.csv";

fn run_scenario(run: usize) -> Result<RunRecord, String> {
    let config = Config {
        // Offset by two per run: each run consumes a seed for the
        // patient stream and the next one for the call stream.
        seed: BASE_SEED + 2 * run as u64,
        ..Config::baseline()
    };
    let mut sim = Simulation::new(config).map_err(|e| e.to_string())?;
    sim.run(HORIZON_MINUTES).map_err(|e| e.to_string())?;
    Ok(RunRecord {
        run,
        mean_time_in_system: sim.stats().mean_total_time().unwrap_or(0.0),
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("Running {} clinic scenarios...", NUM_RUNS);
    let results = ParallelRunner::new(NUM_RUNS, run_scenario)
        .progress(simple_progress_reporter(10))
        .run();

    let mut records = Vec::with_capacity(results.len());
    for (run, result) in results.into_iter().enumerate() {
        match result {
            Ok(record) => records.push(record),
            Err(err) => eprintln!("Run {} failed: {}", run, err),
        }
    }

    let path = Path::new(RESULTS_FILE);
    if let Err(err) = output::write_batch_results(path, &records) {
        eprintln!("Failed to write {}: {}", RESULTS_FILE, err);
        return ExitCode::FAILURE;
    }
    println!("Wrote {} runs to {}", records.len(), RESULTS_FILE);

    match output::read_batch_results(path) {
        Ok(records) => {
            if let Some(mean) = output::mean_of_runs(&records) {
                println!(
                    "Mean time in clinic across {} runs (mins): {:.2}",
                    records.len(),
                    mean
                );
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Failed to read {} back: {}", RESULTS_FILE, err);
            ExitCode::FAILURE
        }
    }
}
