//! Single clinic run with a summary report.
//!
//! Runs one 480-minute day with the baseline parameters and prints the
//! mean queueing time per activity plus the mean time in system. Set
//! `RUST_LOG=clinic=debug` to see every patient's queueing line.

use clinic::{Activity, Config, Simulation};
use tracing_subscriber::EnvFilter;

const HORIZON_MINUTES: f64 = 480.0;

fn main() -> Result<(), clinic::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::baseline();
    let mut sim = Simulation::new(config)?;
    sim.run(HORIZON_MINUTES)?;

    println!("=== GP Clinic Simulation ===");
    let stats = sim.stats();
    for activity in Activity::ALL {
        match stats.mean(activity) {
            Some(mean) => println!(
                "Mean queuing time for {} (mins): {:.2}",
                activity.label(),
                mean
            ),
            None => println!("Mean queuing time for {} (mins): n/a", activity.label()),
        }
    }
    if let Some(mean) = stats.mean_total_time() {
        println!("Mean time in system (mins): {:.2}", mean);
    }

    Ok(())
}
