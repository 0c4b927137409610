//! GP clinic queueing simulation.
//!
//! Models a clinic as a network of queues served by capacity-limited
//! staff: a single receptionist handles registration, test booking and
//! incoming phone calls, while two doctors hold consultations. Patients
//! and calls arrive at exponentially distributed intervals and compete
//! for the receptionist, which is the main contention point of the
//! system.
//!
//! The crate produces per-activity queueing durations and per-patient
//! total time in system through a [`StatsSink`] owned by each run; what
//! to do with those observations (CSV files, plots, progress output) is
//! left to the binaries.
//!
//! Key pieces:
//! - [`Simulation`]: one independent run from time 0 to the horizon
//! - `PatientProcess` / `CallProcess`: the two activity sequences
//! - `PatientArrivals` / `CallArrivals`: stochastic arrival streams

pub mod arrivals;
pub mod calls;
pub mod output;
pub mod patient;
pub mod simulation;
pub mod stats;

pub use simulation::{Config, ConfigError, Error, Simulation};
pub use stats::{Activity, StatsSink};
