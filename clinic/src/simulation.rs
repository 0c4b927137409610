//! Configuration and the per-run simulation handle.
//!
//! A [`Simulation`] is one complete, independent run: its own event loop,
//! resources, random streams and statistics sink. Nothing is shared
//! between handles, so batches of runs can execute on parallel workers.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use des::EventLoop;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Exp;

use crate::arrivals::{CallArrivals, PatientArrivals};
use crate::patient::PatientServiceTimes;
use crate::stats::{SharedSink, StatsSink};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} capacity must be at least 1")]
    NonPositiveCapacity { name: &'static str },

    #[error("{name} must be positive and finite, got {value}")]
    NonPositiveMean { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Engine(#[from] des::Error),
}

/// Parameters of one run. Times are minutes.
#[derive(Debug, Clone)]
pub struct Config {
    pub receptionist_capacity: usize,
    pub doctor_capacity: usize,
    pub mean_interarrival_patient: f64,
    /// `None` disables the phone-call stream entirely.
    pub mean_interarrival_call: Option<f64>,
    pub mean_register: f64,
    pub mean_consult: f64,
    pub mean_book_test: f64,
    pub mean_call_answer: f64,
    pub seed: u64,
}

impl Config {
    /// The original clinic parameters: one receptionist, two doctors,
    /// patients every 3 minutes on average, calls every 10.
    pub fn baseline() -> Config {
        Config {
            receptionist_capacity: 1,
            doctor_capacity: 2,
            mean_interarrival_patient: 3.0,
            mean_interarrival_call: Some(10.0),
            mean_register: 2.0,
            mean_consult: 8.0,
            mean_book_test: 4.0,
            mean_call_answer: 4.0,
            seed: 42,
        }
    }
}

/// Builds an exponential distribution with rate `1 / mean`, rejecting
/// non-positive means at construction time.
fn exp_dist(name: &'static str, mean: f64) -> Result<Exp<f64>, ConfigError> {
    if !mean.is_finite() || mean <= 0.0 {
        return Err(ConfigError::NonPositiveMean { name, value: mean });
    }
    Exp::new(1.0 / mean).map_err(|_| ConfigError::NonPositiveMean { name, value: mean })
}

/// One independent simulation run.
pub struct Simulation {
    event_loop: EventLoop,
    sink: SharedSink,
}

impl Simulation {
    /// Builds a fresh event loop, resources, sink and arrival generators
    /// from the configuration. All parameters are validated here; the
    /// simulation never starts from a bad configuration.
    pub fn new(config: Config) -> Result<Simulation, Error> {
        if config.receptionist_capacity == 0 {
            return Err(ConfigError::NonPositiveCapacity {
                name: "receptionist",
            }
            .into());
        }
        if config.doctor_capacity == 0 {
            return Err(ConfigError::NonPositiveCapacity { name: "doctor" }.into());
        }

        let patient_interarrival =
            exp_dist("mean_interarrival_patient", config.mean_interarrival_patient)?;
        let service = PatientServiceTimes {
            register: exp_dist("mean_register", config.mean_register)?,
            consult: exp_dist("mean_consult", config.mean_consult)?,
            book_test: exp_dist("mean_book_test", config.mean_book_test)?,
        };

        let mut event_loop = EventLoop::new();
        let receptionist = event_loop.add_resource(config.receptionist_capacity)?;
        let doctor = event_loop.add_resource(config.doctor_capacity)?;

        let sink: SharedSink = Rc::new(RefCell::new(StatsSink::new()));

        event_loop.spawn(Box::new(PatientArrivals::new(
            StdRng::seed_from_u64(config.seed),
            patient_interarrival,
            service,
            receptionist,
            doctor,
            Rc::clone(&sink),
        )));

        if let Some(mean_interarrival_call) = config.mean_interarrival_call {
            let call_interarrival = exp_dist("mean_interarrival_call", mean_interarrival_call)?;
            let answer = exp_dist("mean_call_answer", config.mean_call_answer)?;
            event_loop.spawn(Box::new(CallArrivals::new(
                StdRng::seed_from_u64(config.seed.wrapping_add(1)),
                call_interarrival,
                answer,
                receptionist,
                Rc::clone(&sink),
            )));
        }

        Ok(Simulation { event_loop, sink })
    }

    /// Runs to the horizon (minutes). Processes still suspended at the
    /// cutoff are abandoned and contribute no further observations.
    pub fn run(&mut self, horizon: f64) -> Result<(), Error> {
        self.event_loop.run(horizon)?;
        Ok(())
    }

    /// Current virtual time.
    pub fn now(&self) -> f64 {
        self.event_loop.now()
    }

    /// Read-only access to everything recorded so far.
    pub fn stats(&self) -> Ref<'_, StatsSink> {
        self.sink.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_configuration_is_valid() {
        assert!(Simulation::new(Config::baseline()).is_ok());
    }

    #[test]
    fn zero_capacity_is_a_configuration_error() {
        let config = Config {
            receptionist_capacity: 0,
            ..Config::baseline()
        };
        assert_eq!(
            Simulation::new(config).err(),
            Some(Error::Config(ConfigError::NonPositiveCapacity {
                name: "receptionist"
            }))
        );

        let config = Config {
            doctor_capacity: 0,
            ..Config::baseline()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(Error::Config(ConfigError::NonPositiveCapacity { name: "doctor" }))
        ));
    }

    #[test]
    fn non_positive_means_are_configuration_errors() {
        for bad in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            let config = Config {
                mean_consult: bad,
                ..Config::baseline()
            };
            assert!(matches!(
                Simulation::new(config),
                Err(Error::Config(ConfigError::NonPositiveMean { .. }))
            ));
        }
    }

    #[test]
    fn call_means_are_not_validated_when_calls_are_disabled() {
        let config = Config {
            mean_interarrival_call: None,
            mean_call_answer: -1.0,
            ..Config::baseline()
        };
        assert!(Simulation::new(config).is_ok());
    }

    #[test]
    fn bad_horizon_is_rejected() {
        let mut sim = Simulation::new(Config::baseline()).unwrap();
        assert!(matches!(
            sim.run(0.0),
            Err(Error::Engine(des::Error::InvalidHorizon(_)))
        ));
    }
}
