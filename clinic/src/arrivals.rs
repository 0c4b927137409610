//! Arrival generators.
//!
//! Each generator is itself a process: spawn a new instance, suspend for
//! an exponentially distributed inter-arrival interval, repeat for the
//! life of the run. The patient and call streams own separate seeded
//! rngs, so they are mutually independent; every spawned process gets a
//! child seed drawn from its stream, which keeps each instance's own
//! draws reproducible regardless of how runs interleave.

use des::{Effect, Process, ResourceId};
use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};

use crate::calls::CallProcess;
use crate::patient::{PatientProcess, PatientServiceTimes};
use crate::stats::SharedSink;

#[derive(Debug, Clone, Copy)]
enum State {
    Spawn,
    Wait,
}

pub struct PatientArrivals {
    rng: StdRng,
    interarrival: Exp<f64>,
    service: PatientServiceTimes,
    receptionist: ResourceId,
    doctor: ResourceId,
    sink: SharedSink,
    next_id: usize,
    state: State,
}

impl PatientArrivals {
    pub fn new(
        rng: StdRng,
        interarrival: Exp<f64>,
        service: PatientServiceTimes,
        receptionist: ResourceId,
        doctor: ResourceId,
        sink: SharedSink,
    ) -> PatientArrivals {
        PatientArrivals {
            rng,
            interarrival,
            service,
            receptionist,
            doctor,
            sink,
            next_id: 0,
            state: State::Spawn,
        }
    }
}

impl Process for PatientArrivals {
    fn resume(&mut self, _now: f64) -> Effect {
        match self.state {
            State::Spawn => {
                let id = self.next_id;
                self.next_id += 1;
                let seed = self.rng.random::<u64>();
                self.state = State::Wait;
                Effect::Spawn(Box::new(PatientProcess::new(
                    id,
                    seed,
                    self.service,
                    self.receptionist,
                    self.doctor,
                    self.sink.clone(),
                )))
            }
            State::Wait => {
                self.state = State::Spawn;
                Effect::Delay(self.interarrival.sample(&mut self.rng))
            }
        }
    }
}

pub struct CallArrivals {
    rng: StdRng,
    interarrival: Exp<f64>,
    answer: Exp<f64>,
    receptionist: ResourceId,
    sink: SharedSink,
    next_id: usize,
    state: State,
}

impl CallArrivals {
    pub fn new(
        rng: StdRng,
        interarrival: Exp<f64>,
        answer: Exp<f64>,
        receptionist: ResourceId,
        sink: SharedSink,
    ) -> CallArrivals {
        CallArrivals {
            rng,
            interarrival,
            answer,
            receptionist,
            sink,
            next_id: 0,
            state: State::Spawn,
        }
    }
}

impl Process for CallArrivals {
    fn resume(&mut self, _now: f64) -> Effect {
        match self.state {
            State::Spawn => {
                let id = self.next_id;
                self.next_id += 1;
                let seed = self.rng.random::<u64>();
                self.state = State::Wait;
                Effect::Spawn(Box::new(CallProcess::new(
                    id,
                    seed,
                    self.answer,
                    self.receptionist,
                    self.sink.clone(),
                )))
            }
            State::Wait => {
                self.state = State::Spawn;
                Effect::Delay(self.interarrival.sample(&mut self.rng))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::stats::StatsSink;

    #[test]
    fn alternates_spawn_and_wait_forever() {
        let sink: SharedSink = Rc::new(RefCell::new(StatsSink::new()));
        let service = PatientServiceTimes {
            register: Exp::new(0.5).unwrap(),
            consult: Exp::new(0.125).unwrap(),
            book_test: Exp::new(0.25).unwrap(),
        };
        let mut arrivals = PatientArrivals::new(
            StdRng::seed_from_u64(1),
            Exp::new(1.0 / 3.0).unwrap(),
            service,
            0,
            1,
            sink,
        );
        for _ in 0..10 {
            assert!(matches!(arrivals.resume(0.0), Effect::Spawn(_)));
            assert!(matches!(arrivals.resume(0.0), Effect::Delay(d) if d >= 0.0));
        }
    }
}
