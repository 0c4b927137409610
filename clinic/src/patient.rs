//! The patient activity sequence.
//!
//! Fixed order: register with the receptionist, consult with a doctor,
//! then with probability [`TEST_BRANCH_THRESHOLD`] book a test with the
//! receptionist again before leaving. Test booking going through the same
//! receptionist as registration is deliberate; it is the load-relevant
//! contention point of the model, shared with the phone-call stream.

use des::{Effect, Process, ResourceId};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};
use tracing::debug;

use crate::stats::{Activity, SharedSink};

/// Probability that a patient is sent to book a test after the consult.
/// One uniform(0,1) draw per patient is compared against this.
pub const TEST_BRANCH_THRESHOLD: f64 = 0.25;

/// Exponential service-time distributions shared by every patient.
#[derive(Debug, Clone, Copy)]
pub struct PatientServiceTimes {
    pub register: Exp<f64>,
    pub consult: Exp<f64>,
    pub book_test: Exp<f64>,
}

/// What the patient does when next resumed.
#[derive(Debug, Clone, Copy)]
enum Step {
    Arrive,
    StartRegistration,
    EndRegistration,
    QueueForConsult,
    StartConsult,
    EndConsult,
    DecideTest,
    StartTestBooking,
    EndTestBooking,
    Finish,
}

pub struct PatientProcess {
    id: usize,
    rng: StdRng,
    service: PatientServiceTimes,
    receptionist: ResourceId,
    doctor: ResourceId,
    sink: SharedSink,
    step: Step,
    arrival_time: f64,
    queue_entered: f64,
}

impl PatientProcess {
    pub fn new(
        id: usize,
        seed: u64,
        service: PatientServiceTimes,
        receptionist: ResourceId,
        doctor: ResourceId,
        sink: SharedSink,
    ) -> PatientProcess {
        PatientProcess {
            id,
            rng: StdRng::seed_from_u64(seed),
            service,
            receptionist,
            doctor,
            sink,
            step: Step::Arrive,
            arrival_time: 0.0,
            queue_entered: 0.0,
        }
    }

    fn finish(&mut self, now: f64) -> Effect {
        let total = now - self.arrival_time;
        debug!(patient = self.id, total, "left the clinic");
        self.sink.borrow_mut().record_total_time(total);
        Effect::Done
    }
}

impl Process for PatientProcess {
    fn resume(&mut self, now: f64) -> Effect {
        match self.step {
            Step::Arrive => {
                self.arrival_time = now;
                self.queue_entered = now;
                self.step = Step::StartRegistration;
                Effect::Acquire(self.receptionist)
            }
            Step::StartRegistration => {
                let waited = now - self.queue_entered;
                debug!(patient = self.id, waited, "queued for registration");
                self.sink.borrow_mut().record(Activity::Registration, waited);
                self.step = Step::EndRegistration;
                Effect::Delay(self.service.register.sample(&mut self.rng))
            }
            Step::EndRegistration => {
                self.step = Step::QueueForConsult;
                Effect::Release(self.receptionist)
            }
            Step::QueueForConsult => {
                self.queue_entered = now;
                self.step = Step::StartConsult;
                Effect::Acquire(self.doctor)
            }
            Step::StartConsult => {
                let waited = now - self.queue_entered;
                debug!(patient = self.id, waited, "queued for consultation");
                self.sink.borrow_mut().record(Activity::Consultation, waited);
                self.step = Step::EndConsult;
                Effect::Delay(self.service.consult.sample(&mut self.rng))
            }
            Step::EndConsult => {
                self.step = Step::DecideTest;
                Effect::Release(self.doctor)
            }
            Step::DecideTest => {
                // The branch is decided exactly once per patient.
                if self.rng.random::<f64>() <= TEST_BRANCH_THRESHOLD {
                    self.queue_entered = now;
                    self.step = Step::StartTestBooking;
                    Effect::Acquire(self.receptionist)
                } else {
                    self.finish(now)
                }
            }
            Step::StartTestBooking => {
                let waited = now - self.queue_entered;
                debug!(patient = self.id, waited, "queued to book test");
                self.sink.borrow_mut().record(Activity::TestBooking, waited);
                self.step = Step::EndTestBooking;
                Effect::Delay(self.service.book_test.sample(&mut self.rng))
            }
            Step::EndTestBooking => {
                self.step = Step::Finish;
                Effect::Release(self.receptionist)
            }
            Step::Finish => self.finish(now),
        }
    }
}
