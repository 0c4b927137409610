//! The phone-call activity sequence.
//!
//! A call is a single resource span on the receptionist: queue, get
//! answered, hang up. Only the queueing duration is observed; calls have
//! no total-time metric of their own.

use des::{Effect, Process, ResourceId};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Exp};
use tracing::debug;

use crate::stats::{Activity, SharedSink};

#[derive(Debug, Clone, Copy)]
enum Step {
    Arrive,
    StartAnswer,
    EndAnswer,
    Finish,
}

pub struct CallProcess {
    id: usize,
    rng: StdRng,
    answer: Exp<f64>,
    receptionist: ResourceId,
    sink: SharedSink,
    step: Step,
    queue_entered: f64,
}

impl CallProcess {
    pub fn new(
        id: usize,
        seed: u64,
        answer: Exp<f64>,
        receptionist: ResourceId,
        sink: SharedSink,
    ) -> CallProcess {
        CallProcess {
            id,
            rng: StdRng::seed_from_u64(seed),
            answer,
            receptionist,
            sink,
            step: Step::Arrive,
            queue_entered: 0.0,
        }
    }
}

impl Process for CallProcess {
    fn resume(&mut self, now: f64) -> Effect {
        match self.step {
            Step::Arrive => {
                self.queue_entered = now;
                self.step = Step::StartAnswer;
                Effect::Acquire(self.receptionist)
            }
            Step::StartAnswer => {
                let waited = now - self.queue_entered;
                debug!(call = self.id, waited, "queued for call");
                self.sink.borrow_mut().record(Activity::CallAnswer, waited);
                self.step = Step::EndAnswer;
                Effect::Delay(self.answer.sample(&mut self.rng))
            }
            Step::EndAnswer => {
                self.step = Step::Finish;
                Effect::Release(self.receptionist)
            }
            Step::Finish => Effect::Done,
        }
    }
}
