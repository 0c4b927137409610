//! Per-run observation sink.
//!
//! Each simulation run owns exactly one sink; processes share it through
//! an `Rc<RefCell<_>>` handle. Observations are append-only and kept in
//! recording order, so two runs with the same seed can be compared
//! sequence-for-sequence.

use std::cell::RefCell;
use std::rc::Rc;

/// Handle shared between the processes of a single run.
pub type SharedSink = Rc<RefCell<StatsSink>>;

/// The queueing activities observed by the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Activity {
    Registration,
    Consultation,
    TestBooking,
    CallAnswer,
}

impl Activity {
    pub const ALL: [Activity; 4] = [
        Activity::Registration,
        Activity::Consultation,
        Activity::TestBooking,
        Activity::CallAnswer,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Activity::Registration => "registration",
            Activity::Consultation => "consultation",
            Activity::TestBooking => "test booking",
            Activity::CallAnswer => "answering call",
        }
    }
}

/// Append-only sequences of queueing durations per activity plus the
/// per-patient total time in system.
#[derive(Debug, Default)]
pub struct StatsSink {
    registration: Vec<f64>,
    consultation: Vec<f64>,
    test_booking: Vec<f64>,
    call_answer: Vec<f64>,
    total_times: Vec<f64>,
}

impl StatsSink {
    pub fn new() -> StatsSink {
        StatsSink::default()
    }

    pub fn record(&mut self, activity: Activity, value: f64) {
        self.sequence_mut(activity).push(value);
    }

    pub fn record_total_time(&mut self, value: f64) {
        self.total_times.push(value);
    }

    pub fn observations(&self, activity: Activity) -> &[f64] {
        match activity {
            Activity::Registration => &self.registration,
            Activity::Consultation => &self.consultation,
            Activity::TestBooking => &self.test_booking,
            Activity::CallAnswer => &self.call_answer,
        }
    }

    pub fn total_times(&self) -> &[f64] {
        &self.total_times
    }

    /// Mean queueing duration for one activity, `None` when nothing was
    /// recorded.
    pub fn mean(&self, activity: Activity) -> Option<f64> {
        mean_of(self.observations(activity))
    }

    pub fn mean_total_time(&self) -> Option<f64> {
        mean_of(&self.total_times)
    }

    fn sequence_mut(&mut self, activity: Activity) -> &mut Vec<f64> {
        match activity {
            Activity::Registration => &mut self.registration,
            Activity::Consultation => &mut self.consultation,
            Activity::TestBooking => &mut self.test_booking,
            Activity::CallAnswer => &mut self.call_answer,
        }
    }
}

fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
