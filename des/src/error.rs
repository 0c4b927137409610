//! Error taxonomy for the simulation engine.
//!
//! Configuration errors are raised at construction time, before any event
//! is dispatched. Invariant violations signal a programming defect in a
//! process or resource interaction and abort the run; they are never
//! silently corrected. A process still suspended at the horizon is not an
//! error and produces no variant here.

use crate::{ProcessId, ResourceId};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A resource was created with capacity zero.
    #[error("resource capacity must be at least 1")]
    InvalidCapacity,

    /// `run` was called with a horizon that is not a positive finite time.
    #[error("simulation horizon must be positive and finite, got {0}")]
    InvalidHorizon(f64),

    /// A process released a resource it does not currently hold.
    #[error("process {process} released resource {resource} without holding it")]
    ReleasedByNonHolder {
        resource: ResourceId,
        process: ProcessId,
    },

    /// A process requested a resource while already holding a slot or
    /// already waiting for one.
    #[error("process {process} requested resource {resource} twice")]
    DuplicateRequest {
        resource: ResourceId,
        process: ProcessId,
    },

    /// An effect named a resource id that was never registered.
    #[error("unknown resource id {0}")]
    UnknownResource(ResourceId),

    /// An event targeted a process id that is not alive.
    #[error("unknown process id {0}")]
    UnknownProcess(ProcessId),
}
