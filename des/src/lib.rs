//! Discrete-event simulation engine.
//!
//! Virtual time is an `f64` clock owned by the [`EventLoop`]. Many
//! processes are alive at once but at most one executes at any virtual
//! instant: the loop pops the earliest pending event, advances the clock
//! and resumes exactly that process, which runs uninterrupted until its
//! next suspension point. Same-time events are serialized by creation
//! order, so a run is fully deterministic for a fixed seed and program
//! structure.
//!
//! Processes are explicit state machines implementing [`Process`]: each
//! `resume` call advances the machine one step and returns the [`Effect`]
//! the engine should perform next. `Delay` and a blocked `Acquire` park
//! the process; `Release`, `Spawn` and an immediate grant resume it
//! synchronously within the same dispatch.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};

pub mod error;
pub mod parallel;

pub use error::Error;

pub type ProcessId = usize;
pub type ResourceId = usize;

/// What a process asks the engine to do when it yields control.
pub enum Effect {
    /// Suspend for the given number of virtual-time units (>= 0).
    Delay(f64),
    /// Suspend until a slot of the resource is granted. If a slot is free
    /// the grant is immediate and the process is resumed synchronously.
    Acquire(ResourceId),
    /// Free a held slot and wake the longest-waiting requester, if any.
    /// Does not suspend the caller.
    Release(ResourceId),
    /// Register a new process and schedule its first resumption at the
    /// current time. Does not suspend the caller.
    Spawn(Box<dyn Process>),
    /// Terminate; the process is discarded.
    Done,
}

/// A cooperative process driven by the event loop.
///
/// `resume` is called once when the process starts (at its spawn time) and
/// again whenever the effect it returned has been satisfied: after a delay
/// elapses, after a requested resource is granted, or immediately after a
/// non-suspending effect.
pub trait Process {
    fn resume(&mut self, now: f64) -> Effect;
}

/// A pending resumption. Ordered by `(time, seq)`; `seq` is assigned from
/// a strictly increasing counter at creation, which makes same-time events
/// pop in creation order.
struct Event {
    time: f64,
    seq: u64,
    pid: ProcessId,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq && self.time.total_cmp(&other.time).is_eq()
    }
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed so the BinaryHeap pops the earliest event first.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A capacity-limited, FIFO-fair mutual-exclusion primitive.
///
/// A requester is either holding a slot or waiting in the queue, never
/// both. Excess requesters queue in arrival order and the head of the
/// queue inherits a freed slot on release.
pub struct Resource {
    id: ResourceId,
    capacity: usize,
    in_use: usize,
    holders: HashSet<ProcessId>,
    wait_queue: VecDeque<ProcessId>,
}

impl Resource {
    fn new(id: ResourceId, capacity: usize) -> Resource {
        Resource {
            id,
            capacity,
            in_use: 0,
            holders: HashSet::new(),
            wait_queue: VecDeque::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn in_use(&self) -> usize {
        self.in_use
    }

    pub fn queue_len(&self) -> usize {
        self.wait_queue.len()
    }

    pub fn is_holder(&self, pid: ProcessId) -> bool {
        self.holders.contains(&pid)
    }

    /// Returns `true` when the slot was granted immediately, `false` when
    /// the requester was appended to the wait queue.
    fn acquire(&mut self, pid: ProcessId) -> Result<bool, Error> {
        if self.holders.contains(&pid) || self.wait_queue.contains(&pid) {
            return Err(Error::DuplicateRequest {
                resource: self.id,
                process: pid,
            });
        }
        if self.in_use < self.capacity {
            self.in_use += 1;
            self.holders.insert(pid);
            Ok(true)
        } else {
            self.wait_queue.push_back(pid);
            Ok(false)
        }
    }

    /// Frees the caller's slot. When the queue is non-empty the freed slot
    /// is transferred to its head, whose id is returned so the engine can
    /// schedule a zero-delay wake-up.
    fn release(&mut self, pid: ProcessId) -> Result<Option<ProcessId>, Error> {
        if !self.holders.remove(&pid) {
            return Err(Error::ReleasedByNonHolder {
                resource: self.id,
                process: pid,
            });
        }
        self.in_use -= 1;
        match self.wait_queue.pop_front() {
            Some(next) => {
                self.in_use += 1;
                self.holders.insert(next);
                Ok(Some(next))
            }
            None => Ok(None),
        }
    }
}

/// The virtual-time scheduler.
#[derive(Default)]
pub struct EventLoop {
    queue: BinaryHeap<Event>,
    clock: f64,
    next_seq: u64,
    next_pid: ProcessId,
    processes: HashMap<ProcessId, Box<dyn Process>>,
    resources: Vec<Resource>,
}

impl EventLoop {
    pub fn new() -> EventLoop {
        EventLoop::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> f64 {
        self.clock
    }

    /// Registers a resource with the given slot count.
    pub fn add_resource(&mut self, capacity: usize) -> Result<ResourceId, Error> {
        if capacity == 0 {
            return Err(Error::InvalidCapacity);
        }
        let id = self.resources.len();
        self.resources.push(Resource::new(id, capacity));
        Ok(id)
    }

    /// Read-only view of a resource, mainly for inspection in tests.
    pub fn resource(&self, id: ResourceId) -> Option<&Resource> {
        self.resources.get(id)
    }

    /// Number of processes currently alive (running or suspended).
    pub fn active_processes(&self) -> usize {
        self.processes.len()
    }

    /// Registers a process and schedules its first resumption at the
    /// current time.
    pub fn spawn(&mut self, process: Box<dyn Process>) -> ProcessId {
        let pid = self.next_pid;
        self.next_pid += 1;
        self.processes.insert(pid, process);
        self.push_event(self.clock, pid);
        pid
    }

    /// Schedules a resumption of `pid` after `delay` time units.
    pub fn schedule_after(&mut self, delay: f64, pid: ProcessId) {
        self.push_event(self.clock + delay.max(0.0), pid);
    }

    fn push_event(&mut self, time: f64, pid: ProcessId) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event { time, seq, pid });
    }

    /// Dispatches events in `(time, seq)` order until the next one would
    /// exceed `until`. The horizon is a hard cutoff: processes still
    /// suspended when it is reached are abandoned without error.
    pub fn run(&mut self, until: f64) -> Result<(), Error> {
        if !until.is_finite() || until <= 0.0 {
            return Err(Error::InvalidHorizon(until));
        }
        loop {
            match self.queue.peek() {
                Some(event) if event.time <= until => {}
                _ => break,
            }
            let Some(event) = self.queue.pop() else { break };
            debug_assert!(event.time >= self.clock);
            self.clock = event.time;
            self.dispatch(event.pid)?;
        }
        Ok(())
    }

    /// Resumes one process and follows its effects until it parks or
    /// terminates. Execution between suspension points is atomic: nothing
    /// else runs until this returns.
    fn dispatch(&mut self, pid: ProcessId) -> Result<(), Error> {
        let mut process = self
            .processes
            .remove(&pid)
            .ok_or(Error::UnknownProcess(pid))?;
        loop {
            match process.resume(self.clock) {
                Effect::Delay(delay) => {
                    self.push_event(self.clock + delay.max(0.0), pid);
                    self.processes.insert(pid, process);
                    return Ok(());
                }
                Effect::Acquire(rid) => {
                    let resource = self
                        .resources
                        .get_mut(rid)
                        .ok_or(Error::UnknownResource(rid))?;
                    if resource.acquire(pid)? {
                        continue;
                    }
                    // Parked on the wait queue; woken by a release.
                    self.processes.insert(pid, process);
                    return Ok(());
                }
                Effect::Release(rid) => {
                    let resource = self
                        .resources
                        .get_mut(rid)
                        .ok_or(Error::UnknownResource(rid))?;
                    if let Some(next) = resource.release(pid)? {
                        self.push_event(self.clock, next);
                    }
                }
                Effect::Spawn(child) => {
                    self.spawn(child);
                }
                Effect::Done => return Ok(()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn min_queue_pops_earliest_time() {
        let mut queue = BinaryHeap::new();
        queue.push(Event {
            time: 2.0,
            seq: 0,
            pid: 0,
        });
        queue.push(Event {
            time: 1.0,
            seq: 1,
            pid: 1,
        });
        let first = queue.pop().unwrap();
        assert_eq!(first.pid, 1);
    }

    #[test]
    fn same_time_events_pop_in_creation_order() {
        let mut queue = BinaryHeap::new();
        for seq in 0..5u64 {
            queue.push(Event {
                time: 3.0,
                seq: 4 - seq,
                pid: (4 - seq) as usize,
            });
        }
        let order: Vec<usize> = std::iter::from_fn(|| queue.pop().map(|e| e.pid)).collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }

    /// Fires once after a fixed delay and records the time it fired.
    struct OneShot {
        delay: f64,
        started: bool,
        fired: Rc<RefCell<Vec<f64>>>,
    }

    impl Process for OneShot {
        fn resume(&mut self, now: f64) -> Effect {
            if self.started {
                self.fired.borrow_mut().push(now);
                Effect::Done
            } else {
                self.started = true;
                Effect::Delay(self.delay)
            }
        }
    }

    fn one_shot(delay: f64, fired: &Rc<RefCell<Vec<f64>>>) -> Box<OneShot> {
        Box::new(OneShot {
            delay,
            started: false,
            fired: Rc::clone(fired),
        })
    }

    #[test]
    fn delays_fire_in_time_order() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut event_loop = EventLoop::new();
        event_loop.spawn(one_shot(5.0, &fired));
        event_loop.spawn(one_shot(2.0, &fired));
        event_loop.spawn(one_shot(9.0, &fired));
        event_loop.run(10.0).unwrap();
        assert_eq!(*fired.borrow(), vec![2.0, 5.0, 9.0]);
        assert_eq!(event_loop.now(), 9.0);
        assert_eq!(event_loop.active_processes(), 0);
    }

    #[test]
    fn horizon_is_a_hard_cutoff() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut event_loop = EventLoop::new();
        event_loop.spawn(one_shot(20.0, &fired));
        event_loop.run(10.0).unwrap();
        // The process is abandoned, not an error.
        assert!(fired.borrow().is_empty());
        assert_eq!(event_loop.active_processes(), 1);
    }

    #[test]
    fn invalid_horizon_is_rejected() {
        let mut event_loop = EventLoop::new();
        assert_eq!(event_loop.run(0.0), Err(Error::InvalidHorizon(0.0)));
        assert_eq!(event_loop.run(-1.0), Err(Error::InvalidHorizon(-1.0)));
        assert!(event_loop.run(f64::INFINITY).is_err());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let mut event_loop = EventLoop::new();
        assert_eq!(event_loop.add_resource(0), Err(Error::InvalidCapacity));
        assert!(event_loop.add_resource(1).is_ok());
    }

    /// Acquires a resource, holds it for `service` time units, releases
    /// and records the grant time.
    struct Worker {
        id: usize,
        resource: ResourceId,
        service: f64,
        step: u8,
        grants: Rc<RefCell<Vec<(usize, f64)>>>,
    }

    impl Process for Worker {
        fn resume(&mut self, now: f64) -> Effect {
            match self.step {
                0 => {
                    self.step = 1;
                    Effect::Acquire(self.resource)
                }
                1 => {
                    self.grants.borrow_mut().push((self.id, now));
                    self.step = 2;
                    Effect::Delay(self.service)
                }
                2 => {
                    self.step = 3;
                    Effect::Release(self.resource)
                }
                _ => Effect::Done,
            }
        }
    }

    #[test]
    fn waiters_are_granted_in_fifo_order() {
        let grants = Rc::new(RefCell::new(Vec::new()));
        let mut event_loop = EventLoop::new();
        let counter = event_loop.add_resource(1).unwrap();
        for id in 0..3 {
            event_loop.spawn(Box::new(Worker {
                id,
                resource: counter,
                service: 5.0,
                step: 0,
                grants: Rc::clone(&grants),
            }));
        }
        event_loop.run(100.0).unwrap();
        // Spawn order is arrival order; each grant waits for the previous
        // holder's full service time.
        assert_eq!(*grants.borrow(), vec![(0, 0.0), (1, 5.0), (2, 10.0)]);
        let resource = event_loop.resource(counter).unwrap();
        assert_eq!(resource.in_use(), 0);
        assert_eq!(resource.queue_len(), 0);
    }

    #[test]
    fn capacity_two_grants_two_immediately() {
        let grants = Rc::new(RefCell::new(Vec::new()));
        let mut event_loop = EventLoop::new();
        let counter = event_loop.add_resource(2).unwrap();
        for id in 0..3 {
            event_loop.spawn(Box::new(Worker {
                id,
                resource: counter,
                service: 4.0,
                step: 0,
                grants: Rc::clone(&grants),
            }));
        }
        event_loop.run(100.0).unwrap();
        assert_eq!(*grants.borrow(), vec![(0, 0.0), (1, 0.0), (2, 4.0)]);
    }

    struct RogueReleaser {
        resource: ResourceId,
    }

    impl Process for RogueReleaser {
        fn resume(&mut self, _now: f64) -> Effect {
            Effect::Release(self.resource)
        }
    }

    #[test]
    fn release_by_non_holder_is_an_invariant_violation() {
        let mut event_loop = EventLoop::new();
        let counter = event_loop.add_resource(1).unwrap();
        let pid = event_loop.spawn(Box::new(RogueReleaser { resource: counter }));
        assert_eq!(
            event_loop.run(1.0),
            Err(Error::ReleasedByNonHolder {
                resource: counter,
                process: pid,
            })
        );
    }

    struct DoubleAcquirer {
        resource: ResourceId,
        requests: u8,
    }

    impl Process for DoubleAcquirer {
        fn resume(&mut self, _now: f64) -> Effect {
            if self.requests < 2 {
                self.requests += 1;
                Effect::Acquire(self.resource)
            } else {
                Effect::Done
            }
        }
    }

    #[test]
    fn duplicate_request_is_an_invariant_violation() {
        let mut event_loop = EventLoop::new();
        let counter = event_loop.add_resource(2).unwrap();
        let pid = event_loop.spawn(Box::new(DoubleAcquirer {
            resource: counter,
            requests: 0,
        }));
        assert_eq!(
            event_loop.run(1.0),
            Err(Error::DuplicateRequest {
                resource: counter,
                process: pid,
            })
        );
    }

    /// Spawns `count` one-shots, one per time unit.
    struct Nursery {
        remaining: usize,
        fired: Rc<RefCell<Vec<f64>>>,
        spawning: bool,
    }

    impl Process for Nursery {
        fn resume(&mut self, _now: f64) -> Effect {
            if self.spawning {
                self.spawning = false;
                self.remaining -= 1;
                Effect::Spawn(one_shot(0.5, &self.fired))
            } else if self.remaining > 0 {
                self.spawning = true;
                Effect::Delay(1.0)
            } else {
                Effect::Done
            }
        }
    }

    #[test]
    fn spawned_children_start_at_the_current_time() {
        let fired = Rc::new(RefCell::new(Vec::new()));
        let mut event_loop = EventLoop::new();
        event_loop.spawn(Box::new(Nursery {
            remaining: 3,
            fired: Rc::clone(&fired),
            spawning: true,
        }));
        event_loop.run(10.0).unwrap();
        assert_eq!(*fired.borrow(), vec![0.5, 1.5, 2.5]);
    }
}
