//! Parallel execution of independent simulation scenarios.
//!
//! A batch run is a set of scenarios that share no mutable state: each
//! job builds its own event loop, resources and sinks from scratch,
//! typically deriving a seed from the scenario id. Because every run owns
//! a disjoint world, scenarios can execute on real parallel workers while
//! staying bit-for-bit deterministic.
//!
//! # Example
//!
//! ```rust
//! use des::parallel::ParallelRunner;
//!
//! let results = ParallelRunner::new(10, |scenario_id| {
//!     // Build a simulation seeded from scenario_id, run it and
//!     // return a summary value.
//!     Ok::<usize, String>(scenario_id * 2)
//! })
//! .num_threads(4)
//! .run();
//!
//! assert_eq!(results.len(), 10);
//! assert_eq!(results[3], Ok(6));
//! ```
//!
//! # Error handling
//!
//! A job may fail by returning `Err` or by panicking; panics are caught
//! per scenario and converted to `Err(String)`, so one bad run never
//! takes down the rest of the batch.

use rayon::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Executes independent scenario jobs in parallel.
///
/// The job `F` takes a scenario id and returns a summary value for that
/// run. Results come back in scenario-id order regardless of execution
/// order or thread count.
pub struct ParallelRunner<S, F>
where
    F: Fn(usize) -> Result<S, String> + Send + Sync,
    S: Send,
{
    num_scenarios: usize,
    job: F,
    num_threads: Option<usize>,
    progress_callback: Option<Arc<dyn Fn(usize, usize) + Send + Sync>>,
}

impl<S, F> ParallelRunner<S, F>
where
    F: Fn(usize) -> Result<S, String> + Send + Sync,
    S: Send,
{
    pub fn new(num_scenarios: usize, job: F) -> Self {
        ParallelRunner {
            num_scenarios,
            job,
            num_threads: None,
            progress_callback: None,
        }
    }

    /// Set the number of worker threads (defaults to rayon's global pool).
    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    /// Set a progress callback, called with `(completed, total)` after
    /// each scenario finishes.
    pub fn progress<P>(mut self, callback: P) -> Self
    where
        P: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.progress_callback = Some(Arc::new(callback));
        self
    }

    /// Execute all scenarios and return their results in scenario order.
    ///
    /// Panicking scenarios are captured and returned as `Err(String)`;
    /// the remaining scenarios keep running.
    pub fn run(self) -> Vec<Result<S, String>> {
        let progress_counter = Arc::new(AtomicUsize::new(0));

        let pool = self.num_threads.and_then(|n| {
            rayon::ThreadPoolBuilder::new().num_threads(n).build().ok()
        });

        let execute = || {
            (0..self.num_scenarios)
                .into_par_iter()
                .map(|scenario_id| {
                    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                        (self.job)(scenario_id)
                    }));

                    let completed = progress_counter.fetch_add(1, Ordering::SeqCst) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        callback(completed, self.num_scenarios);
                    }

                    match result {
                        Ok(outcome) => outcome,
                        Err(panic) => {
                            let message = if let Some(s) = panic.downcast_ref::<&str>() {
                                s.to_string()
                            } else if let Some(s) = panic.downcast_ref::<String>() {
                                s.clone()
                            } else {
                                "unknown panic".to_string()
                            };
                            Err(message)
                        }
                    }
                })
                .collect()
        };

        if let Some(pool) = pool {
            pool.install(execute)
        } else {
            execute()
        }
    }
}

/// Run scenarios in parallel with the default pool.
pub fn run_parallel<S, F>(num_scenarios: usize, job: F) -> Vec<Result<S, String>>
where
    F: Fn(usize) -> Result<S, String> + Send + Sync,
    S: Send,
{
    ParallelRunner::new(num_scenarios, job).run()
}

/// Run scenarios in batches to limit the number in flight at once.
///
/// Useful for very large experiments where every concurrent scenario
/// holds its full simulation state in memory.
pub fn run_batched<S, F>(
    num_scenarios: usize,
    batch_size: usize,
    job: F,
) -> Vec<Result<S, String>>
where
    F: Fn(usize) -> Result<S, String> + Send + Sync,
    S: Send,
{
    let mut all_results = Vec::with_capacity(num_scenarios);

    for batch_start in (0..num_scenarios).step_by(batch_size.max(1)) {
        let batch_end = (batch_start + batch_size.max(1)).min(num_scenarios);
        let batch_results = run_parallel(batch_end - batch_start, |local_id| {
            job(batch_start + local_id)
        });
        all_results.extend(batch_results);
    }

    all_results
}

/// Progress callback that prints every `interval` completed scenarios.
pub fn simple_progress_reporter(interval: usize) -> impl Fn(usize, usize) + Send + Sync {
    move |completed, total| {
        if completed % interval.max(1) == 0 || completed == total {
            println!("  Completed {}/{} scenarios", completed, total);
        }
    }
}
