//! Bounded fan-out over OS threads.
//!
//! [`FanOut`] runs a batch of independent tasks, one scoped thread per task,
//! with at most `max_parallel` task bodies executing at any moment. The first
//! failure raises a shared abort flag: tasks that have not started their body
//! yet skip it, tasks already running are left to finish. Every thread is
//! joined before the call returns.

use core::num::NonZeroUsize;
use std::panic::resume_unwind;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread;

use parking_lot::Mutex;

use crate::ConfigError;
use crate::fanout::throttle::Throttle;

/// Bounded-parallelism executor with fail-fast error propagation.
///
/// The executor itself holds only its parallelism limit; each [`run`] call
/// gets a fresh throttle and abort flag, so one `FanOut` may be shared by any
/// number of concurrent callers.
///
/// ## Guarantees
/// - At most `max_parallel` task bodies run concurrently within one call.
/// - An `Err` means at least one task failed. Which failure is returned when
///   several tasks fail is unspecified.
/// - Cancellation is cooperative: a body that has started always completes.
/// - No thread outlives the call, even when every task fails immediately.
///
/// # Example
/// ```
/// use shardgate::FanOut;
///
/// let fan_out = FanOut::new(2).unwrap();
/// let squares = fan_out
///     .try_map((1..=4).map(|n| move || Ok::<_, ()>(n * n)))
///     .unwrap();
/// assert_eq!(squares, [1, 4, 9, 16]);
/// ```
///
/// [`run`]: FanOut::run
#[derive(Clone, Copy, Debug)]
pub struct FanOut {
    max_parallel: NonZeroUsize,
}

impl FanOut {
    /// Creates an executor running at most `max_parallel` task bodies at once.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `max_parallel` is zero.
    pub fn new(max_parallel: usize) -> Result<Self, ConfigError> {
        NonZeroUsize::new(max_parallel)
            .map(|max_parallel| Self { max_parallel })
            .ok_or_else(|| ConfigError::new("fan-out parallelism must be > 0"))
    }

    /// Returns the parallelism limit.
    pub const fn max_parallel(&self) -> usize {
        self.max_parallel.get()
    }

    /// Runs every task, returning one of the recorded errors if any failed.
    ///
    /// An empty task set returns `Ok(())` without spawning anything.
    pub fn run<I, F, E>(&self, tasks: I) -> Result<(), E>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Result<(), E> + Send,
        E: Send,
    {
        self.try_map(tasks).map(|_: Vec<()>| ())
    }

    /// Runs every task and collects their outputs in input order.
    ///
    /// Output order follows the task order regardless of completion order.
    /// On failure the partial outputs are discarded and one recorded error is
    /// returned.
    ///
    /// # Panics
    ///
    /// A panic inside a task is re-raised on the calling thread once all
    /// other tasks have been joined.
    pub fn try_map<I, F, T, E>(&self, tasks: I) -> Result<Vec<T>, E>
    where
        I: IntoIterator<Item = F>,
        F: FnOnce() -> Result<T, E> + Send,
        T: Send,
        E: Send,
    {
        let tasks: Vec<F> = tasks.into_iter().collect();
        if tasks.is_empty() {
            return Ok(Vec::new());
        }
        let total = tasks.len();

        let throttle = Throttle::new(self.max_parallel.get());
        let aborted = AtomicBool::new(false);
        let skipped = AtomicUsize::new(0);
        let failure: Mutex<Option<E>> = Mutex::new(None);

        let outputs: Vec<Option<T>> = thread::scope(|s| {
            let handles: Vec<_> = tasks
                .into_iter()
                .map(|task| {
                    let (throttle, aborted, skipped, failure) =
                        (&throttle, &aborted, &skipped, &failure);
                    s.spawn(move || {
                        let _token = throttle.take();
                        if aborted.load(Ordering::Acquire) {
                            skipped.fetch_add(1, Ordering::Relaxed);
                            return None;
                        }
                        match task() {
                            Ok(output) => Some(output),
                            Err(e) => {
                                aborted.store(true, Ordering::Release);
                                let mut slot = failure.lock();
                                if slot.is_none() {
                                    *slot = Some(e);
                                }
                                None
                            }
                        }
                    })
                })
                .collect();

            handles
                .into_iter()
                .map(|handle| {
                    handle.join().unwrap_or_else(|panic| {
                        aborted.store(true, Ordering::Release);
                        resume_unwind(panic)
                    })
                })
                .collect()
        });

        if let Some(e) = failure.into_inner() {
            tracing::debug!(
                tasks = total,
                skipped = skipped.into_inner(),
                "fan-out aborted after task failure"
            );
            return Err(e);
        }

        Ok(outputs.into_iter().flatten().collect())
    }
}
