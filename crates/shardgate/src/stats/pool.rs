use core::time::Duration;

use portable_atomic::{AtomicI64, AtomicU64, Ordering};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cache-padded")]
type Padded<T> = crossbeam_utils::CachePadded<T>;
#[cfg(not(feature = "cache-padded"))]
type Padded<T> = T;

#[cfg(feature = "cache-padded")]
const fn padded<T>(value: T) -> Padded<T> {
    crossbeam_utils::CachePadded::new(value)
}
#[cfg(not(feature = "cache-padded"))]
const fn padded<T>(value: T) -> Padded<T> {
    value
}

/// Whether an operation reads or mutates the backend.
///
/// Reads are accounted as *queries*, everything else as *executes*.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum OperationKind {
    Query,
    Execute,
}

impl OperationKind {
    pub const fn from_read_only(read_only: bool) -> Self {
        if read_only { Self::Query } else { Self::Execute }
    }
}

/// Counters shared by every operation against one resource pool.
///
/// All updates are atomic. Reads are for reporting and may be slightly out of
/// date relative to each other; take a [`StatsSnapshot`] for a consistent-ish
/// view in one go. Counters are never reset.
///
/// `errors` counts both failed backend calls and acquisition timeouts;
/// `timeouts` counts the latter alone.
#[derive(Debug)]
pub struct PoolStats {
    name: String,
    querying: Padded<AtomicI64>,
    executing: Padded<AtomicI64>,
    query_count: AtomicU64,
    exec_count: AtomicU64,
    completed: AtomicU64,
    errors: AtomicU64,
    timeouts: AtomicU64,
    rejected: AtomicU64,
    total_nanos: AtomicU64,
    max_nanos: AtomicU64,
}

impl PoolStats {
    /// Creates zeroed counters for the pool called `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            querying: padded(AtomicI64::new(0)),
            executing: padded(AtomicI64::new(0)),
            query_count: AtomicU64::new(0),
            exec_count: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            total_nanos: AtomicU64::new(0),
            max_nanos: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Read-only operations currently executing.
    pub fn querying(&self) -> i64 {
        self.querying.load(Ordering::Relaxed)
    }

    /// Mutating operations currently executing.
    pub fn executing(&self) -> i64 {
        self.executing.load(Ordering::Relaxed)
    }

    pub fn query_count(&self) -> u64 {
        self.query_count.load(Ordering::Relaxed)
    }

    pub fn exec_count(&self) -> u64 {
        self.exec_count.load(Ordering::Relaxed)
    }

    /// Operations that reached the backend and returned.
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn errors(&self) -> u64 {
        self.errors.load(Ordering::Relaxed)
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts.load(Ordering::Relaxed)
    }

    /// Operations refused by read-only mode.
    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    pub fn max_time(&self) -> Duration {
        Duration::from_nanos(self.max_nanos.load(Ordering::Relaxed))
    }

    /// Mean backend latency over all completed operations.
    pub fn avg_time(&self) -> Duration {
        match self.completed() {
            0 => Duration::ZERO,
            n => Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed) / n),
        }
    }

    /// Marks an operation of `kind` as started. The returned guard keeps it
    /// counted as in flight until it is finished or dropped.
    pub(crate) fn begin(&self, kind: OperationKind) -> InFlight<'_> {
        match kind {
            OperationKind::Query => {
                self.querying.fetch_add(1, Ordering::Relaxed);
                self.query_count.fetch_add(1, Ordering::Relaxed);
            }
            OperationKind::Execute => {
                self.executing.fetch_add(1, Ordering::Relaxed);
                self.exec_count.fetch_add(1, Ordering::Relaxed);
            }
        }
        InFlight { stats: self, kind }
    }

    pub(crate) fn record_timeout(&self) {
        self.timeouts.fetch_add(1, Ordering::Relaxed);
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_rejection(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    fn record_done(&self, elapsed: Duration, failed: bool) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.total_nanos.fetch_add(nanos, Ordering::Relaxed);
        self.max_nanos.fetch_max(nanos, Ordering::Relaxed);
        if failed {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copies every counter into a plain value.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            name: self.name.clone(),
            querying: self.querying(),
            executing: self.executing(),
            query_count: self.query_count(),
            exec_count: self.exec_count(),
            completed: self.completed(),
            errors: self.errors(),
            timeouts: self.timeouts(),
            rejected: self.rejected(),
            total_time: self.total_time(),
            avg_time: self.avg_time(),
            max_time: self.max_time(),
        }
    }
}

/// An operation counted as in flight.
#[must_use = "dropping the guard ends the operation without recording its latency"]
pub(crate) struct InFlight<'a> {
    stats: &'a PoolStats,
    kind: OperationKind,
}

impl InFlight<'_> {
    /// Ends the operation and records how long the backend took.
    pub(crate) fn finish(self, elapsed: Duration, failed: bool) {
        self.stats.record_done(elapsed, failed);
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let counter = match self.kind {
            OperationKind::Query => &self.stats.querying,
            OperationKind::Execute => &self.stats.executing,
        };
        counter.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of a [`PoolStats`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StatsSnapshot {
    pub name: String,
    pub querying: i64,
    pub executing: i64,
    pub query_count: u64,
    pub exec_count: u64,
    pub completed: u64,
    pub errors: u64,
    pub timeouts: u64,
    pub rejected: u64,
    pub total_time: Duration,
    pub avg_time: Duration,
    pub max_time: Duration,
}
