use core::time::Duration;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::gate::Permit;

/// A counting admission gate bounding concurrent operations against one
/// resource pool.
///
/// The gate holds `capacity` permits. [`acquire`] and [`acquire_timeout`]
/// consume one, [`release`] returns one and wakes a single waiter. The number
/// of available permits is kept under a [`Mutex`] and never drops below zero,
/// so the number of outstanding permits never exceeds `capacity`.
///
/// Timed acquisition waits on the [`Condvar`] with a deadline. There is no
/// helper thread racing a timer, so a timed-out caller never leaves a permit
/// behind that somebody else has to give back.
///
/// ## Features
/// - ✅ Thread-safe, shareable behind an `Arc`
/// - ✅ Blocking, timed and non-blocking acquisition
/// - ✅ RAII [`Permit`] guards for exactly-once release
///
/// Wake order among waiters is unspecified.
///
/// # Example
/// ```
/// use core::time::Duration;
/// use shardgate::AdmissionGate;
///
/// let gate = AdmissionGate::new(2);
/// assert!(gate.acquire_timeout(Duration::from_millis(10)));
/// assert!(gate.acquire_timeout(Duration::from_millis(10)));
/// assert!(!gate.acquire_timeout(Duration::from_millis(10)));
///
/// gate.release();
/// assert_eq!(gate.available(), 1);
/// ```
///
/// [`acquire`]: AdmissionGate::acquire
/// [`acquire_timeout`]: AdmissionGate::acquire_timeout
/// [`release`]: AdmissionGate::release
#[derive(Debug)]
pub struct AdmissionGate {
    capacity: usize,
    available: Mutex<usize>,
    released: Condvar,
}

impl AdmissionGate {
    /// Creates a gate holding `capacity` permits, all available.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Pool configurations are validated before
    /// a gate is built, so reaching this is a programming error.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "admission gate capacity must be > 0");
        Self {
            capacity,
            available: Mutex::new(capacity),
            released: Condvar::new(),
        }
    }

    /// Returns the configured number of permits.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the number of permits currently available.
    ///
    /// The value may be stale by the time the caller looks at it.
    pub fn available(&self) -> usize {
        *self.available.lock()
    }

    /// Returns the number of permits currently held.
    pub fn in_use(&self) -> usize {
        self.capacity - self.available()
    }

    /// Blocks until a permit is available, then consumes it.
    ///
    /// There is no timeout. Prefer [`Self::acquire_timeout`] anywhere an
    /// unbounded wait is unacceptable.
    pub fn acquire(&self) {
        let mut available = self.available.lock();
        while *available == 0 {
            self.released.wait(&mut available);
        }
        *available -= 1;
    }

    /// Consumes a permit if one is available right now.
    pub fn try_acquire(&self) -> bool {
        let mut available = self.available.lock();
        if *available == 0 {
            return false;
        }
        *available -= 1;
        true
    }

    /// Attempts to consume a permit, waiting at most `timeout`.
    ///
    /// Returns `true` if a permit was consumed. Returns `false` and leaves the
    /// gate untouched if none became available in time; running out of time
    /// is a normal outcome, not an error.
    ///
    /// A `timeout` too large to be represented as a deadline waits without
    /// bound.
    pub fn acquire_timeout(&self, timeout: Duration) -> bool {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.acquire();
            return true;
        };

        let mut available = self.available.lock();
        while *available == 0 {
            if self
                .released
                .wait_until(&mut available, deadline)
                .timed_out()
            {
                // A release may have landed right at the deadline.
                if *available == 0 {
                    return false;
                }
                break;
            }
        }
        *available -= 1;
        true
    }

    /// Returns one permit to the gate and wakes one waiter, if any.
    ///
    /// Never waits for a permit; the internal lock is only held for the
    /// increment.
    ///
    /// # Panics
    ///
    /// Panics if every permit is already available, which means a permit was
    /// released twice or released without being acquired.
    pub fn release(&self) {
        {
            let mut available = self.available.lock();
            assert!(
                *available < self.capacity,
                "admission gate released more permits than were acquired (capacity {})",
                self.capacity
            );
            *available += 1;
        }
        self.released.notify_one();
    }

    /// Blocks until a permit is available and returns a guard that releases
    /// it on drop.
    pub fn acquire_permit(&self) -> Permit<'_> {
        self.acquire();
        Permit::new(self)
    }

    /// Like [`Self::try_acquire`], returning a guard on success.
    pub fn try_permit(&self) -> Option<Permit<'_>> {
        self.try_acquire().then(|| Permit::new(self))
    }

    /// Like [`Self::acquire_timeout`], returning a guard on success.
    ///
    /// # Example
    /// ```
    /// use core::time::Duration;
    /// use shardgate::AdmissionGate;
    ///
    /// let gate = AdmissionGate::new(1);
    /// {
    ///     let _permit = gate.try_acquire_for(Duration::from_millis(5)).unwrap();
    ///     assert_eq!(gate.in_use(), 1);
    /// }
    /// assert_eq!(gate.in_use(), 0);
    /// ```
    pub fn try_acquire_for(&self, timeout: Duration) -> Option<Permit<'_>> {
        self.acquire_timeout(timeout).then(|| Permit::new(self))
    }
}
