use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::{PoolStats, StatsSnapshot};

/// A directory of the pools a monitoring collaborator reports on.
///
/// The registry is an ordinary value: construct one per process (or per test)
/// and hand it to whatever needs it. It only holds weak references, so a pool
/// that is dropped disappears from reports without an explicit
/// [`unregister`], and repeatedly creating pools does not grow it without
/// bound.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use shardgate::{PoolStats, StatsRegistry};
///
/// let registry = StatsRegistry::new();
/// let stats = Arc::new(PoolStats::new("cache"));
/// registry.register(&stats);
/// assert_eq!(registry.snapshot()[0].name, "cache");
///
/// drop(stats);
/// assert!(registry.snapshot().is_empty());
/// ```
///
/// [`unregister`]: StatsRegistry::unregister
#[derive(Debug, Default)]
pub struct StatsRegistry {
    pools: RwLock<Vec<Weak<PoolStats>>>,
}

impl StatsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `stats` to the registry. Registering the same pool twice is a
    /// no-op.
    pub fn register(&self, stats: &Arc<PoolStats>) {
        let mut pools = self.pools.write();
        pools.retain(|p| p.strong_count() > 0);
        let weak = Arc::downgrade(stats);
        if !pools.iter().any(|p| p.ptr_eq(&weak)) {
            pools.push(weak);
        }
    }

    /// Removes every pool called `name`. Returns whether anything was
    /// removed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut pools = self.pools.write();
        pools.retain(|p| p.strong_count() > 0);
        let before = pools.len();
        pools.retain(|p| p.upgrade().is_some_and(|s| s.name() != name));
        pools.len() != before
    }

    /// Number of live pools.
    pub fn len(&self) -> usize {
        self.pools
            .read()
            .iter()
            .filter(|p| p.strong_count() > 0)
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the live pools in registration order.
    pub fn pools(&self) -> Vec<Arc<PoolStats>> {
        self.pools.read().iter().filter_map(Weak::upgrade).collect()
    }

    /// Takes a snapshot of every live pool, in registration order.
    pub fn snapshot(&self) -> Vec<StatsSnapshot> {
        self.pools().iter().map(|s| s.snapshot()).collect()
    }

    /// Forgets every pool.
    pub fn clear(&self) {
        self.pools.write().clear();
    }
}
