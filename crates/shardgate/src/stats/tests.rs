use crate::{OperationKind, PoolStats, StatsRegistry};
use core::time::Duration;
use std::sync::Arc;
use std::thread::scope;

#[test]
fn in_flight_counters_follow_guards() {
    let stats = PoolStats::new("db");
    let q = stats.begin(OperationKind::Query);
    let e = stats.begin(OperationKind::Execute);
    assert_eq!(stats.querying(), 1);
    assert_eq!(stats.executing(), 1);

    q.finish(Duration::from_millis(10), false);
    assert_eq!(stats.querying(), 0);
    drop(e);
    assert_eq!(stats.executing(), 0);

    assert_eq!(stats.query_count(), 1);
    assert_eq!(stats.exec_count(), 1);
    // Only the finished operation contributes latency.
    assert_eq!(stats.completed(), 1);
}

#[test]
fn latency_totals_average_and_max() {
    let stats = PoolStats::new("cache");
    assert_eq!(stats.avg_time(), Duration::ZERO);

    for ms in [10, 30, 20] {
        stats
            .begin(OperationKind::Query)
            .finish(Duration::from_millis(ms), false);
    }

    assert_eq!(stats.total_time(), Duration::from_millis(60));
    assert_eq!(stats.avg_time(), Duration::from_millis(20));
    assert_eq!(stats.max_time(), Duration::from_millis(30));
}

#[test]
fn errors_include_timeouts() {
    let stats = PoolStats::new("cache");
    stats
        .begin(OperationKind::Execute)
        .finish(Duration::from_millis(1), true);
    stats.record_timeout();
    stats.record_rejection();

    let snap = stats.snapshot();
    assert_eq!(snap.errors, 2);
    assert_eq!(snap.timeouts, 1);
    assert_eq!(snap.rejected, 1);
    assert_eq!(snap.completed, 1);
}

#[test]
fn concurrent_updates_are_not_lost() {
    const THREADS: usize = 8;
    const OPS: usize = 1000;

    let stats = PoolStats::new("hot");
    scope(|s| {
        for t in 0..THREADS {
            let stats = &stats;
            s.spawn(move || {
                let kind = OperationKind::from_read_only(t % 2 == 0);
                for _ in 0..OPS {
                    stats.begin(kind).finish(Duration::from_micros(1), false);
                }
            });
        }
    });

    let snap = stats.snapshot();
    assert_eq!(snap.completed, (THREADS * OPS) as u64);
    assert_eq!(snap.query_count + snap.exec_count, (THREADS * OPS) as u64);
    assert_eq!(snap.querying, 0);
    assert_eq!(snap.executing, 0);
    assert_eq!(snap.total_time, Duration::from_micros((THREADS * OPS) as u64));
}

#[test]
fn registry_tracks_live_pools_only() {
    let registry = StatsRegistry::new();
    let a = Arc::new(PoolStats::new("a"));
    let b = Arc::new(PoolStats::new("b"));
    registry.register(&a);
    registry.register(&b);
    registry.register(&a);
    assert_eq!(registry.len(), 2);

    drop(b);
    let names: Vec<String> = registry.snapshot().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["a"]);
}

#[test]
fn registry_unregister_and_clear() {
    let registry = StatsRegistry::new();
    let a = Arc::new(PoolStats::new("a"));
    let b = Arc::new(PoolStats::new("b"));
    registry.register(&a);
    registry.register(&b);

    assert!(registry.unregister("a"));
    assert!(!registry.unregister("a"));
    assert_eq!(registry.pools().len(), 1);

    registry.clear();
    assert!(registry.is_empty());
}

#[test]
fn registries_are_isolated() {
    let first = StatsRegistry::new();
    let second = StatsRegistry::new();
    let pool = Arc::new(PoolStats::new("only-first"));
    first.register(&pool);

    assert_eq!(first.len(), 1);
    assert!(second.is_empty());
}
