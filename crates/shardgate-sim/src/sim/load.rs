//! Threaded load generation against a gated client.
//!
//! Each worker loops until the deadline, picking an operation at random:
//! half multi-key reads, three in ten multi-key writes, the rest single-key
//! reads. Outcomes are tallied per category so the report can be compared
//! against the pool's own statistics.

use crate::sim::backend::{MemoryBackend, SimError};
use crate::sim::config::SimConfig;
use rand::{Rng, rng};
use shardgate::{Command, Error, GatedClient};
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::scope;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct LoadReport {
    pub ok: AtomicU64,
    pub timeouts: AtomicU64,
    pub rejected: AtomicU64,
    pub backend_errors: AtomicU64,
    pub other_errors: AtomicU64,
}

impl LoadReport {
    fn record<T>(&self, result: &Result<T, Error<SimError>>) {
        let counter = match result {
            Ok(_) => &self.ok,
            Err(Error::AcquisitionTimeout { .. }) => &self.timeouts,
            Err(Error::ReadOnlyRejected { .. }) => &self.rejected,
            Err(Error::Backend(_)) => &self.backend_errors,
            Err(_) => &self.other_errors,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn total(&self) -> u64 {
        [
            &self.ok,
            &self.timeouts,
            &self.rejected,
            &self.backend_errors,
            &self.other_errors,
        ]
        .iter()
        .map(|c| c.load(Ordering::Relaxed))
        .sum()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "total": self.total(),
            "ok": self.ok.load(Ordering::Relaxed),
            "timeouts": self.timeouts.load(Ordering::Relaxed),
            "rejected": self.rejected.load(Ordering::Relaxed),
            "backend_errors": self.backend_errors.load(Ordering::Relaxed),
            "other_errors": self.other_errors.load(Ordering::Relaxed),
        })
    }
}

/// Builds the key for slot `n`, optionally prefixed with one of
/// `config.hash_tags` tags.
fn key(config: &SimConfig, n: usize) -> String {
    match config.hash_tags {
        0 => format!("key:{n}"),
        tags => format!("{{tag{}}}:key:{n}", n % tags),
    }
}

fn random_keys(config: &SimConfig) -> Vec<String> {
    let mut r = rng();
    (0..config.keys_per_op)
        .map(|_| key(config, r.random_range(0..config.key_space)))
        .collect()
}

fn one_op(config: &SimConfig, client: &GatedClient<MemoryBackend>, report: &LoadReport) {
    let roll = rng().random_range(0..100_u32);
    if roll < 50 {
        report.record(&client.mget(&random_keys(config)));
    } else if roll < 80 {
        let pairs: Vec<(String, String)> = random_keys(config)
            .into_iter()
            .map(|k| {
                let v = format!("v:{k}");
                (k, v)
            })
            .collect();
        report.record(&client.mset(&pairs));
    } else {
        let n = rng().random_range(0..config.key_space);
        report.record(&client.execute(&Command::new("GET").arg(key(config, n))));
    }
}

/// Runs `config.num_workers` threads against `client` for
/// `config.duration`.
pub fn run(config: &SimConfig, client: &GatedClient<MemoryBackend>) -> LoadReport {
    let report = LoadReport::default();
    let deadline = Instant::now() + config.duration;

    scope(|s| {
        for worker in 0..config.num_workers {
            let report = &report;
            s.spawn(move || {
                tracing::debug!(worker, "load worker started");
                while Instant::now() < deadline {
                    one_op(config, client, report);
                }
                tracing::debug!(worker, "load worker finished");
            });
        }
    });

    report
}
