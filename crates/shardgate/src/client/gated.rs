use std::sync::Arc;
use std::time::Instant;

use portable_atomic::{AtomicBool, Ordering};
use tracing::Level;

use crate::{
    AdmissionGate, Backend, ConfigError, Diagnostic, DiagnosticSink, Error, FanOut, Operation,
    OperationKind, PoolConfig, PoolStats, SlotRouter, StatsRegistry, TracingSink,
};

/// Gated access to one resource pool.
///
/// Every operation passes through the pool's [`AdmissionGate`] before it
/// reaches the [`Backend`], so at most `capacity` calls are ever in flight.
/// Around each call the client:
///
/// - ✅ rejects mutating operations while the pool is read-only, without
///   consuming a permit
/// - ✅ gives up after `acquire_timeout` with [`Error::AcquisitionTimeout`]
/// - ✅ accounts reads and writes separately in [`PoolStats`]
/// - ✅ reports timeouts, slow acquisitions, slow and failed calls through
///   a [`DiagnosticSink`]
///
/// Multi-key operations (`mget`, `mset`, `msetnx`, `del` and the generic
/// [`scatter`]) split their keys by shard and issue one gated sub-call per
/// shard group, at most `max_parallel_shards` at a time.
///
/// # Example
/// ```
/// use shardgate::{Backend, Command, GatedClient, PoolConfig, Reply};
///
/// struct Echo;
///
/// impl Backend for Echo {
///     type Op = Command;
///     type Reply = Reply;
///     type Error = std::io::Error;
///
///     fn call(&self, op: &Command) -> Result<Reply, std::io::Error> {
///         Ok(Reply::Bulk(op.arguments()[0].clone()))
///     }
/// }
///
/// let client = GatedClient::new(Echo, PoolConfig::new("echo")).unwrap();
/// let reply = client.execute(&Command::new("GET").arg("hello")).unwrap();
/// assert_eq!(reply, Reply::Bulk(b"hello".to_vec()));
/// assert_eq!(client.stats().query_count(), 1);
/// ```
///
/// [`scatter`]: GatedClient::scatter
pub struct GatedClient<B> {
    backend: B,
    gate: AdmissionGate,
    router: SlotRouter,
    fan_out: FanOut,
    stats: Arc<PoolStats>,
    sink: Arc<dyn DiagnosticSink>,
    config: PoolConfig,
    read_only: AtomicBool,
}

impl<B: Backend> GatedClient<B> {
    /// Builds a client over `backend`, reporting diagnostics to
    /// [`TracingSink`].
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `config` fails
    /// [`PoolConfig::validate`].
    pub fn new(backend: B, config: PoolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            backend,
            gate: AdmissionGate::new(config.capacity),
            router: SlotRouter::new(config.shard_count)?,
            fan_out: FanOut::new(config.max_parallel_shards)?,
            stats: Arc::new(PoolStats::new(config.name.clone())),
            sink: Arc::new(TracingSink),
            read_only: AtomicBool::new(config.read_only),
            config,
        })
    }

    /// Replaces the diagnostic sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Registers this pool's statistics with `registry`.
    #[must_use]
    pub fn with_registry(self, registry: &StatsRegistry) -> Self {
        registry.register(&self.stats);
        self
    }

    /// Runs one gated operation against the backend.
    ///
    /// # Errors
    ///
    /// - [`Error::ReadOnlyRejected`] if the pool is read-only and `op` is not
    /// - [`Error::AcquisitionTimeout`] if no permit was free within
    ///   `acquire_timeout`
    /// - [`Error::Backend`] if the backend call failed
    pub fn execute(&self, op: &B::Op) -> Result<B::Reply, Error<B::Error>> {
        let read_only = op.is_read_only();
        if !read_only && self.is_read_only() {
            self.stats.record_rejection();
            return Err(Error::ReadOnlyRejected {
                pool: self.config.name.clone(),
                operation: op.name().to_owned(),
            });
        }

        let start = Instant::now();
        let Some(permit) = self.gate.try_acquire_for(self.config.acquire_timeout) else {
            let waited = start.elapsed();
            self.stats.record_timeout();
            self.emit(
                Level::ERROR,
                Diagnostic::AcquireTimeout {
                    pool: self.config.name.clone(),
                    waited,
                    in_use: self.gate.in_use(),
                    capacity: self.gate.capacity(),
                },
            );
            return Err(Error::AcquisitionTimeout {
                pool: self.config.name.clone(),
                waited,
            });
        };

        let waited = start.elapsed();
        if waited > self.config.slow_threshold {
            self.emit(
                Level::WARN,
                Diagnostic::SlowAcquire {
                    pool: self.config.name.clone(),
                    waited,
                    querying: self.stats.querying(),
                    executing: self.stats.executing(),
                },
            );
        }

        let in_flight = self.stats.begin(OperationKind::from_read_only(read_only));
        let start = Instant::now();
        let result = self.backend.call(op);
        let elapsed = start.elapsed();
        drop(permit);

        let failure = match &result {
            Err(e) if !self.backend.is_benign(e) => Some(e),
            _ => None,
        };
        in_flight.finish(elapsed, failure.is_some());

        if let Some(e) = failure {
            self.emit(
                Level::ERROR,
                Diagnostic::OperationFailed {
                    pool: self.config.name.clone(),
                    operation: op.name().to_owned(),
                    error: e.to_string(),
                },
            );
        }
        if elapsed > self.config.slow_threshold {
            self.emit(
                Level::ERROR,
                Diagnostic::SlowOperation {
                    pool: self.config.name.clone(),
                    operation: op.name().to_owned(),
                    target: op.describe(),
                    elapsed,
                    querying: self.stats.querying(),
                    executing: self.stats.executing(),
                },
            );
        }
        if self.config.log_statements {
            self.emit(
                Level::DEBUG,
                Diagnostic::Statement {
                    pool: self.config.name.clone(),
                    operation: op.name().to_owned(),
                    target: op.describe(),
                    elapsed,
                },
            );
        }

        result.map_err(Error::Backend)
    }

    /// Switches read-only mode on or off at runtime.
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::Relaxed);
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only.load(Ordering::Relaxed)
    }

    /// Shared statistics for this pool.
    pub const fn stats(&self) -> &Arc<PoolStats> {
        &self.stats
    }

    pub const fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    pub const fn router(&self) -> &SlotRouter {
        &self.router
    }

    /// Executor bounding the shard groups of one multi-key call.
    pub const fn fan_out(&self) -> &FanOut {
        &self.fan_out
    }

    pub const fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub const fn backend(&self) -> &B {
        &self.backend
    }

    fn emit(&self, level: Level, diagnostic: Diagnostic) {
        self.sink.emit(level, &diagnostic);
    }
}
