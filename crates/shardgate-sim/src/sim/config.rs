use anyhow::bail;
use clap::Parser;
use core::time::Duration;
use shardgate::{PoolConfig, SHARDS_MAX};

/// Runtime configuration for the `shardgate-sim` binary.
///
/// The pool settings mirror [`PoolConfig`]; the remaining options shape the
/// simulated backend and the generated load. All values can be given as CLI
/// arguments or environment variables (a `.env` file is honoured).
#[derive(Parser, Debug, Clone)]
#[command(
    name = "shardgate-sim",
    version,
    about = "Drives a gated in-memory cache under load and reports pool statistics"
)]
pub struct CliArgs {
    /// Pool name used in diagnostics and the final report.
    ///
    /// Environment variable: `POOL_NAME`
    #[arg(long, env = "POOL_NAME", default_value_t = String::from("sim"))]
    pub pool_name: String,

    /// Maximum number of backend calls in flight at once.
    ///
    /// Environment variable: `POOL_CAPACITY`
    #[arg(long, env = "POOL_CAPACITY", default_value_t = 512)]
    pub capacity: usize,

    /// How long an operation may wait for a permit, in milliseconds.
    ///
    /// Environment variable: `ACQUIRE_TIMEOUT_MS`
    #[arg(long, env = "ACQUIRE_TIMEOUT_MS", default_value_t = 3_000)]
    pub acquire_timeout_ms: u64,

    /// Acquisitions and calls slower than this are reported, in milliseconds.
    ///
    /// Environment variable: `SLOW_THRESHOLD_MS`
    #[arg(long, env = "SLOW_THRESHOLD_MS", default_value_t = 500)]
    pub slow_threshold_ms: u64,

    /// Upper bound on concurrently running shard groups per multi-key call.
    ///
    /// Environment variable: `MAX_PARALLEL_SHARDS`
    #[arg(long, env = "MAX_PARALLEL_SHARDS", default_value_t = 100)]
    pub max_parallel_shards: usize,

    /// Number of shards keys are routed across.
    ///
    /// Environment variable: `SHARD_COUNT`
    #[arg(long, env = "SHARD_COUNT", default_value_t = 16_384)]
    pub shard_count: usize,

    /// Start the pool in read-only mode. Writes are then rejected and show up
    /// as `rejected` in the report.
    ///
    /// Environment variable: `READ_ONLY`
    #[arg(long, env = "READ_ONLY", default_value_t = false)]
    pub read_only: bool,

    /// Emit a DEBUG statement line for every backend call.
    ///
    /// Environment variable: `LOG_STATEMENTS`
    #[arg(long, env = "LOG_STATEMENTS", default_value_t = false)]
    pub log_statements: bool,

    /// Number of client threads issuing operations. Defaults to the number of
    /// logical CPUs.
    ///
    /// Environment variable: `NUM_WORKERS`
    #[arg(long, env = "NUM_WORKERS")]
    pub num_workers: Option<usize>,

    /// How long to generate load, in seconds.
    ///
    /// Environment variable: `DURATION_SECS`
    #[arg(long, env = "DURATION_SECS", default_value_t = 5)]
    pub duration_secs: u64,

    /// Keys touched by each multi-key operation.
    ///
    /// Environment variable: `KEYS_PER_OP`
    #[arg(long, env = "KEYS_PER_OP", default_value_t = 8)]
    pub keys_per_op: usize,

    /// Size of the key space operations draw from.
    ///
    /// Environment variable: `KEY_SPACE`
    #[arg(long, env = "KEY_SPACE", default_value_t = 10_000)]
    pub key_space: usize,

    /// Number of distinct hash tags keys are spread over. Zero disables
    /// hash tags, so every key is routed on its own.
    ///
    /// Environment variable: `HASH_TAGS`
    #[arg(long, env = "HASH_TAGS", default_value_t = 0)]
    pub hash_tags: usize,

    /// Simulated latency of every backend call, in microseconds.
    ///
    /// Environment variable: `BACKEND_LATENCY_US`
    #[arg(long, env = "BACKEND_LATENCY_US", default_value_t = 200)]
    pub backend_latency_us: u64,

    /// Probability in `[0, 1]` that a backend call fails.
    ///
    /// Environment variable: `FAILURE_RATE`
    #[arg(long, env = "FAILURE_RATE", default_value_t = 0.0)]
    pub failure_rate: f64,
}

#[derive(Debug, Clone)]
pub struct SimConfig {
    pub pool: PoolConfig,
    pub num_workers: usize,
    pub duration: Duration,
    pub keys_per_op: usize,
    pub key_space: usize,
    pub hash_tags: usize,
    pub backend_latency: Duration,
    pub failure_rate: f64,
}

impl TryFrom<CliArgs> for SimConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let num_workers = args.num_workers.unwrap_or_else(num_cpus::get);
        if num_workers == 0 {
            bail!("NUM_WORKERS must be greater than 0");
        }

        if args.keys_per_op == 0 {
            bail!("KEYS_PER_OP must be greater than 0");
        }

        if args.key_space == 0 {
            bail!("KEY_SPACE must be greater than 0");
        }

        if !(0.0..=1.0).contains(&args.failure_rate) {
            bail!(
                "FAILURE_RATE ({}) must be within [0, 1]",
                args.failure_rate
            );
        }

        if args.shard_count > SHARDS_MAX {
            bail!(
                "SHARD_COUNT ({}) exceeds the routable shard space (max = {})",
                args.shard_count,
                SHARDS_MAX
            );
        }

        let pool = PoolConfig::new(args.pool_name)
            .with_capacity(args.capacity)
            .with_acquire_timeout(Duration::from_millis(args.acquire_timeout_ms))
            .with_slow_threshold(Duration::from_millis(args.slow_threshold_ms))
            .with_max_parallel_shards(args.max_parallel_shards)
            .with_shard_count(args.shard_count)
            .with_read_only(args.read_only)
            .with_log_statements(args.log_statements);
        pool.validate()?;

        Ok(Self {
            pool,
            num_workers,
            duration: Duration::from_secs(args.duration_secs),
            keys_per_op: args.keys_per_op,
            key_space: args.key_space,
            hash_tags: args.hash_tags,
            backend_latency: Duration::from_micros(args.backend_latency_us),
            failure_rate: args.failure_rate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> anyhow::Result<SimConfig> {
        let argv = std::iter::once("shardgate-sim").chain(args.iter().copied());
        SimConfig::try_from(CliArgs::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_are_valid() {
        let config = parse(&["--num-workers", "4"]).unwrap();
        assert_eq!(config.num_workers, 4);
        assert_eq!(config.pool.name, "sim");
        assert_eq!(config.pool.capacity, 512);
        assert_eq!(config.duration, Duration::from_secs(5));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(parse(&["--num-workers", "0"]).is_err());
        assert!(parse(&["--failure-rate", "1.5"]).is_err());
        assert!(parse(&["--capacity", "0"]).is_err());
        assert!(parse(&["--shard-count", "70000"]).is_err());
        assert!(parse(&["--keys-per-op", "0"]).is_err());
    }
}
