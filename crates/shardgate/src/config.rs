use core::time::Duration;

use crate::{ConfigError, SHARDS_MAX, SLOT_COUNT};

/// Per-pool settings for a [`GatedClient`].
///
/// Defaults match a general-purpose cache pool: 512 permits, a 3 second
/// acquisition window, a 500 ms slow threshold, at most 100 shard groups in
/// flight per multi-key call and the full 16384-slot key space.
///
/// # Example
/// ```
/// use core::time::Duration;
/// use shardgate::PoolConfig;
///
/// let config = PoolConfig::new("sessions")
///     .with_capacity(32)
///     .with_acquire_timeout(Duration::from_millis(200));
/// assert!(config.validate().is_ok());
///
/// assert!(PoolConfig::default().with_capacity(0).validate().is_err());
/// ```
///
/// [`GatedClient`]: crate::GatedClient
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PoolConfig {
    /// Name used in diagnostics and stats.
    pub name: String,
    /// Maximum number of operations in flight at once.
    pub capacity: usize,
    /// How long an operation may wait for a permit.
    pub acquire_timeout: Duration,
    /// Acquisitions and operations slower than this raise diagnostics.
    pub slow_threshold: Duration,
    /// Upper bound on concurrently running shard groups per multi-key call.
    pub max_parallel_shards: usize,
    /// Number of shards keys are routed across.
    pub shard_count: usize,
    /// Reject operations that are not read-only.
    pub read_only: bool,
    /// Emit a DEBUG statement diagnostic for every completed operation.
    pub log_statements: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            name: String::from("default"),
            capacity: 512,
            acquire_timeout: Duration::from_secs(3),
            slow_threshold: Duration::from_millis(500),
            max_parallel_shards: 100,
            shard_count: SLOT_COUNT,
            read_only: false,
            log_statements: false,
        }
    }
}

impl PoolConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub const fn with_acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_slow_threshold(mut self, threshold: Duration) -> Self {
        self.slow_threshold = threshold;
        self
    }

    #[must_use]
    pub const fn with_max_parallel_shards(mut self, max: usize) -> Self {
        self.max_parallel_shards = max;
        self
    }

    #[must_use]
    pub const fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    #[must_use]
    pub const fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    #[must_use]
    pub const fn with_log_statements(mut self, enabled: bool) -> Self {
        self.log_statements = enabled;
        self
    }

    /// Checks the settings a client cannot run with.
    ///
    /// # Errors
    /// - `capacity` is zero
    /// - `max_parallel_shards` is zero
    /// - `shard_count` is zero or greater than [`SHARDS_MAX`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::new(format!(
                "pool `{}`: capacity must be > 0",
                self.name
            )));
        }
        if self.max_parallel_shards == 0 {
            return Err(ConfigError::new(format!(
                "pool `{}`: max_parallel_shards must be > 0",
                self.name
            )));
        }
        if self.shard_count == 0 || self.shard_count > SHARDS_MAX {
            return Err(ConfigError::new(format!(
                "pool `{}`: shard_count must be in 1..={SHARDS_MAX}, got {}",
                self.name, self.shard_count
            )));
        }
        Ok(())
    }
}
