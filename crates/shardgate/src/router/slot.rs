use std::collections::BTreeMap;

use crate::{ConfigError, RandSource, ThreadRandom, crc16};

/// Number of hash slots in a cluster-mode cache keyspace.
pub const SLOT_COUNT: usize = 16_384;

/// Upper bound on the shard count. A CRC-16 cannot address more.
pub const SHARDS_MAX: usize = 1 << 16;

/// Returns the hash-tag of `key`, or `key` itself when it has none.
///
/// The tag is the text between the first `{` and the first `}` after it. An
/// empty tag (`"{}"`) or a missing closing brace means there is no tag and the
/// whole key is hashed.
///
/// # Example
/// ```
/// use shardgate::hash_tag;
///
/// assert_eq!(hash_tag(b"a{user1}b"), b"user1");
/// assert_eq!(hash_tag(b"{}x"), b"{}x");
/// assert_eq!(hash_tag(b"plain"), b"plain");
/// ```
pub fn hash_tag(key: &[u8]) -> &[u8] {
    if let Some(open) = key.iter().position(|&b| b == b'{') {
        let rest = &key[open + 1..];
        if let Some(close) = rest.iter().position(|&b| b == b'}') {
            if close > 0 {
                return &rest[..close];
            }
        }
    }
    key
}

/// Maps `key` to a shard in `[0, shard_count)` using the thread-local RNG for
/// empty keys.
///
/// Shorthand for [`SlotRouter::shard`] when no router is at hand.
///
/// # Panics
///
/// Panics if `shard_count` is zero.
pub fn shard(key: impl AsRef<[u8]>, shard_count: usize) -> usize {
    assert!(shard_count > 0, "shard count must be > 0");
    shard_with(key.as_ref(), shard_count, &ThreadRandom)
}

fn shard_with<R: RandSource>(key: &[u8], shard_count: usize, rand: &R) -> usize {
    let input = hash_tag(key);
    if input.is_empty() {
        return rand.below(shard_count);
    }
    usize::from(crc16(input)) % shard_count
}

/// Deterministic key-to-shard router honouring hash-tags.
///
/// The shard of a key is `crc16(tag_or_key) % shard_count`, so keys sharing a
/// hash-tag always land together and the mapping is stable across processes.
/// An empty key has nothing to hash and is sent to a random shard drawn from
/// `R`; callers must not rely on where an empty key goes.
///
/// # Example
/// ```
/// use shardgate::SlotRouter;
///
/// let router = SlotRouter::default();
/// assert_eq!(router.shard("a{user1}b"), router.shard("{user1}"));
///
/// let groups = router.group_by_shard(&["{u1}.a", "{u1}.b", "{u2}.c"]);
/// assert_eq!(groups.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct SlotRouter<R = ThreadRandom> {
    shard_count: usize,
    rand: R,
}

impl Default for SlotRouter {
    /// A router over the standard [`SLOT_COUNT`] slots.
    fn default() -> Self {
        Self {
            shard_count: SLOT_COUNT,
            rand: ThreadRandom,
        }
    }
}

impl SlotRouter {
    /// Creates a router over `shard_count` shards.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if `shard_count` is zero or exceeds
    /// [`SHARDS_MAX`].
    pub fn new(shard_count: usize) -> Result<Self, ConfigError> {
        Self::with_rand(shard_count, ThreadRandom)
    }
}

impl<R: RandSource> SlotRouter<R> {
    /// Creates a router that draws shards for empty keys from `rand`.
    ///
    /// # Errors
    ///
    /// Same as [`SlotRouter::new`].
    pub fn with_rand(shard_count: usize, rand: R) -> Result<Self, ConfigError> {
        if shard_count == 0 || shard_count > SHARDS_MAX {
            return Err(ConfigError::new(format!(
                "shard count must be in 1..={SHARDS_MAX}, got {shard_count}"
            )));
        }
        Ok(Self { shard_count, rand })
    }

    /// Returns the number of shards keys are spread over.
    pub const fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Returns the shard of `key`, in `[0, shard_count)`.
    pub fn shard(&self, key: impl AsRef<[u8]>) -> usize {
        shard_with(key.as_ref(), self.shard_count, &self.rand)
    }

    /// Partitions `keys` by shard, returning the input positions of each
    /// group.
    ///
    /// Every index appears in exactly one group, and indices keep their input
    /// order within a group.
    pub fn group_indices<K: AsRef<[u8]>>(&self, keys: &[K]) -> BTreeMap<usize, Vec<usize>> {
        let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        for (i, key) in keys.iter().enumerate() {
            groups.entry(self.shard(key)).or_default().push(i);
        }
        groups
    }

    /// Partitions `keys` by shard, keeping input order within each group.
    pub fn group_by_shard<'k, K: AsRef<[u8]>>(&self, keys: &'k [K]) -> BTreeMap<usize, Vec<&'k K>> {
        self.group_indices(keys)
            .into_iter()
            .map(|(shard, idx)| (shard, idx.into_iter().map(|i| &keys[i]).collect()))
            .collect()
    }
}
