use crate::Operation;

/// Commands that never modify a cache. Sorted for binary search.
const READ_ONLY_COMMANDS: &[&str] = &[
    "BITCOUNT",
    "BITPOS",
    "DBSIZE",
    "DUMP",
    "EXISTS",
    "GEODIST",
    "GEOHASH",
    "GEOPOS",
    "GEORADIUSBYMEMBER_RO",
    "GEORADIUS_RO",
    "GET",
    "GETBIT",
    "GETRANGE",
    "HEXISTS",
    "HGET",
    "HGETALL",
    "HKEYS",
    "HLEN",
    "HMGET",
    "HSCAN",
    "HSTRLEN",
    "HVALS",
    "KEYS",
    "LINDEX",
    "LLEN",
    "LRANGE",
    "MGET",
    "PING",
    "PTTL",
    "RANDOMKEY",
    "SCAN",
    "SCARD",
    "SISMEMBER",
    "SMEMBERS",
    "SRANDMEMBER",
    "SSCAN",
    "STRLEN",
    "TTL",
    "TYPE",
    "ZCARD",
    "ZCOUNT",
    "ZRANGE",
    "ZRANGEBYSCORE",
    "ZRANK",
    "ZREVRANGE",
    "ZREVRANGEBYSCORE",
    "ZREVRANK",
    "ZSCAN",
    "ZSCORE",
];

/// A cache command: an upper-cased name followed by binary arguments.
///
/// # Example
/// ```
/// use shardgate::{Command, Operation};
///
/// let cmd = Command::new("mget").arg("a").arg("b");
/// assert_eq!(cmd.name(), "MGET");
/// assert!(cmd.is_read_only());
/// assert_eq!(cmd.describe().as_deref(), Some("MGET a"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Command {
    name: String,
    args: Vec<Vec<u8>>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        let mut name = name.into();
        name.make_ascii_uppercase();
        Self {
            name,
            args: Vec::new(),
        }
    }

    /// Appends one argument.
    pub fn arg(mut self, arg: impl AsRef<[u8]>) -> Self {
        self.push_arg(arg);
        self
    }

    /// Appends every argument of `args`.
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
    {
        for arg in args {
            self.push_arg(arg);
        }
        self
    }

    pub fn push_arg(&mut self, arg: impl AsRef<[u8]>) {
        self.args.push(arg.as_ref().to_vec());
    }

    pub fn arguments(&self) -> &[Vec<u8>] {
        &self.args
    }
}

impl Operation for Command {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_read_only(&self) -> bool {
        READ_ONLY_COMMANDS.binary_search(&self.name.as_str()).is_ok()
    }

    fn describe(&self) -> Option<String> {
        let key = self.args.first()?;
        Some(format!("{} {}", self.name, String::from_utf8_lossy(key)))
    }
}

#[cfg(test)]
#[test]
fn read_only_table_is_sorted() {
    assert!(READ_ONLY_COMMANDS.windows(2).all(|w| w[0] < w[1]));
}
