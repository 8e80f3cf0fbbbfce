use core::fmt;

/// A cache reply, as returned by a [`Backend`] whose operation type is
/// [`Command`].
///
/// [`Backend`]: crate::Backend
/// [`Command`]: crate::Command
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reply {
    Nil,
    Status(String),
    Integer(i64),
    Bulk(Vec<u8>),
    Array(Vec<Reply>),
}

impl Reply {
    /// `true` for the `OK` status reply.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Status(s) if s == "OK")
    }

    pub const fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Converts a single-value reply into its payload. `Nil` becomes
    /// `Ok(None)`; any other non-bulk reply is handed back as the error.
    pub fn into_bulk(self) -> Result<Option<Vec<u8>>, Self> {
        match self {
            Self::Nil => Ok(None),
            Self::Bulk(bytes) => Ok(Some(bytes)),
            Self::Status(s) => Ok(Some(s.into_bytes())),
            other => Err(other),
        }
    }

    pub fn into_array(self) -> Result<Vec<Reply>, Self> {
        match self {
            Self::Array(items) => Ok(items),
            other => Err(other),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nil => f.write_str("(nil)"),
            Self::Status(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "(integer) {n}"),
            Self::Bulk(bytes) => write!(f, "\"{}\"", String::from_utf8_lossy(bytes)),
            Self::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
