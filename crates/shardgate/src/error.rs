//! Error types for gated pool access.
//!
//! [`Error`] captures every failure a caller of [`GatedClient`] can observe.
//! It is generic over the backend's own error type `E` so that the external
//! client's failures travel through unchanged in [`Error::Backend`].
//!
//! ## Error Cases
//! - `AcquisitionTimeout`: no permit became available within the configured
//!   window. Recoverable; never retried internally.
//! - `ReadOnlyRejected`: a mutating operation reached a pool in read-only
//!   mode. No permit was consumed.
//! - `Backend`: the external call failed. During a fan-out this is the
//!   representative failure of one of the sub-requests.
//! - `UnexpectedReply`: a sub-reply could not be split back onto its keys.
//! - `Config`: the pool was built from an invalid [`PoolConfig`].
//!
//! An empty key routed through the [`SlotRouter`] is not an error; it is
//! assigned a random shard.
//!
//! [`GatedClient`]: crate::GatedClient
//! [`PoolConfig`]: crate::PoolConfig
//! [`SlotRouter`]: crate::SlotRouter

use core::time::Duration;

/// A result type defaulting to the crate's [`Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// A configuration value was rejected.
///
/// Raised when a pool, router or fan-out executor is constructed, never while
/// an operation is running.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid configuration: {reason}")]
pub struct ConfigError {
    pub reason: String,
}

impl ConfigError {
    pub(crate) fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Unified error type for gated operations.
///
/// The generic parameter `E` is the error type of the wrapped [`Backend`].
/// APIs that never touch a backend use the default, [`core::convert::Infallible`].
///
/// [`Backend`]: crate::Backend
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error<E = core::convert::Infallible> {
    /// No permit was obtained before the acquisition window closed.
    #[error("pool `{pool}` exhausted: no permit after {waited:?}")]
    AcquisitionTimeout { pool: String, waited: Duration },

    /// A mutating operation was attempted while the pool is read-only.
    #[error("pool `{pool}` is read-only, rejected `{operation}`")]
    ReadOnlyRejected { pool: String, operation: String },

    /// The external client reported a failure.
    #[error("backend error: {0}")]
    Backend(#[source] E),

    /// A reply had a shape that cannot be mapped back onto its keys.
    #[error("unexpected reply to `{operation}`: {reply}")]
    UnexpectedReply { operation: String, reply: String },

    /// The pool configuration was rejected.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl<E> Error<E> {
    /// Returns `true` for [`Error::AcquisitionTimeout`].
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::AcquisitionTimeout { .. })
    }

    /// Returns `true` for [`Error::ReadOnlyRejected`].
    pub const fn is_read_only(&self) -> bool {
        matches!(self, Self::ReadOnlyRejected { .. })
    }

    /// Returns the backend error, if this is one.
    pub const fn backend(&self) -> Option<&E> {
        match self {
            Self::Backend(e) => Some(e),
            _ => None,
        }
    }
}
