//! # shardgate
//!
//! Admission control and fan-out primitives for shared database and cache
//! connection pools.
//!
//! The crate bounds how many remote operations are in flight against one
//! resource pool and splits multi-key cache commands across a hash-slot key
//! space:
//!
//! - [`AdmissionGate`]: a counting permit store with blocking, non-blocking
//!   and timed acquisition.
//! - [`SlotRouter`]: CRC16 hash-slot routing with `{hash-tag}` co-location.
//! - [`FanOut`]: runs independent tasks on scoped threads with a hard cap on
//!   parallelism and fail-fast error propagation.
//! - [`GatedClient`]: wraps a [`Backend`] so that every call is gated, timed,
//!   accounted in [`PoolStats`] and reported through a [`DiagnosticSink`].
//!
//! ## Example
//!
//! ```
//! use core::time::Duration;
//! use shardgate::{AdmissionGate, FanOut, SlotRouter};
//!
//! let gate = AdmissionGate::new(2);
//! let router = SlotRouter::default();
//! let fan_out = FanOut::new(4).unwrap();
//!
//! let keys = ["{user:1}.name", "{user:1}.email", "{user:2}.name"];
//! let groups = router.group_by_shard(&keys);
//! assert_eq!(groups.len(), 2);
//!
//! let sizes = fan_out
//!     .try_map(groups.values().map(|group| {
//!         let gate = &gate;
//!         move || match gate.try_acquire_for(Duration::from_secs(1)) {
//!             Some(_permit) => Ok(group.len()),
//!             None => Err("pool exhausted"),
//!         }
//!     }))
//!     .unwrap();
//! assert_eq!(sizes.iter().sum::<usize>(), keys.len());
//! ```
//!
//! ## Features
//!
//! - `cache-padded`: pads the hot in-flight counters of [`PoolStats`] to a
//!   cache line.
//! - `serde`: `Serialize`/`Deserialize` for [`PoolConfig`], [`StatsSnapshot`]
//!   and [`OperationKind`].

mod client;
mod config;
mod diagnostics;
mod error;
mod fanout;
mod gate;
mod operation;
mod rand;
mod router;
mod stats;

pub use crate::client::*;
pub use crate::config::*;
pub use crate::diagnostics::*;
pub use crate::error::*;
pub use crate::fanout::*;
pub use crate::gate::*;
pub use crate::operation::*;
pub use crate::rand::*;
pub use crate::router::*;
pub use crate::stats::*;
