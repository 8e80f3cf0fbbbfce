//! An in-memory cache standing in for a remote cluster.

use core::time::Duration;
use parking_lot::Mutex;
use rand::{Rng, rng};
use shardgate::{Backend, Command, Operation, Reply};
use std::collections::HashMap;
use std::thread::sleep;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SimError {
    #[error("injected failure in `{command}`")]
    Injected { command: String },
    #[error("wrong number of arguments for `{command}`")]
    WrongArity { command: String },
    #[error("unknown command `{command}`")]
    UnknownCommand { command: String },
}

/// Key/value store behind a single lock, with a fixed per-call latency and a
/// random failure rate.
///
/// The latency is slept outside the lock so that concurrency is limited by
/// the admission gate, not by the store.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    store: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    latency: Duration,
    failure_rate: f64,
}

impl MemoryBackend {
    pub fn new(latency: Duration, failure_rate: f64) -> Self {
        Self {
            store: Mutex::new(HashMap::new()),
            latency,
            failure_rate,
        }
    }

    /// Number of stored keys.
    pub fn key_count(&self) -> usize {
        self.store.lock().len()
    }

    fn apply(&self, op: &Command) -> Result<Reply, SimError> {
        let args = op.arguments();
        let arity = |ok: bool| {
            if ok {
                Ok(())
            } else {
                Err(SimError::WrongArity {
                    command: op.name().to_owned(),
                })
            }
        };

        let mut store = self.store.lock();
        match op.name() {
            "PING" => Ok(Reply::Status("PONG".into())),
            "GET" => {
                arity(args.len() == 1)?;
                Ok(store.get(&args[0]).cloned().map_or(Reply::Nil, Reply::Bulk))
            }
            "SET" => {
                arity(args.len() == 2)?;
                store.insert(args[0].clone(), args[1].clone());
                Ok(Reply::Status("OK".into()))
            }
            "MGET" => {
                arity(!args.is_empty())?;
                Ok(Reply::Array(
                    args.iter()
                        .map(|k| store.get(k).cloned().map_or(Reply::Nil, Reply::Bulk))
                        .collect(),
                ))
            }
            "MSET" => {
                arity(!args.is_empty() && args.len() % 2 == 0)?;
                for kv in args.chunks_exact(2) {
                    store.insert(kv[0].clone(), kv[1].clone());
                }
                Ok(Reply::Status("OK".into()))
            }
            "MSETNX" => {
                arity(!args.is_empty() && args.len() % 2 == 0)?;
                if args.chunks_exact(2).any(|kv| store.contains_key(&kv[0])) {
                    return Ok(Reply::Integer(0));
                }
                for kv in args.chunks_exact(2) {
                    store.insert(kv[0].clone(), kv[1].clone());
                }
                Ok(Reply::Integer(1))
            }
            "DEL" => {
                arity(!args.is_empty())?;
                let removed = args.iter().filter(|k| store.remove(*k).is_some()).count();
                Ok(Reply::Integer(i64::try_from(removed).unwrap_or(i64::MAX)))
            }
            name => Err(SimError::UnknownCommand {
                command: name.to_owned(),
            }),
        }
    }
}

impl Backend for MemoryBackend {
    type Op = Command;
    type Reply = Reply;
    type Error = SimError;

    fn call(&self, op: &Command) -> Result<Reply, SimError> {
        if !self.latency.is_zero() {
            sleep(self.latency);
        }
        if self.failure_rate > 0.0 && rng().random_bool(self.failure_rate) {
            return Err(SimError::Injected {
                command: op.name().to_owned(),
            });
        }
        self.apply(op)
    }
}
