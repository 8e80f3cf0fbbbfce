use crate::{
    Backend, Command, Diagnostic, DiagnosticKind, DiagnosticSink, Error, GatedClient, Operation,
    PoolConfig, Reply, StatsRegistry,
};
use core::time::Duration;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{scope, sleep};
use std::time::Instant;
use tracing::Level;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
enum MockError {
    #[error("no such key")]
    Missing,
    #[error("backend down: {0}")]
    Down(String),
}

/// In-memory cache with an optional per-call delay. Any command touching the
/// key `poison` fails.
#[derive(Default)]
struct MockBackend {
    hold: Duration,
    store: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
    calls: Mutex<Vec<Command>>,
    running: AtomicUsize,
    peak: AtomicUsize,
}

impl MockBackend {
    fn holding(hold: Duration) -> Self {
        Self {
            hold,
            ..Self::default()
        }
    }

    fn seeded(pairs: &[(&str, &str)]) -> Self {
        let backend = Self::default();
        backend.store.lock().extend(
            pairs
                .iter()
                .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec())),
        );
        backend
    }

    fn calls(&self) -> Vec<Command> {
        self.calls.lock().clone()
    }

    fn reply(&self, op: &Command) -> Result<Reply, MockError> {
        let args = op.arguments();
        if args.iter().any(|a| a == b"poison") {
            return Err(MockError::Down(op.name().to_owned()));
        }
        let mut store = self.store.lock();
        match op.name() {
            "GET" => store
                .get(&args[0])
                .cloned()
                .map(Reply::Bulk)
                .ok_or(MockError::Missing),
            "SET" => {
                store.insert(args[0].clone(), args[1].clone());
                Ok(Reply::Status("OK".into()))
            }
            "MGET" => Ok(Reply::Array(
                args.iter()
                    .map(|k| store.get(k).cloned().map_or(Reply::Nil, Reply::Bulk))
                    .collect(),
            )),
            "MSET" => {
                for kv in args.chunks(2) {
                    store.insert(kv[0].clone(), kv[1].clone());
                }
                Ok(Reply::Status("OK".into()))
            }
            "MSETNX" => {
                if args.chunks(2).any(|kv| store.contains_key(&kv[0])) {
                    return Ok(Reply::Integer(0));
                }
                for kv in args.chunks(2) {
                    store.insert(kv[0].clone(), kv[1].clone());
                }
                Ok(Reply::Integer(1))
            }
            "DEL" => Ok(Reply::Integer(
                args.iter().filter(|k| store.remove(*k).is_some()).count() as i64,
            )),
            "WRONG" => Ok(Reply::Status("QUEUED".into())),
            _ => Ok(Reply::Status("OK".into())),
        }
    }
}

impl Backend for MockBackend {
    type Op = Command;
    type Reply = Reply;
    type Error = MockError;

    fn call(&self, op: &Command) -> Result<Reply, MockError> {
        self.calls.lock().push(op.clone());
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.hold.is_zero() {
            sleep(self.hold);
        }
        let reply = self.reply(op);
        self.running.fetch_sub(1, Ordering::SeqCst);
        reply
    }

    fn is_benign(&self, error: &MockError) -> bool {
        *error == MockError::Missing
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<(Level, Diagnostic)>>,
}

impl RecordingSink {
    fn count(&self, kind: DiagnosticKind) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|(_, d)| d.kind() == kind)
            .count()
    }

    fn levels(&self, kind: DiagnosticKind) -> Vec<Level> {
        self.events
            .lock()
            .iter()
            .filter(|(_, d)| d.kind() == kind)
            .map(|(level, _)| *level)
            .collect()
    }
}

impl DiagnosticSink for RecordingSink {
    fn emit(&self, level: Level, diagnostic: &Diagnostic) {
        self.events.lock().push((level, diagnostic.clone()));
    }
}

fn client_with(
    backend: MockBackend,
    config: PoolConfig,
) -> (GatedClient<MockBackend>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let client = GatedClient::new(backend, config)
        .unwrap()
        .with_sink(sink.clone());
    (client, sink)
}

fn three_callers_on_two_permits(slow_threshold: Duration) -> (Duration, Arc<RecordingSink>) {
    let config = PoolConfig::new("e2e")
        .with_capacity(2)
        .with_acquire_timeout(Duration::from_millis(200))
        .with_slow_threshold(slow_threshold);
    let (client, sink) = client_with(MockBackend::holding(Duration::from_millis(50)), config);

    let start = Instant::now();
    scope(|s| {
        for i in 0..3 {
            let client = &client;
            s.spawn(move || {
                let cmd = Command::new("SET").arg(format!("k{i}")).arg("v");
                client.execute(&cmd).unwrap();
            });
        }
    });
    let elapsed = start.elapsed();

    assert_eq!(client.backend().peak.load(Ordering::SeqCst), 2);
    assert_eq!(client.stats().completed(), 3);
    assert_eq!(client.stats().timeouts(), 0);
    assert_eq!(client.gate().in_use(), 0);
    (elapsed, sink)
}

#[test]
fn third_caller_waits_for_a_release_then_succeeds() {
    let (elapsed, _) = three_callers_on_two_permits(Duration::from_secs(1));
    // Two rounds of 50ms holds, well inside the 200ms acquisition window.
    assert!(elapsed >= Duration::from_millis(100), "{elapsed:?}");
}

#[test]
fn slow_operations_reported_below_threshold() {
    let (_, sink) = three_callers_on_two_permits(Duration::from_millis(20));
    assert_eq!(sink.count(DiagnosticKind::SlowOperation), 3);
    assert!(
        sink.levels(DiagnosticKind::SlowOperation)
            .iter()
            .all(|l| *l == Level::ERROR)
    );
    // The third caller waited about 50ms for its permit.
    assert_eq!(sink.levels(DiagnosticKind::SlowAcquire), [Level::WARN]);
}

#[test]
fn slow_operations_silent_above_threshold() {
    let (_, sink) = three_callers_on_two_permits(Duration::from_secs(1));
    assert_eq!(sink.count(DiagnosticKind::SlowOperation), 0);
    assert_eq!(sink.count(DiagnosticKind::SlowAcquire), 0);
}

#[test]
fn acquisition_timeout_is_typed_counted_and_reported() {
    let config = PoolConfig::new("tiny")
        .with_capacity(1)
        .with_acquire_timeout(Duration::from_millis(30));
    let (client, sink) = client_with(MockBackend::default(), config);

    let held = client.gate().acquire_permit();
    let err = client.execute(&Command::new("GET").arg("k")).unwrap_err();
    drop(held);

    match err {
        Error::AcquisitionTimeout { pool, waited } => {
            assert_eq!(pool, "tiny");
            assert!(waited >= Duration::from_millis(30), "{waited:?}");
        }
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(client.stats().timeouts(), 1);
    assert_eq!(client.stats().errors(), 1);
    assert_eq!(sink.levels(DiagnosticKind::AcquireTimeout), [Level::ERROR]);
    assert!(client.backend().calls().is_empty());

    // Capacity is back once the holder releases.
    assert!(client.execute(&Command::new("SET").arg("k").arg("v")).is_ok());
}

#[test]
fn read_only_mode_rejects_writes_without_a_permit() {
    let (client, _) = client_with(
        MockBackend::seeded(&[("k", "v")]),
        PoolConfig::new("ro").with_read_only(true),
    );
    assert!(client.is_read_only());

    let err = client
        .execute(&Command::new("SET").arg("k").arg("w"))
        .unwrap_err();
    assert!(err.is_read_only());
    assert_eq!(client.stats().rejected(), 1);
    assert_eq!(client.gate().in_use(), 0);
    assert!(client.backend().calls().is_empty());

    let reply = client.execute(&Command::new("GET").arg("k")).unwrap();
    assert_eq!(reply, Reply::Bulk(b"v".to_vec()));

    client.set_read_only(false);
    assert!(client.execute(&Command::new("SET").arg("k").arg("w")).is_ok());
}

#[test]
fn reads_and_writes_are_accounted_separately() {
    let (client, _) = client_with(MockBackend::default(), PoolConfig::new("acct"));
    client.execute(&Command::new("SET").arg("a").arg("1")).unwrap();
    client.execute(&Command::new("GET").arg("a")).unwrap();
    client.execute(&Command::new("GET").arg("a")).unwrap();

    assert_eq!(client.stats().query_count(), 2);
    assert_eq!(client.stats().exec_count(), 1);
    assert_eq!(client.stats().querying(), 0);
    assert_eq!(client.stats().executing(), 0);
}

#[test]
fn benign_errors_are_returned_but_not_counted() {
    let (client, sink) = client_with(MockBackend::default(), PoolConfig::new("benign"));

    let err = client.execute(&Command::new("GET").arg("missing")).unwrap_err();
    assert_eq!(err.backend(), Some(&MockError::Missing));
    assert_eq!(client.stats().errors(), 0);
    assert_eq!(sink.count(DiagnosticKind::OperationFailed), 0);

    let err = client.execute(&Command::new("GET").arg("poison")).unwrap_err();
    assert!(matches!(err, Error::Backend(MockError::Down(_))));
    assert_eq!(client.stats().errors(), 1);
    assert_eq!(sink.levels(DiagnosticKind::OperationFailed), [Level::ERROR]);
}

#[test]
fn statement_log_is_opt_in() {
    let (quiet, quiet_sink) = client_with(MockBackend::default(), PoolConfig::new("quiet"));
    quiet.execute(&Command::new("SET").arg("a").arg("1")).unwrap();
    assert_eq!(quiet_sink.count(DiagnosticKind::Statement), 0);

    let (chatty, sink) = client_with(
        MockBackend::default(),
        PoolConfig::new("chatty").with_log_statements(true),
    );
    chatty.execute(&Command::new("SET").arg("a").arg("1")).unwrap();
    chatty.execute(&Command::new("GET").arg("a")).unwrap();
    assert_eq!(
        sink.levels(DiagnosticKind::Statement),
        [Level::DEBUG, Level::DEBUG]
    );
    let events = sink.events.lock();
    match &events[0].1 {
        Diagnostic::Statement { target, .. } => assert_eq!(target.as_deref(), Some("SET a")),
        other => panic!("unexpected diagnostic {other:?}"),
    }
}

#[test]
fn mget_groups_by_hash_tag_and_keeps_input_order() {
    let backend = MockBackend::seeded(&[("{u1}.a", "a"), ("{u1}.b", "b"), ("{u2}.c", "c")]);
    let (client, _) = client_with(backend, PoolConfig::new("multi"));

    let values = client.mget(&["{u1}.a", "{u1}.b", "{u2}.c"]).unwrap();
    assert_eq!(
        values,
        [Some(b"a".to_vec()), Some(b"b".to_vec()), Some(b"c".to_vec())]
    );

    let calls = client.backend().calls();
    assert_eq!(calls.len(), 2);
    let u1 = calls
        .iter()
        .find(|c| c.arguments().len() == 2)
        .expect("the {u1} group");
    assert_eq!(u1.arguments(), [b"{u1}.a".to_vec(), b"{u1}.b".to_vec()]);
    assert!(calls.iter().all(|c| c.name() == "MGET"));
    assert_eq!(client.stats().query_count(), 2);
}

#[test]
fn mget_handles_missing_and_duplicate_keys() {
    let backend = MockBackend::seeded(&[("x", "1"), ("y", "2")]);
    let (client, _) = client_with(backend, PoolConfig::new("dups"));

    let values = client.mget(&["y", "nope", "x", "y"]).unwrap();
    assert_eq!(
        values,
        [
            Some(b"2".to_vec()),
            None,
            Some(b"1".to_vec()),
            Some(b"2".to_vec())
        ]
    );
    assert!(client.mget::<&str>(&[]).unwrap().is_empty());
}

#[test]
fn mget_surfaces_a_group_failure() {
    let (client, sink) = client_with(MockBackend::default(), PoolConfig::new("fail"));
    let err = client.mget(&["a", "poison", "c"]).unwrap_err();
    assert!(matches!(err, Error::Backend(MockError::Down(_))));
    assert!(sink.count(DiagnosticKind::OperationFailed) >= 1);
}

#[test]
fn mset_msetnx_and_del_across_shards() {
    let (client, _) = client_with(MockBackend::default(), PoolConfig::new("writes"));
    let pairs = [("{u1}.a", "1"), ("{u2}.b", "2"), ("{u3}.c", "3")];

    client.mset(&pairs).unwrap();
    assert_eq!(
        client.mget(&["{u3}.c", "{u1}.a"]).unwrap(),
        [Some(b"3".to_vec()), Some(b"1".to_vec())]
    );

    assert!(!client.msetnx(&[("{u1}.a", "x"), ("{u9}.z", "9")]).unwrap());
    assert!(client.msetnx(&[("{u7}.n", "7"), ("{u8}.m", "8")]).unwrap());

    assert_eq!(client.del(&["{u1}.a", "{u2}.b", "gone"]).unwrap(), 2);
    assert_eq!(client.mget(&["{u1}.a"]).unwrap(), vec![None::<Vec<u8>>]);
}

#[test]
fn unexpected_group_reply_is_reported() {
    let (client, _) = client_with(MockBackend::default(), PoolConfig::new("shape"));
    let err = client
        .scatter(&["a"], |k| k.as_bytes(), |group| {
            let reply = client.execute(&Command::new("WRONG").args(group))?;
            if reply.is_ok() {
                Ok(())
            } else {
                Err(Error::UnexpectedReply {
                    operation: "WRONG".into(),
                    reply: reply.to_string(),
                })
            }
        })
        .unwrap_err();
    assert!(matches!(err, Error::UnexpectedReply { .. }));
}

#[test]
fn multi_key_groups_respect_the_admission_gate() {
    let config = PoolConfig::new("bounded")
        .with_capacity(2)
        .with_max_parallel_shards(8);
    let (client, _) = client_with(MockBackend::holding(Duration::from_millis(10)), config);

    let keys: Vec<String> = (0..16).map(|i| format!("{{tag{i}}}.k")).collect();
    let values = client.mget(&keys).unwrap();
    assert_eq!(values.len(), 16);
    assert!(client.backend().peak.load(Ordering::SeqCst) <= 2);
}

#[test]
fn registry_reports_the_client_pool() {
    let registry = StatsRegistry::new();
    let client = GatedClient::new(MockBackend::default(), PoolConfig::new("reported"))
        .unwrap()
        .with_registry(&registry);
    client.execute(&Command::new("SET").arg("a").arg("1")).unwrap();

    let snapshot = registry.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].name, "reported");
    assert_eq!(snapshot[0].exec_count, 1);

    drop(client);
    assert!(registry.is_empty());
}

#[test]
fn invalid_config_is_rejected_at_construction() {
    assert!(
        GatedClient::new(MockBackend::default(), PoolConfig::default().with_capacity(0)).is_err()
    );
    assert!(
        GatedClient::new(
            MockBackend::default(),
            PoolConfig::default().with_max_parallel_shards(0)
        )
        .is_err()
    );
}
