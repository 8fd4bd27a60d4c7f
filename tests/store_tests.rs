//! Tests for Store
//!
//! These tests verify:
//! - put/get/delete round trips for every value shape
//! - Argument validation before queuing
//! - Batch semantics (all attempted, first error reported, no rollback)
//! - Lifecycle: buffering before open, load failure, close, reopen
//! - Namespacing and destroy
//! - Submission-order completion and backend error propagation

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use bytes::Bytes;
use lexikv::backend::{Backend, MemoryBackend};
use lexikv::{BatchOp, Config, LexiError, Result, Store, Value};
use parking_lot::Mutex;
use proptest::prelude::*;
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn config(namespace: &str) -> Config {
    Config::builder().namespace(namespace).build()
}

fn setup_store() -> (Arc<MemoryBackend>, Store) {
    let backend = Arc::new(MemoryBackend::new());
    let store = Store::open_with(backend.clone(), config("test")).unwrap();
    (backend, store)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

/// Counts calls per operation and can be told to fail
#[derive(Default)]
struct InstrumentedBackend {
    inner: MemoryBackend,
    gets: AtomicUsize,
    puts: AtomicUsize,
    removes: AtomicUsize,
    fail_writes: AtomicBool,
    fail_scan: AtomicBool,
    log: Mutex<Vec<String>>,
}

#[derive(Debug)]
struct InjectedFailure;

impl std::fmt::Display for InjectedFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("injected failure")
    }
}

impl std::error::Error for InjectedFailure {}

impl Backend for InstrumentedBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LexiError::backend(InjectedFailure));
        }
        self.log.lock().push(format!("put {}", key));
        self.inner.put(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(LexiError::backend(InjectedFailure));
        }
        self.log.lock().push(format!("remove {}", key));
        self.inner.remove(key)
    }

    fn size(&self) -> Result<usize> {
        if self.fail_scan.load(Ordering::SeqCst) {
            return Err(LexiError::backend(InjectedFailure));
        }
        self.inner.size()
    }

    fn key_at(&self, position: usize) -> Result<Option<String>> {
        self.inner.key_at(position)
    }
}

// =============================================================================
// Round Trip Tests
// =============================================================================

#[test]
fn test_put_get_text() {
    let (_backend, store) = setup_store();

    store.put("hello", "world").unwrap();

    assert_eq!(store.get("hello", false).unwrap(), text("world"));
    assert_eq!(
        store.get("hello", true).unwrap(),
        Value::Binary(Bytes::from_static(b"world"))
    );
}

#[test]
fn test_put_get_binary() {
    let (_backend, store) = setup_store();
    let raw = vec![0u8, 1, 2, 254, 255];

    store.put(&b"bin"[..], raw.clone()).unwrap();

    let value = store.get(&b"bin"[..], true).unwrap();
    assert_eq!(value.as_bytes(), Some(raw.as_slice()));
    let value = store.get(&b"bin"[..], false).unwrap();
    assert_eq!(value.as_bytes(), Some(raw.as_slice()));
}

#[test]
fn test_put_get_number() {
    let (_backend, store) = setup_store();

    store.put("answer", 42).unwrap();
    store.put(7, 1.25).unwrap();

    assert_eq!(store.get("answer", false).unwrap(), text("42"));
    assert_eq!(store.get(7, false).unwrap(), text("1.25"));
}

#[test]
fn test_put_get_structured() {
    let (_backend, store) = setup_store();
    let value = json!({"name": "lexi", "tags": ["a", "b"], "n": 3});

    store.put("doc", value.clone()).unwrap();

    assert_eq!(store.get("doc", false).unwrap(), Value::Structured(value));
}

#[test]
fn test_structured_read_as_binary() {
    let (_backend, store) = setup_store();

    store.put("list", json!([1, 2])).unwrap();
    store.put("nested", json!([["a", null], 3.5])).unwrap();
    store.put("word", json!("plain")).unwrap();
    store.put("doc", json!({"k": true})).unwrap();

    let bytes = |key: &str| store.get(key, true).unwrap().to_bytes();
    assert_eq!(&bytes("list")[..], b"1,2");
    assert_eq!(&bytes("nested")[..], b"a,,3.5");
    assert_eq!(&bytes("word")[..], b"plain");
    assert_eq!(&bytes("doc")[..], br#"{"k":true}"#);
    assert!(store.get("list", true).unwrap().as_bytes().is_some());
}

#[test]
fn test_number_keys_use_script_text() {
    let (backend, store) = setup_store();

    store.put(1e21, "big").unwrap();
    store.put(-0.0, "zero").unwrap();

    assert_eq!(backend.get("test!S1e+21").unwrap(), Some("Sbig".to_string()));
    assert_eq!(store.get(0, false).unwrap(), text("zero"));
}

#[test]
fn test_put_overwrite() {
    let (_backend, store) = setup_store();

    store.put("key", "value1").unwrap();
    store.put("key", "value2").unwrap();

    assert_eq!(store.get("key", false).unwrap(), text("value2"));
    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_get_missing_is_not_found() {
    let (_backend, store) = setup_store();
    assert!(matches!(store.get("missing", false), Err(LexiError::NotFound)));
}

#[test]
fn test_delete_then_get_is_not_found() {
    let (_backend, store) = setup_store();

    store.put("key", "value").unwrap();
    store.delete("key").unwrap();

    let err = store.get("key", false).unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn test_delete_missing_is_noop() {
    let (backend, store) = setup_store();
    store.put("present", "1").unwrap();

    store.delete("absent").unwrap();

    assert_eq!(store.len().unwrap(), 1);
    assert_eq!(backend.len(), 1);
}

#[test]
fn test_physical_layout_is_namespaced() {
    let (backend, store) = setup_store();

    store.put("k", "v").unwrap();

    assert_eq!(backend.get("test!Sk").unwrap(), Some("Sv".to_string()));
    assert_eq!(store.encoded_keys().unwrap(), ["Sk"]);
}

// =============================================================================
// Validation Tests
// =============================================================================

#[test]
fn test_empty_key_rejected() {
    let (_backend, store) = setup_store();
    assert!(matches!(store.put("", "v"), Err(LexiError::InvalidArgument(_))));
    assert!(matches!(store.get("", false), Err(LexiError::InvalidArgument(_))));
    assert!(matches!(store.delete(""), Err(LexiError::InvalidArgument(_))));
}

#[test]
fn test_empty_buffer_value_rejected() {
    let (_backend, store) = setup_store();
    let err = store.put("k", Vec::<u8>::new()).unwrap_err();
    match err {
        LexiError::InvalidArgument(msg) => assert!(msg.contains("empty buffer")),
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
}

#[test]
fn test_empty_text_value_rejected() {
    let (_backend, store) = setup_store();
    assert!(matches!(store.put("k", ""), Err(LexiError::InvalidArgument(_))));
}

#[test]
fn test_empty_buffer_key_rejected() {
    let (_backend, store) = setup_store();
    assert!(matches!(
        store.put(Vec::<u8>::new(), "v"),
        Err(LexiError::InvalidArgument(_))
    ));
}

#[test]
fn test_null_key_rejected_but_null_value_allowed() {
    let (_backend, store) = setup_store();
    assert!(matches!(
        store.put(json!(null), "v"),
        Err(LexiError::InvalidArgument(_))
    ));

    store.put("k", json!(null)).unwrap();
    assert_eq!(store.get("k", false).unwrap(), Value::Structured(json!(null)));
}

#[test]
fn test_structured_rendering_empty_rejected() {
    let (_backend, store) = setup_store();
    assert!(store.put("k", json!([])).is_err());
    assert!(store.put("k", json!("")).is_err());
}

#[test]
fn test_validation_does_not_consume_queue_slot() {
    let (_backend, store) = setup_store();
    // The counter bumps just after each result is sent
    thread::sleep(std::time::Duration::from_millis(20));
    let before = store.completed_operations();

    assert!(store.put("", "v").is_err());
    assert!(store.put("k", "").is_err());

    // Nothing ran, so a queued read is the only new completion
    store.len().unwrap();
    thread::sleep(std::time::Duration::from_millis(20));
    assert_eq!(store.completed_operations(), before + 1);
}

// =============================================================================
// Batch Tests
// =============================================================================

#[test]
fn test_batch_put_and_delete_missing() {
    let (_backend, store) = setup_store();

    store
        .batch(vec![BatchOp::put("x", "1"), BatchOp::delete("y")])
        .unwrap();

    assert_eq!(store.get("x", false).unwrap(), text("1"));
}

#[test]
fn test_empty_batch() {
    let (_backend, store) = setup_store();
    store.batch(Vec::new()).unwrap();
}

#[test]
fn test_batch_reports_first_error_without_rollback() {
    let (_backend, store) = setup_store();

    let result = store.batch(vec![
        BatchOp::put("a", "1"),
        BatchOp::put("", "bad key"),
        BatchOp::put("b", Vec::<u8>::new()),
        BatchOp::put("c", "3"),
    ]);

    match result {
        Err(LexiError::InvalidArgument(msg)) => assert!(msg.contains("key")),
        other => panic!("expected InvalidArgument, got {:?}", other),
    }
    assert_eq!(store.get("a", false).unwrap(), text("1"));
    assert_eq!(store.get("c", false).unwrap(), text("3"));
    assert!(store.get("b", false).unwrap_err().is_not_found());
}

#[test]
fn test_batch_backend_failure_is_reported() {
    let backend = Arc::new(InstrumentedBackend::default());
    let store = Store::open_with(backend.clone(), config("t")).unwrap();
    store.put("keep", "1").unwrap();

    backend.fail_writes.store(true, Ordering::SeqCst);
    let result = store.batch(vec![BatchOp::put("a", "1"), BatchOp::delete("keep")]);
    backend.fail_writes.store(false, Ordering::SeqCst);

    assert!(matches!(result, Err(LexiError::Backend(_))));
    assert_eq!(store.get("keep", false).unwrap(), text("1"));
    assert_eq!(store.encoded_keys().unwrap(), ["Skeep"]);
}

// =============================================================================
// Lifecycle Tests
// =============================================================================

#[test]
fn test_operations_before_open_are_buffered() {
    let backend = Arc::new(MemoryBackend::new());
    backend.put("t!Sold", "Sstale").unwrap();
    let store = Store::new(backend.clone(), config("t")).unwrap();

    let put = store.submit_put("new", "fresh").unwrap();
    let get = store.submit_get("old", false).unwrap();
    assert!(put.try_wait().is_none());

    store.open().unwrap();

    put.wait().unwrap();
    assert_eq!(get.wait().unwrap(), text("stale"));
    assert_eq!(store.encoded_keys().unwrap(), ["Snew", "Sold"]);
}

#[test]
fn test_open_loads_existing_records() {
    let backend = Arc::new(MemoryBackend::new());
    {
        let store = Store::open_with(backend.clone(), config("t")).unwrap();
        store.put("b", "2").unwrap();
        store.put("a", "1").unwrap();
        store.close().unwrap();
    }

    let store = Store::open_with(backend, config("t")).unwrap();
    assert_eq!(store.encoded_keys().unwrap(), ["Sa", "Sb"]);
    assert!(store.is_open());
}

#[test]
fn test_open_twice_is_noop() {
    let (_backend, store) = setup_store();
    store.put("k", "v").unwrap();

    store.open().unwrap();

    assert_eq!(store.len().unwrap(), 1);
}

#[test]
fn test_failed_load_surfaces_to_waiting_operations() {
    let backend = Arc::new(InstrumentedBackend::default());
    backend.fail_scan.store(true, Ordering::SeqCst);
    let store = Store::new(backend, config("t")).unwrap();

    let early = store.submit_put("k", "v").unwrap();
    assert!(matches!(store.open(), Err(LexiError::Backend(_))));

    match early.wait() {
        Err(LexiError::NotOpen(reason)) => assert!(reason.contains("injected failure")),
        other => panic!("expected NotOpen, got {:?}", other),
    }
    assert!(!store.is_open());
}

#[test]
fn test_close_then_operations_fail() {
    let (_backend, store) = setup_store();
    store.put("k", "v").unwrap();

    store.close().unwrap();

    assert!(!store.is_open());
    assert!(matches!(store.get("k", false), Err(LexiError::Closed)));
    assert!(matches!(store.put("k", "v"), Err(LexiError::Closed)));
    store.close().unwrap();
}

#[test]
fn test_close_unopened_store() {
    let backend = Arc::new(MemoryBackend::new());
    let store = Store::new(backend, config("t")).unwrap();
    let pending = store.submit_put("k", "v").unwrap();

    store.close().unwrap();

    assert!(matches!(pending.wait(), Err(LexiError::Closed)));
}

#[test]
fn test_invalid_config_rejected() {
    let backend = Arc::new(MemoryBackend::new());
    assert!(matches!(
        Store::new(backend, config("bad!name")),
        Err(LexiError::Config(_))
    ));
}

// =============================================================================
// Namespace Tests
// =============================================================================

#[test]
fn test_namespaces_are_isolated() {
    let backend = Arc::new(MemoryBackend::new());
    let one = Store::open_with(backend.clone(), config("one")).unwrap();
    let two = Store::open_with(backend.clone(), config("two")).unwrap();

    one.put("k", "from one").unwrap();
    two.put("k", "from two").unwrap();

    assert_eq!(one.get("k", false).unwrap(), text("from one"));
    assert_eq!(two.get("k", false).unwrap(), text("from two"));
    assert_eq!(one.len().unwrap(), 1);
    assert_eq!(backend.len(), 2);
}

#[test]
fn test_destroy_removes_only_namespace() {
    let backend = Arc::new(MemoryBackend::new());
    {
        let doomed = Store::open_with(backend.clone(), config("doomed")).unwrap();
        let kept = Store::open_with(backend.clone(), config("kept")).unwrap();
        for i in 0..10 {
            doomed.put(format!("k{}", i), "v").unwrap();
        }
        kept.put("k", "v").unwrap();
    }

    let removed = Store::destroy(backend.as_ref(), "doomed").unwrap();

    assert_eq!(removed, 10);
    assert_eq!(backend.len(), 1);
    let reopened = Store::open_with(backend.clone(), config("doomed")).unwrap();
    assert_eq!(reopened.len().unwrap(), 0);
}

// =============================================================================
// Ordering and Backend Interaction Tests
// =============================================================================

#[test]
fn test_deferred_operations_complete_in_submission_order() {
    let backend = Arc::new(InstrumentedBackend::default());
    let store = Store::open_with(backend.clone(), config("t")).unwrap();

    let pending: Vec<_> = (0..50)
        .map(|i| {
            if i % 5 == 4 {
                store.submit_delete(format!("k{:02}", i - 1)).unwrap()
            } else {
                store.submit_put(format!("k{:02}", i), "v").unwrap()
            }
        })
        .collect();
    for p in pending {
        p.wait().unwrap();
    }

    let expected: Vec<String> = (0..50)
        .map(|i| {
            if i % 5 == 4 {
                format!("remove t!Sk{:02}", i - 1)
            } else {
                format!("put t!Sk{:02}", i)
            }
        })
        .collect();
    assert_eq!(*backend.log.lock(), expected);
}

#[test]
fn test_each_operation_issues_one_backend_call() {
    let backend = Arc::new(InstrumentedBackend::default());
    let store = Store::open_with(backend.clone(), config("t")).unwrap();

    store.put("k", "v").unwrap();
    store.get("k", false).unwrap();
    store.delete("k").unwrap();
    store.delete("k").unwrap();

    assert_eq!(backend.puts.load(Ordering::SeqCst), 1);
    assert_eq!(backend.gets.load(Ordering::SeqCst), 1);
    assert_eq!(backend.removes.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failed_put_leaves_index_unchanged() {
    let backend = Arc::new(InstrumentedBackend::default());
    let store = Store::open_with(backend.clone(), config("t")).unwrap();

    backend.fail_writes.store(true, Ordering::SeqCst);
    let err = store.put("k", "v").unwrap_err();

    assert!(matches!(err, LexiError::Backend(_)));
    assert!(err.to_string().contains("injected failure"));
    assert_eq!(store.len().unwrap(), 0);
}

#[test]
fn test_concurrent_writers() {
    let backend = Arc::new(MemoryBackend::new());
    let store = Arc::new(Store::open_with(backend, config("t")).unwrap());

    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for i in 0..25 {
                    store.put(format!("t{}-{:02}", t, i), "v").unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    let keys = store.encoded_keys().unwrap();
    assert_eq!(keys.len(), 100);
    assert!(keys.windows(2).all(|w| w[0] < w[1]));
}

// =============================================================================
// Invariant Properties
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Put(String),
    Delete(String),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-d]{1,2}".prop_map(Op::Put),
        "[a-d]{1,2}".prop_map(Op::Delete),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_index_matches_backend_after_every_op(ops in proptest::collection::vec(op_strategy(), 1..40)) {
        let (backend, store) = setup_store();

        for op in ops {
            match op {
                Op::Put(k) => store.put(k, "v").unwrap(),
                Op::Delete(k) => store.delete(k).unwrap(),
            }

            let keys = store.encoded_keys().unwrap();
            prop_assert!(keys.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(keys.len(), backend.len());
            for key in &keys {
                let physical = format!("test!{}", key);
                prop_assert!(backend.get(&physical).unwrap().is_some());
            }
        }
    }
}
