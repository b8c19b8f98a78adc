//! Binding Cache Concurrency Tests
//!
//! | Test | Scenario | Validates |
//! |------|----------|-----------|
//! | `test_concurrent_first_resolution` | 16 tasks resolve one binding | ONE store probe |
//! | `test_concurrent_distinct_bindings` | 8 bindings × 4 tasks | one probe per binding |
//! | `test_forced_binding_always_probes` | forced binding, repeated | probe per resolution |
//! | `test_failure_is_retried_by_next_caller` | store down then up | failure not cached |
//! | `test_concurrent_callers_share_failure` | 8 tasks, store down | ONE probe, 8 errors |

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use storebind::{BindError, BindingEvaluator, BindingSpec, MemoryStore, TypeDescriptor, Value};
use tokio::sync::Barrier;
use tokio::task::JoinSet;

/// Widens the window in which concurrent first requests overlap
const PROBE_LATENCY: Duration = Duration::from_millis(20);

fn spec(field: &str, key: &str) -> BindingSpec {
    BindingSpec::builder("Host", field, key, "Vec<i64>".parse::<TypeDescriptor>().unwrap())
        .build()
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// TEST 1: Concurrent First Resolution
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_resolution() {
    let store = MemoryStore::new().with_latency(PROBE_LATENCY);
    store.zadd("ids", "1", 1.0);
    store.zadd("ids", "2", 2.0);

    let evaluator = BindingEvaluator::new(Arc::new(store.clone()));
    let spec = Arc::new(spec("ids", "ids"));
    let barrier = Arc::new(Barrier::new(16));
    let mut handles = JoinSet::new();

    for _ in 0..16 {
        let evaluator = evaluator.clone();
        let spec = Arc::clone(&spec);
        let barrier = Arc::clone(&barrier);
        handles.spawn(async move {
            barrier.wait().await;
            evaluator.resolve(&spec).await
        });
    }

    let mut results = Vec::new();
    while let Some(result) = handles.join_next().await {
        results.push(result.expect("Task should not panic").unwrap());
    }

    assert_eq!(results.len(), 16);
    assert!(results
        .iter()
        .all(|v| **v == Value::sequence([1i64, 2])));
    // Every caller shares the one resolved allocation
    assert!(results.iter().all(|v| Arc::ptr_eq(v, &results[0])));
    assert_eq!(
        store.probe_count(),
        1,
        "Store should be probed once, but was probed {} times",
        store.probe_count()
    );
}

// ═══════════════════════════════════════════════════════════════════════════
// TEST 2: Distinct Bindings Do Not Block Each Other
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_bindings() {
    let store = MemoryStore::new().with_latency(PROBE_LATENCY);
    for i in 0..8 {
        store.zadd(format!("key:{}", i), i.to_string(), 0.0);
    }

    let evaluator = BindingEvaluator::new(Arc::new(store.clone()));
    let specs: Arc<Vec<BindingSpec>> = Arc::new(
        (0..8)
            .map(|i| spec(&format!("field_{}", i), &format!("key:{}", i)))
            .collect(),
    );
    let barrier = Arc::new(Barrier::new(32));
    let mut handles = JoinSet::new();

    for task in 0..32 {
        let evaluator = evaluator.clone();
        let specs = Arc::clone(&specs);
        let barrier = Arc::clone(&barrier);
        handles.spawn(async move {
            barrier.wait().await;
            let index = task % 8;
            let value = evaluator.resolve(&specs[index]).await.unwrap();
            (index, value)
        });
    }

    let mut seen = HashSet::new();
    while let Some(result) = handles.join_next().await {
        let (index, value) = result.expect("Task should not panic");
        assert_eq!(*value, Value::sequence([index as i64]));
        seen.insert(index);
    }

    assert_eq!(seen.len(), 8);
    assert_eq!(store.probe_count(), 8);
    assert_eq!(evaluator.cache().len(), 8);
}

// ═══════════════════════════════════════════════════════════════════════════
// TEST 3: Forced Bindings Bypass the Cache
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_forced_binding_always_probes() {
    let store = MemoryStore::new();
    store.zadd("ids", "1", 1.0);

    let evaluator = BindingEvaluator::new(Arc::new(store.clone()));
    let forced = BindingSpec::builder("Host", "ids", "ids", "Vec<i64>".parse().unwrap())
        .force_update(true)
        .build()
        .unwrap();
    let cached = spec("ids", "ids");

    for round in 1..=5 {
        evaluator.resolve(&forced).await.unwrap();
        evaluator.resolve(&cached).await.unwrap();
        // forced: one probe per round, cached: one probe total
        assert_eq!(store.probe_count(), round + 1);
    }

    store.zadd("ids", "2", 2.0);
    assert_eq!(
        *evaluator.resolve(&forced).await.unwrap(),
        Value::sequence([1i64, 2])
    );
    assert_eq!(*evaluator.resolve(&cached).await.unwrap(), Value::sequence([1i64]));
}

// ═══════════════════════════════════════════════════════════════════════════
// TEST 4: Failures Are Not Shared Through the Cache
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_is_retried_by_next_caller() {
    let store = MemoryStore::new().with_latency(PROBE_LATENCY);
    store.zadd("ids", "7", 1.0);
    store.set_available(false);

    let evaluator = BindingEvaluator::new(Arc::new(store.clone()));
    let spec = spec("ids", "ids");

    let err = evaluator.resolve(&spec).await.unwrap_err();
    assert!(matches!(err, BindError::StoreUnavailable { .. }));
    assert!(!evaluator.cache().contains(spec.identity()));

    store.set_available(true);
    let value = evaluator.resolve(&spec).await.unwrap();
    assert_eq!(*value, Value::sequence([7i64]));
    assert_eq!(store.probe_count(), 2);
}

// ═══════════════════════════════════════════════════════════════════════════
// TEST 5: Concurrent Callers Share One Failure
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_share_failure() {
    let store = MemoryStore::new().with_latency(Duration::from_millis(50));
    store.zadd("ids", "7", 1.0);
    store.set_available(false);

    let evaluator = BindingEvaluator::new(Arc::new(store.clone()));
    let spec = Arc::new(spec("ids", "ids"));
    let barrier = Arc::new(Barrier::new(8));
    let mut handles = JoinSet::new();

    let started = std::time::Instant::now();
    for _ in 0..8 {
        let evaluator = evaluator.clone();
        let spec = Arc::clone(&spec);
        let barrier = Arc::clone(&barrier);
        handles.spawn(async move {
            barrier.wait().await;
            evaluator.resolve(&spec).await
        });
    }

    let mut errors = 0;
    while let Some(result) = handles.join_next().await {
        let err = result.expect("Task should not panic").unwrap_err();
        assert!(matches!(err, BindError::StoreUnavailable { .. }));
        errors += 1;
    }

    assert_eq!(errors, 8);
    assert_eq!(
        store.probe_count(),
        1,
        "Waiting callers should share the failed probe, but the store was probed {} times",
        store.probe_count()
    );
    // One round-trip, not eight serialized ones
    assert!(started.elapsed() < Duration::from_millis(300));

    store.set_available(true);
    let value = evaluator.resolve(&spec).await.unwrap();
    assert_eq!(*value, Value::sequence([7i64]));
    assert_eq!(store.probe_count(), 2);
}
