//! Binding Cache - resolved values per binding identity
//!
//! Each identity owns an `Arc<OnceCell>` holding its resolved value. The first
//! request for an unresolved identity leads the resolution and registers an
//! in-flight slot (a `watch` channel). Concurrent requests follow that slot and
//! receive the leader's outcome, success or failure. A failure clears the slot
//! without touching the cell, so the next request resolves again.

use std::future::Future;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::{watch, OnceCell};
use tracing::trace;

use super::spec::BindingIdentity;
use crate::error::Result;
use crate::value::Value;

type Cell = Arc<OnceCell<Arc<Value>>>;
type Outcome = Result<Arc<Value>>;
type Flight = watch::Receiver<Option<Outcome>>;

/// Cache occupancy snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Identities with a cell (resolved or in flight)
    pub entries: usize,
    /// Identities holding a resolved value
    pub resolved: usize,
}

/// Concurrent memo of resolved binding values (cheap to clone, clones share entries)
#[derive(Clone, Default)]
pub struct BindingCache {
    cells: Arc<DashMap<BindingIdentity, Cell>>,
    in_flight: Arc<DashMap<BindingIdentity, Flight>>,
}

enum Claim {
    Ready(Arc<Value>),
    Follow(Flight),
    Lead(Cell, watch::Sender<Option<Outcome>>),
}

/// Leader's hold on an in-flight slot; dropping it unfinished (cancellation)
/// frees the slot and wakes followers so one of them takes over.
struct InFlight<'a> {
    slots: &'a DashMap<BindingIdentity, Flight>,
    identity: BindingIdentity,
    tx: watch::Sender<Option<Outcome>>,
    finished: bool,
}

impl InFlight<'_> {
    fn finish(mut self, outcome: &Outcome) {
        self.slots.remove(&self.identity);
        self.tx.send_replace(Some(outcome.clone()));
        self.finished = true;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.slots.remove(&self.identity);
        }
    }
}

impl BindingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved value for `identity`, if any
    pub fn get(&self, identity: BindingIdentity) -> Option<Arc<Value>> {
        self.cells
            .get(&identity)
            .and_then(|cell| cell.get().map(Arc::clone))
    }

    /// Return the cached value or run `resolve` once for all concurrent callers
    ///
    /// Callers arriving while a resolution is in flight share its outcome,
    /// including its error.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        identity: BindingIdentity,
        resolve: F,
    ) -> Result<Arc<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value>>,
    {
        let (cell, tx) = loop {
            match self.claim(identity) {
                Claim::Ready(value) => {
                    trace!(%identity, "cache hit");
                    return Ok(value);
                }
                Claim::Follow(mut flight) => {
                    trace!(%identity, "joining in-flight resolution");
                    // Err means the leader was dropped mid-flight: claim again
                    let outcome = flight
                        .wait_for(Option::is_some)
                        .await
                        .ok()
                        .and_then(|outcome| outcome.clone());
                    if let Some(outcome) = outcome {
                        return outcome;
                    }
                }
                Claim::Lead(cell, tx) => break (cell, tx),
            }
        };

        let flight = InFlight {
            slots: &self.in_flight,
            identity,
            tx,
            finished: false,
        };
        let outcome = resolve().await.map(|value| {
            let value = Arc::new(value);
            // Only the leader fills the cell
            let _ = cell.set(Arc::clone(&value));
            value
        });
        flight.finish(&outcome);
        outcome
    }

    fn claim(&self, identity: BindingIdentity) -> Claim {
        // Clone the cell out so no map guard is held across an await
        let cell: Cell = self
            .cells
            .entry(identity)
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();
        if let Some(value) = cell.get() {
            return Claim::Ready(Arc::clone(value));
        }

        match self.in_flight.entry(identity) {
            Entry::Occupied(slot) => Claim::Follow(slot.get().clone()),
            Entry::Vacant(slot) => {
                // A leader fills the cell before freeing its slot
                if let Some(value) = cell.get() {
                    return Claim::Ready(Arc::clone(value));
                }
                let (tx, rx) = watch::channel(None);
                slot.insert(rx);
                Claim::Lead(cell, tx)
            }
        }
    }

    /// Replace the entry for `identity` with a resolved value
    pub fn store(&self, identity: BindingIdentity, value: Value) -> Arc<Value> {
        let value = Arc::new(value);
        let cell = OnceCell::new_with(Some(Arc::clone(&value)));
        self.cells.insert(identity, Arc::new(cell));
        trace!(%identity, "cache entry replaced");
        value
    }

    pub fn contains(&self, identity: BindingIdentity) -> bool {
        self.get(identity).is_some()
    }

    /// Drop the entry for `identity`, returning whether it held a value
    pub fn invalidate(&self, identity: BindingIdentity) -> bool {
        self.cells
            .remove(&identity)
            .is_some_and(|(_, cell)| cell.initialized())
    }

    pub fn clear(&self) {
        self.cells.clear();
    }

    /// Number of resolved entries
    pub fn len(&self) -> usize {
        self.cells.iter().filter(|cell| cell.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.cells.len(),
            resolved: self.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::BindingSpec;
    use crate::error::BindError;
    use crate::shape::TypeDescriptor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::Barrier;

    fn identity(field: &str) -> BindingIdentity {
        BindingSpec::builder("T", field, "k", TypeDescriptor::named("String"))
            .allow_null(false)
            .build()
            .unwrap()
            .identity()
    }

    #[tokio::test]
    async fn resolves_once_then_hits() {
        let cache = BindingCache::new();
        let calls = AtomicUsize::new(0);
        let id = identity("a");

        for _ in 0..3 {
            let value = cache
                .get_or_resolve(id, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(Value::from("v"))
                })
                .await
                .unwrap();
            assert_eq!(*value, Value::from("v"));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.contains(id));
    }

    #[tokio::test]
    async fn failure_is_not_cached() {
        let cache = BindingCache::new();
        let id = identity("a");

        let err = cache
            .get_or_resolve(id, || async {
                Err(BindError::store("k", "connection refused"))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, BindError::StoreUnavailable { .. }));
        assert!(!cache.contains(id));
        assert_eq!(cache.stats(), CacheStats { entries: 1, resolved: 0 });

        let value = cache
            .get_or_resolve(id, || async { Ok(Value::from("ok")) })
            .await
            .unwrap();
        assert_eq!(*value, Value::from("ok"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_share_one_failure() {
        let cache = BindingCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let id = identity("a");
        let mut handles = tokio::task::JoinSet::new();

        for _ in 0..8 {
            let (cache, calls, barrier) = (cache.clone(), calls.clone(), barrier.clone());
            handles.spawn(async move {
                barrier.wait().await;
                cache
                    .get_or_resolve(id, || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(50)).await;
                        Err::<Value, _>(BindError::store("k", "connection refused"))
                    })
                    .await
            });
        }

        while let Some(result) = handles.join_next().await {
            let err = result.unwrap().unwrap_err();
            assert!(matches!(err, BindError::StoreUnavailable { .. }));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!cache.contains(id));
        assert!(cache.in_flight.is_empty());
    }

    #[tokio::test]
    async fn cancelled_leader_frees_the_slot() {
        let cache = BindingCache::new();
        let id = identity("a");

        let pending = cache.get_or_resolve(id, || std::future::pending::<Result<Value>>());
        let timed_out = tokio::time::timeout(Duration::from_millis(10), pending).await;
        assert!(timed_out.is_err());
        assert!(cache.in_flight.is_empty());

        let value = cache
            .get_or_resolve(id, || async { Ok(Value::from("v")) })
            .await
            .unwrap();
        assert_eq!(*value, Value::from("v"));
    }

    #[tokio::test]
    async fn store_replaces_entry() {
        let cache = BindingCache::new();
        let id = identity("a");
        cache
            .get_or_resolve(id, || async { Ok(Value::from("old")) })
            .await
            .unwrap();

        cache.store(id, Value::from("new"));
        assert_eq!(cache.get(id).as_deref(), Some(&Value::from("new")));
    }

    #[test]
    fn invalidate_and_clear() {
        let cache = BindingCache::new();
        let (a, b) = (identity("a"), identity("b"));
        cache.store(a, Value::Absent);
        cache.store(b, Value::from("b"));
        assert_eq!(cache.len(), 2);

        assert!(cache.invalidate(a));
        assert!(!cache.invalidate(a));
        assert_eq!(cache.get(a), None);

        cache.clear();
        assert!(cache.is_empty());
    }
}
