//! Binding Evaluator - the single `resolve` entry point
//!
//! ```text
//! resolve(spec)
//!   ├─ cached (force_update = false) ──────────────→ value
//!   └─ StoreReader::probe(key)
//!        ├─ Absent  → default │ Absent (allow_null) │ zero value
//!        └─ present → assemble(shape, raw) ─→ cache ─→ value
//! ```
//!
//! Errors propagate without touching the cache.

use std::sync::Arc;

use futures::future::try_join_all;
use tracing::{debug, instrument, warn};

use super::assemble::assemble;
use super::cache::BindingCache;
use super::spec::BindingSpec;
use crate::error::Result;
use crate::store::{StoreClient, StoreReader};
use crate::value::{FromValue, Value};

/// Resolves bindings against one store, memoizing per binding identity
#[derive(Clone)]
pub struct BindingEvaluator {
    reader: StoreReader,
    cache: BindingCache,
}

impl BindingEvaluator {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self::with_cache(client, BindingCache::new())
    }

    /// Share an existing cache (e.g. across evaluators on the same store)
    pub fn with_cache(client: Arc<dyn StoreClient>, cache: BindingCache) -> Self {
        Self {
            reader: StoreReader::new(client),
            cache,
        }
    }

    pub fn cache(&self) -> &BindingCache {
        &self.cache
    }

    pub fn reader(&self) -> &StoreReader {
        &self.reader
    }

    /// Resolve a binding to its value (or explicit absence)
    #[instrument(
        skip(self, spec),
        fields(binding = %spec.name(), key = %spec.key(), shape = %spec.shape())
    )]
    pub async fn resolve(&self, spec: &BindingSpec) -> Result<Arc<Value>> {
        if spec.force_update() {
            debug!("forced refresh");
            let value = self.resolve_uncached(spec).await?;
            return Ok(self.cache.store(spec.identity(), value));
        }

        self.cache
            .get_or_resolve(spec.identity(), || self.resolve_uncached(spec))
            .await
    }

    /// Resolve and convert into a host type
    pub async fn resolve_as<T: FromValue>(&self, spec: &BindingSpec) -> Result<T> {
        let value = self.resolve(spec).await?;
        T::from_value(&value)
    }

    /// Resolve independent bindings concurrently (first error wins)
    pub async fn resolve_all(&self, specs: &[BindingSpec]) -> Result<Vec<Arc<Value>>> {
        try_join_all(specs.iter().map(|spec| self.resolve(spec))).await
    }

    async fn resolve_uncached(&self, spec: &BindingSpec) -> Result<Value> {
        let raw = self.reader.probe(spec.key()).await?;

        if raw.is_absent() {
            let value = absent_value(spec);
            debug!(value = %value.describe(), "key absent");
            return Ok(value);
        }

        assemble(spec.key(), spec.shape(), &raw).map_err(|e| {
            if e.is_conversion() {
                warn!(error = %e, "stored value does not fit binding");
            }
            e
        })
    }
}

/// Absence policy: default, then null, then the shape's zero value
fn absent_value(spec: &BindingSpec) -> Value {
    match spec.default() {
        Some(default) => default.clone(),
        None if spec.allow_null() => Value::Absent,
        None => spec.shape().zero_value(),
    }
}
