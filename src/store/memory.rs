//! In-process store backend with DashMap
//!
//! Implements `StoreClient` without a network. Used for embedding, the CLI
//! (loaded from a JSON snapshot) and tests, which can inject latency and
//! outages and count type probes.

use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use indexmap::{IndexMap, IndexSet};
use serde::Deserialize;

use super::client::{ClientResult, KeyType, StoreClient};
use crate::error::Result;

/// Data held at one key
#[derive(Debug, Clone, PartialEq)]
pub enum StoredValue {
    Plain(String),
    Hash(IndexMap<String, String>),
    Set(IndexSet<String>),
    /// Member → score, in insertion order
    SortedSet(IndexMap<String, f64>),
}

/// One key in a JSON snapshot
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SnapshotEntry {
    Plain(String),
    Hash { hash: IndexMap<String, String> },
    Set { set: Vec<String> },
    SortedSet { zset: Vec<(String, f64)> },
}

impl From<SnapshotEntry> for StoredValue {
    fn from(entry: SnapshotEntry) -> Self {
        match entry {
            SnapshotEntry::Plain(text) => StoredValue::Plain(text),
            SnapshotEntry::Hash { hash } => StoredValue::Hash(hash),
            SnapshotEntry::Set { set } => StoredValue::Set(set.into_iter().collect()),
            SnapshotEntry::SortedSet { zset } => StoredValue::SortedSet(zset.into_iter().collect()),
        }
    }
}

/// Thread-safe in-memory store (cheap to clone, clones share data)
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, StoredValue>>,
    /// Simulated outage when false
    offline: Arc<AtomicBool>,
    /// Number of type probes served
    probes: Arc<AtomicUsize>,
    /// Delay applied to each type probe
    latency: Option<Duration>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every type probe (widens race windows in tests)
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Build a store from snapshot JSON
    ///
    /// `{"k": "text" | {"hash": {..}} | {"set": [..]} | {"zset": [[member, score], ..]}}`
    pub fn from_snapshot(json: &str) -> Result<Self> {
        let snapshot: IndexMap<String, SnapshotEntry> = serde_json::from_str(json)?;
        let store = Self::new();
        for (key, entry) in snapshot {
            store.entries.insert(key, entry.into());
        }
        Ok(store)
    }

    /// Load a snapshot file
    pub fn load_snapshot(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_snapshot(&content)
    }

    /// Set a plain value (replaces any existing value)
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), StoredValue::Plain(value.into()));
    }

    /// Set a hash field; a non-hash key is replaced by a new hash
    pub fn hset(&self, key: impl Into<String>, field: impl Into<String>, value: impl Into<String>) {
        let mut entry = self
            .entries
            .entry(key.into())
            .or_insert_with(|| StoredValue::Hash(IndexMap::new()));
        if !matches!(*entry, StoredValue::Hash(_)) {
            *entry = StoredValue::Hash(IndexMap::new());
        }
        if let StoredValue::Hash(fields) = &mut *entry {
            fields.insert(field.into(), value.into());
        }
    }

    /// Add a set member; a non-set key is replaced by a new set
    pub fn sadd(&self, key: impl Into<String>, member: impl Into<String>) {
        let member: String = member.into();
        self.sadd_all(key, [member]);
    }

    /// Add many set members (creates the key even when `members` is empty)
    pub fn sadd_all<I, S>(&self, key: impl Into<String>, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut entry = self
            .entries
            .entry(key.into())
            .or_insert_with(|| StoredValue::Set(IndexSet::new()));
        if !matches!(*entry, StoredValue::Set(_)) {
            *entry = StoredValue::Set(IndexSet::new());
        }
        if let StoredValue::Set(set) = &mut *entry {
            set.extend(members.into_iter().map(Into::into));
        }
    }

    /// Add or re-score a sorted-set member; a non-sorted-set key is replaced
    pub fn zadd(&self, key: impl Into<String>, member: impl Into<String>, score: f64) {
        let mut entry = self
            .entries
            .entry(key.into())
            .or_insert_with(|| StoredValue::SortedSet(IndexMap::new()));
        if !matches!(*entry, StoredValue::SortedSet(_)) {
            *entry = StoredValue::SortedSet(IndexMap::new());
        }
        if let StoredValue::SortedSet(members) = &mut *entry {
            members.insert(member.into(), score);
        }
    }

    /// Remove a key, returning whether it existed
    pub fn del(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw stored value (for assertions)
    pub fn get_stored(&self, key: &str) -> Option<StoredValue> {
        self.entries.get(key).map(|v| v.clone())
    }

    /// Toggle a simulated outage: every read fails while unavailable
    pub fn set_available(&self, available: bool) {
        self.offline.store(!available, Ordering::SeqCst);
    }

    /// Number of type probes served so far
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> ClientResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err("memory store is offline".into());
        }
        Ok(())
    }

    /// Read the stored value, requiring a given variant
    fn read<T>(
        &self,
        key: &str,
        extract: impl FnOnce(&StoredValue) -> Option<T>,
    ) -> ClientResult<Option<T>> {
        self.check_available()?;
        match self.entries.get(key) {
            None => Ok(None),
            Some(value) => extract(value.value())
                .map(Some)
                .ok_or_else(|| format!("WRONGTYPE key '{}' holds another type", key).into()),
        }
    }
}

#[async_trait]
impl StoreClient for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn key_type(&self, key: &str) -> ClientResult<KeyType> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.check_available()?;
        Ok(match self.entries.get(key).as_deref() {
            None => KeyType::None,
            Some(StoredValue::Plain(_)) => KeyType::String,
            Some(StoredValue::Hash(_)) => KeyType::Hash,
            Some(StoredValue::Set(_)) => KeyType::Set,
            Some(StoredValue::SortedSet(_)) => KeyType::ZSet,
        })
    }

    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        self.read(key, |v| match v {
            StoredValue::Plain(text) => Some(text.clone()),
            _ => None,
        })
    }

    async fn hgetall(&self, key: &str) -> ClientResult<Vec<(String, String)>> {
        let fields = self.read(key, |v| match v {
            StoredValue::Hash(fields) => {
                Some(fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            }
            _ => None,
        })?;
        Ok(fields.unwrap_or_default())
    }

    async fn smembers(&self, key: &str) -> ClientResult<Vec<String>> {
        let members = self.read(key, |v| match v {
            StoredValue::Set(set) => Some(set.iter().cloned().collect()),
            _ => None,
        })?;
        Ok(members.unwrap_or_default())
    }

    async fn zrange_with_scores(&self, key: &str) -> ClientResult<Vec<(String, f64)>> {
        let members = self.read(key, |v| match v {
            StoredValue::SortedSet(members) => {
                Some(members.iter().map(|(m, s)| (m.clone(), *s)).collect())
            }
            _ => None,
        })?;
        Ok(members.unwrap_or_default())
    }
}
