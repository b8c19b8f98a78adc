//! Store Reader - one type probe, one representation read
//!
//! Client failures surface as `StoreUnavailable`; nothing here retries.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, instrument};

use super::client::{KeyType, StoreClient};
use crate::error::{BindError, Result};

/// Raw data found at a key
#[derive(Debug, Clone, PartialEq)]
pub enum RawStoreResult {
    Absent,
    Plain(String),
    /// Hash fields in store order
    Hash(IndexMap<String, String>),
    UnorderedCollection(Vec<String>),
    /// Members in ascending score order
    OrderedCollection(Vec<String>),
}

impl RawStoreResult {
    pub fn is_absent(&self) -> bool {
        matches!(self, RawStoreResult::Absent)
    }

    /// Representation name for error messages
    pub fn representation(&self) -> &'static str {
        match self {
            RawStoreResult::Absent => "nothing",
            RawStoreResult::Plain(_) => "a plain value",
            RawStoreResult::Hash(_) => "a hash",
            RawStoreResult::UnorderedCollection(_) => "an unordered collection",
            RawStoreResult::OrderedCollection(_) => "an ordered collection",
        }
    }
}

/// Reads keys through a shared client handle
#[derive(Clone)]
pub struct StoreReader {
    client: Arc<dyn StoreClient>,
}

impl StoreReader {
    pub fn new(client: Arc<dyn StoreClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn StoreClient> {
        &self.client
    }

    /// Probe the key's type, then read it in its one representation
    #[instrument(skip(self), fields(store = %self.client.name()))]
    pub async fn probe(&self, key: &str) -> Result<RawStoreResult> {
        let key_type = self
            .client
            .key_type(key)
            .await
            .map_err(|e| BindError::store(key, e))?;

        let raw = match key_type {
            KeyType::None => RawStoreResult::Absent,
            // A plain key deleted between probe and read is absent
            KeyType::String => {
                let text = self
                    .client
                    .get(key)
                    .await
                    .map_err(|e| BindError::store(key, e))?;
                text.map_or(RawStoreResult::Absent, RawStoreResult::Plain)
            }
            KeyType::Hash => {
                let fields = self
                    .client
                    .hgetall(key)
                    .await
                    .map_err(|e| BindError::store(key, e))?;
                RawStoreResult::Hash(fields.into_iter().collect())
            }
            KeyType::Set => RawStoreResult::UnorderedCollection(
                self.client
                    .smembers(key)
                    .await
                    .map_err(|e| BindError::store(key, e))?,
            ),
            KeyType::ZSet => {
                let mut scored = self
                    .client
                    .zrange_with_scores(key)
                    .await
                    .map_err(|e| BindError::store(key, e))?;
                // Ascending score, ties by member: the store's own range order
                scored.sort_by(|(a_member, a_score), (b_member, b_score)| {
                    a_score.total_cmp(b_score).then_with(|| a_member.cmp(b_member))
                });
                RawStoreResult::OrderedCollection(
                    scored.into_iter().map(|(member, _)| member).collect(),
                )
            }
            KeyType::Other(type_name) => {
                return Err(BindError::ShapeMismatch {
                    key: key.to_string(),
                    shape: "any supported shape".to_string(),
                    representation: format!("a '{}' value", type_name),
                })
            }
        };

        debug!(representation = raw.representation(), "probed key");
        Ok(raw)
    }
}
