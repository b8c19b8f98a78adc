//! Store client abstraction
//!
//! The network client (pooling, pipelining, reconnects) lives outside this
//! crate. It only needs to answer these primitive reads.

use async_trait::async_trait;

/// Error type returned by client implementations
pub type ClientError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by client implementations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Store-side type of a key, as reported by a type probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyType {
    /// Key does not exist
    None,
    /// Plain string value
    String,
    Hash,
    /// Unordered collection of unique members
    Set,
    /// Score-ordered collection of unique members
    ZSet,
    /// Any type this crate does not read (lists, streams, ...)
    Other(String),
}

/// Read-only access to a key/value-and-collections store
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    async fn key_type(&self, key: &str) -> ClientResult<KeyType>;

    async fn get(&self, key: &str) -> ClientResult<Option<String>>;

    /// Hash fields in store order
    async fn hgetall(&self, key: &str) -> ClientResult<Vec<(String, String)>>;

    async fn smembers(&self, key: &str) -> ClientResult<Vec<String>>;

    /// All members with scores (order is normalised by the reader)
    async fn zrange_with_scores(&self, key: &str) -> ClientResult<Vec<(String, f64)>>;
}
