//! Storebind - bind key/value store data to strongly-typed fields
//!
//! ```text
//! TypeDescriptor ──→ Shape            (shape: once per binding)
//!        │
//! BindingSpec ──→ BindingEvaluator::resolve
//!                     │
//!                     ├─ BindingCache (coalesced, per identity)
//!                     ├─ StoreReader::probe ──→ RawStoreResult
//!                     └─ assemble + ScalarKind::coerce ──→ Value
//! ```
//!
//! ```no_run
//! use std::sync::Arc;
//! use storebind::{BindingEvaluator, BindingSpec, MemoryStore};
//!
//! # async fn demo() -> storebind::Result<()> {
//! let store = MemoryStore::new();
//! store.set("server:port", "8080");
//!
//! let port = BindingSpec::builder("Server", "port", "server:port", "i32".parse()?)
//!     .allow_null(false)
//!     .build()?;
//!
//! let evaluator = BindingEvaluator::new(Arc::new(store));
//! let port: i32 = evaluator.resolve_as(&port).await?;
//! assert_eq!(port, 8080);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod shape;
pub mod store;
pub mod value;

pub use binding::{
    assemble, BindingCache, BindingEvaluator, BindingIdentity, BindingSpec, BindingSpecBuilder,
    CacheStats,
};
pub use config::{BindingDefaults, StorebindConfig};
pub use error::{BindError, FixSuggestion, Result};
pub use shape::{resolve_shape, Container, ContainerKind, Element, Shape, TypeDescriptor};
pub use store::{KeyType, MemoryStore, RawStoreResult, StoreClient, StoreReader};
pub use value::{FromValue, Scalar, ScalarKind, Value};
