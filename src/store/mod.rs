//! Store Module - read access to the key/value store
//!
//! - `client`: the `StoreClient` trait the transport implements
//! - `reader`: type probe + single representation read (`RawStoreResult`)
//! - `memory`: DashMap-backed `StoreClient` with JSON snapshot loading

mod client;
mod memory;
mod reader;

pub use client::{ClientError, ClientResult, KeyType, StoreClient};
pub use memory::{MemoryStore, StoredValue};
pub use reader::{RawStoreResult, StoreReader};
