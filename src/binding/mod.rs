//! Binding Module - store keys bound to typed fields
//!
//! - `spec`: registration (`BindingSpec`, `BindingIdentity`, validation)
//! - `assemble`: raw store data → shaped `Value`
//! - `cache`: per-identity memo with request coalescing
//! - `evaluate`: `BindingEvaluator::resolve`, absence and default policy
//!
//! Data flow:
//! ```text
//! BindingSpec::builder(..).build()     (shape resolved, options checked)
//!                 ↓
//!     BindingEvaluator::resolve(&spec)
//!                 ↓
//!   BindingCache ── hit ──→ Arc<Value>
//!        │ miss
//!        ↓
//!   StoreReader::probe → assemble → absence policy
//!                 ↓
//!      cached Arc<Value> → FromValue → host field
//! ```

mod assemble;
mod cache;
mod evaluate;
mod spec;

pub use assemble::assemble;
pub use cache::{BindingCache, CacheStats};
pub use evaluate::BindingEvaluator;
pub use spec::{BindingIdentity, BindingSpec, BindingSpecBuilder};
