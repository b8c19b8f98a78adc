//! Value Module - converted binding values
//!
//! - `scalar`: scalar kinds and the text coercer
//! - `convert`: `FromValue`, conversion into host Rust types
//! - `json`: JSON bridge (CLI output, declared defaults)
//!
//! `Value::Absent` is the explicit "nothing at this key" marker. It is never
//! confused with an empty string, zero or an empty container.
//!
//! Sets and maps keep insertion order (store order survives assembly) and hash
//! with FxHash. Equality on sets/maps ignores order.

mod convert;
mod json;
mod scalar;

use std::hash::{BuildHasher, Hash, Hasher};

use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxBuildHasher;

pub use convert::FromValue;
pub use scalar::{Scalar, ScalarKind};

/// Insertion-ordered set of values
pub type ValueSet = IndexSet<Value, FxBuildHasher>;

/// Insertion-ordered string-keyed map of values
pub type ValueMap = IndexMap<String, Value, FxBuildHasher>;

/// A fully assembled binding value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// No data at the key (bound as `None` / null)
    Absent,
    Scalar(Scalar),
    Sequence(Vec<Value>),
    Set(ValueSet),
    Map(ValueMap),
}

impl Value {
    /// Build a string scalar
    pub fn string(s: impl Into<String>) -> Self {
        Value::Scalar(Scalar::Str(s.into()))
    }

    /// Build a sequence from anything convertible to values
    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Build an insertion-ordered set (duplicates keep their first position)
    pub fn set<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::Set(items.into_iter().map(Into::into).collect())
    }

    /// Build an insertion-ordered map
    pub fn map<I, K>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Absent)
    }

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_set(&self) -> Option<&ValueSet> {
        match self {
            Value::Set(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(entries) => Some(entries),
            _ => None,
        }
    }

    /// Number of elements for containers, `None` for scalars/absence
    pub fn len(&self) -> Option<usize> {
        match self {
            Value::Sequence(items) => Some(items.len()),
            Value::Set(items) => Some(items.len()),
            Value::Map(entries) => Some(entries.len()),
            Value::Absent | Value::Scalar(_) => None,
        }
    }

    /// Short description used in error messages
    pub fn describe(&self) -> String {
        match self {
            Value::Absent => "absent value".to_string(),
            Value::Scalar(s) => format!("{} scalar", s.kind()),
            Value::Sequence(_) => "sequence".to_string(),
            Value::Set(_) => "set".to_string(),
            Value::Map(_) => "map".to_string(),
        }
    }
}

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::string(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::string(s)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Scalar(Scalar::Bool(v))
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Scalar(Scalar::Int(v))
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Scalar(Scalar::Long(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(Scalar::Double(v))
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Absent => {}
            Value::Scalar(s) => s.hash(state),
            Value::Sequence(items) => items.hash(state),
            // Set/map equality ignores order, so their hashes must too.
            Value::Set(items) => {
                state.write_usize(items.len());
                state.write_u64(unordered_digest(items.iter()));
            }
            Value::Map(entries) => {
                state.write_usize(entries.len());
                state.write_u64(unordered_digest(entries.iter()));
            }
        }
    }
}

fn unordered_digest<T: Hash>(items: impl Iterator<Item = T>) -> u64 {
    items
        .map(|item| FxBuildHasher.hash_one(item))
        .fold(0u64, u64::wrapping_add)
}
