//! Conversion from resolved values into host Rust types
//!
//! This is the boundary where `Value::Absent` becomes `None`. Only `Option<T>`
//! accepts absence; every other target fails rather than inventing a value.

use std::collections::{HashMap, HashSet};
use std::hash::{BuildHasher, Hash};

use bigdecimal::BigDecimal;
use indexmap::{IndexMap, IndexSet};
use num_bigint::BigInt;

use super::{Scalar, Value};
use crate::error::{BindError, Result};

/// Types a resolved binding value can be bound into
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Result<Self>;
}

fn mismatch(target: &str, value: &Value) -> BindError {
    BindError::TypeMismatch {
        target: target.to_string(),
        found: value.describe(),
    }
}

macro_rules! scalar_from_value {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Result<Self> {
                    match value {
                        Value::Scalar(Scalar::$variant(v)) => Ok(v.clone()),
                        other => Err(mismatch(stringify!($ty), other)),
                    }
                }
            }
        )*
    };
}

scalar_from_value! {
    bool => Bool,
    i8 => Byte,
    i16 => Short,
    i32 => Int,
    i64 => Long,
    BigInt => BigInt,
    f32 => Float,
    f64 => Double,
    BigDecimal => Decimal,
    char => Char,
    String => Str,
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Result<Self> {
        Ok(value.clone())
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Absent => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

/// Elements of a sequence or set, in their assembled order
fn elements<'a>(
    target: &str,
    value: &'a Value,
) -> Result<Box<dyn Iterator<Item = &'a Value> + 'a>> {
    match value {
        Value::Sequence(items) => Ok(Box::new(items.iter())),
        Value::Set(items) => Ok(Box::new(items.iter())),
        other => Err(mismatch(target, other)),
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Result<Self> {
        elements("Vec", value)?.map(T::from_value).collect()
    }
}

impl<T, S> FromValue for HashSet<T, S>
where
    T: FromValue + Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value) -> Result<Self> {
        elements("HashSet", value)?.map(T::from_value).collect()
    }
}

impl<T, S> FromValue for IndexSet<T, S>
where
    T: FromValue + Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value) -> Result<Self> {
        elements("IndexSet", value)?.map(T::from_value).collect()
    }
}

impl<T, S> FromValue for HashMap<String, T, S>
where
    T: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            other => Err(mismatch("HashMap", other)),
        }
    }
}

impl<T, S> FromValue for IndexMap<String, T, S>
where
    T: FromValue,
    S: BuildHasher + Default,
{
    fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::Map(entries) => entries
                .iter()
                .map(|(k, v)| T::from_value(v).map(|v| (k.clone(), v)))
                .collect(),
            other => Err(mismatch("IndexMap", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalars_bind_into_matching_rust_types() {
        assert_eq!(i64::from_value(&Value::from(123i64)).unwrap(), 123);
        assert!(bool::from_value(&Value::from(true)).unwrap());
        assert_eq!(String::from_value(&Value::string("x")).unwrap(), "x");
    }

    #[test]
    fn scalar_kind_mismatch_fails() {
        let err = i32::from_value(&Value::from(123i64)).unwrap_err();
        assert!(matches!(err, BindError::TypeMismatch { .. }));
    }

    #[test]
    fn absent_binds_only_into_option() {
        assert_eq!(Option::<i64>::from_value(&Value::Absent).unwrap(), None);
        assert_eq!(Option::<i64>::from_value(&Value::from(5i64)).unwrap(), Some(5));
        assert!(i64::from_value(&Value::Absent).is_err());
        assert!(Vec::<String>::from_value(&Value::Absent).is_err());
    }

    #[test]
    fn ordered_set_binds_into_index_set_preserving_order() {
        let value = Value::set(["value_03", "value_02", "value_01"]);
        let set: IndexSet<String> = FromValue::from_value(&value).unwrap();
        let order: Vec<&str> = set.iter().map(String::as_str).collect();
        assert_eq!(order, vec!["value_03", "value_02", "value_01"]);
    }

    #[test]
    fn set_binds_into_vec_and_hash_set() {
        let value = Value::set(["a", "b"]);
        let list: Vec<String> = FromValue::from_value(&value).unwrap();
        assert_eq!(list, vec!["a", "b"]);
        let set: HashSet<String> = FromValue::from_value(&value).unwrap();
        assert!(set.contains("a") && set.contains("b"));
    }

    #[test]
    fn map_of_sets_binds_into_nested_collections() {
        let value = Value::map([("test:set", Value::set(["a"]))]);
        let map: HashMap<String, HashSet<String>> = FromValue::from_value(&value).unwrap();
        assert_eq!(map.len(), 1);
        assert!(map["test:set"].contains("a"));
    }
}
