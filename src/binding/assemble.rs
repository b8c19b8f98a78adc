//! Container Assembler - raw store data → shaped value
//!
//! Pure transform. Every element goes through the scalar coercer; the first
//! coercion failure fails the whole assembly.
//!
//! | Shape                       | Plain | Hash | Unordered | Ordered |
//! |-----------------------------|-------|------|-----------|---------|
//! | Scalar / NullableScalar     | ✓     |      |           |         |
//! | Sequence / Set / OrderedSet |       |      | ✓         | ✓       |
//! | Map                         |       | ✓    |           |         |
//! | MapOfContainer              |       |      | ✓         | ✓       |
//!
//! Ordered sources keep score order in every container. Unordered sources
//! keep store iteration order, except `OrderedSet`, which sorts members by
//! their stored text.

use crate::error::{BindError, Result};
use crate::shape::{Container, ContainerKind, Element, Shape};
use crate::store::RawStoreResult;
use crate::value::{ScalarKind, Value};

/// Build a value of `shape` from what the store holds at `key`
///
/// `Absent` passes through untouched; the absence policy belongs to the caller.
pub fn assemble(key: &str, shape: &Shape, raw: &RawStoreResult) -> Result<Value> {
    match (shape, raw) {
        (_, RawStoreResult::Absent) => Ok(Value::Absent),

        (Shape::Scalar(kind) | Shape::NullableScalar(kind), RawStoreResult::Plain(text)) => {
            kind.coerce(text).map(Value::Scalar)
        }

        (Shape::Map(kind), RawStoreResult::Hash(fields)) => fields
            .iter()
            .map(|(field, text)| Ok((field.clone(), Value::Scalar(kind.coerce(text)?))))
            .collect::<Result<_>>()
            .map(Value::Map),

        (Shape::Sequence(element), _) => {
            collection(key, shape, raw, |members, ordered| match element {
                Element::Scalar(kind) => Ok(Value::Sequence(
                    coerce_all(*kind, &arrange(members, ordered, ContainerKind::Sequence))?,
                )),
                Element::Container(inner) => {
                    Ok(Value::Sequence(vec![build(inner, members, ordered)?]))
                }
            })
        }

        (Shape::Set(element), _) => collection(key, shape, raw, |members, ordered| {
            set_of(element, ContainerKind::Set, members, ordered)
        }),

        (Shape::OrderedSet(element), _) => collection(key, shape, raw, |members, ordered| {
            set_of(element, ContainerKind::OrderedSet, members, ordered)
        }),

        (Shape::MapOfContainer(inner), _) => collection(key, shape, raw, |members, ordered| {
            Ok(Value::map([(key, build(inner, members, ordered)?)]))
        }),

        _ => Err(mismatch(key, shape, raw)),
    }
}

fn mismatch(key: &str, shape: &Shape, raw: &RawStoreResult) -> BindError {
    BindError::ShapeMismatch {
        key: key.to_string(),
        shape: shape.to_string(),
        representation: raw.representation().to_string(),
    }
}

/// Run `f` over a collection's members and whether they carry store order
fn collection<F>(key: &str, shape: &Shape, raw: &RawStoreResult, f: F) -> Result<Value>
where
    F: FnOnce(&[String], bool) -> Result<Value>,
{
    match raw {
        RawStoreResult::UnorderedCollection(members) => f(members, false),
        RawStoreResult::OrderedCollection(members) => f(members, true),
        _ => Err(mismatch(key, shape, raw)),
    }
}

/// Member order for a container of `kind`
fn arrange(members: &[String], ordered: bool, kind: ContainerKind) -> Vec<&str> {
    let mut arranged: Vec<&str> = members.iter().map(String::as_str).collect();
    if !ordered && kind == ContainerKind::OrderedSet {
        arranged.sort_unstable();
    }
    arranged
}

fn coerce_all(kind: ScalarKind, members: &[&str]) -> Result<Vec<Value>> {
    members
        .iter()
        .map(|text| kind.coerce(text).map(Value::Scalar))
        .collect()
}

fn set_of(
    element: &Element,
    kind: ContainerKind,
    members: &[String],
    ordered: bool,
) -> Result<Value> {
    match element {
        Element::Scalar(scalar) => Ok(Value::Set(
            coerce_all(*scalar, &arrange(members, ordered, kind))?
                .into_iter()
                .collect(),
        )),
        Element::Container(inner) => Ok(Value::set([build(inner, members, ordered)?])),
    }
}

/// The inner container of a nested shape, holding every member
fn build(container: &Container, members: &[String], ordered: bool) -> Result<Value> {
    let values = coerce_all(container.element, &arrange(members, ordered, container.kind))?;
    Ok(match container.kind {
        ContainerKind::Sequence => Value::Sequence(values),
        ContainerKind::Set | ContainerKind::OrderedSet => Value::Set(values.into_iter().collect()),
    })
}
