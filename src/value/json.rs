//! JSON bridge for values
//!
//! Used by the CLI to print resolved values and to read `--default` arguments.
//! JSON scalars are converted through the scalar coercer so defaults obey the
//! same format and range rules as stored text.

use serde_json::{Map, Number, Value as Json};

use super::{Scalar, ScalarKind, Value};
use crate::error::{BindError, Result};
use crate::shape::{Container, ContainerKind, Element, Shape};

impl Value {
    /// Render as JSON (absence is `null`; big numbers are strings)
    pub fn to_json(&self) -> Json {
        match self {
            Value::Absent => Json::Null,
            Value::Scalar(s) => scalar_to_json(s),
            Value::Sequence(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Set(items) => Json::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(entries) => Json::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect::<Map<String, Json>>(),
            ),
        }
    }

    /// Build a value of `shape` from JSON (e.g. a declared default)
    pub fn from_json(json: &Json, shape: &Shape) -> Result<Self> {
        match shape {
            Shape::Scalar(kind) | Shape::NullableScalar(kind) => {
                scalar_from_json(json, *kind, shape).map(Value::Scalar)
            }
            Shape::Sequence(element) => Ok(Value::Sequence(
                json_items(json, shape)?
                    .iter()
                    .map(|item| element_from_json(item, element, shape))
                    .collect::<Result<_>>()?,
            )),
            Shape::Set(element) | Shape::OrderedSet(element) => Ok(Value::Set(
                json_items(json, shape)?
                    .iter()
                    .map(|item| element_from_json(item, element, shape))
                    .collect::<Result<_>>()?,
            )),
            Shape::Map(kind) => Ok(Value::Map(
                json_entries(json, shape)?
                    .iter()
                    .map(|(k, v)| {
                        let scalar = scalar_from_json(v, *kind, shape)?;
                        Ok((k.clone(), Value::Scalar(scalar)))
                    })
                    .collect::<Result<_>>()?,
            )),
            Shape::MapOfContainer(container) => Ok(Value::Map(
                json_entries(json, shape)?
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), container_from_json(v, container, shape)?)))
                    .collect::<Result<_>>()?,
            )),
        }
    }
}

fn scalar_to_json(scalar: &Scalar) -> Json {
    match scalar {
        Scalar::Bool(v) => Json::Bool(*v),
        Scalar::Byte(v) => Json::from(*v),
        Scalar::Short(v) => Json::from(*v),
        Scalar::Int(v) => Json::from(*v),
        Scalar::Long(v) => Json::from(*v),
        Scalar::Float(v) => float_to_json(f64::from(*v), scalar),
        Scalar::Double(v) => float_to_json(*v, scalar),
        Scalar::BigInt(_) | Scalar::Decimal(_) | Scalar::Char(_) | Scalar::Str(_) => {
            Json::String(scalar.to_string())
        }
    }
}

fn float_to_json(v: f64, scalar: &Scalar) -> Json {
    Number::from_f64(v)
        .map(Json::Number)
        .unwrap_or_else(|| Json::String(scalar.to_string()))
}

fn mismatch(json: &Json, shape: &Shape) -> BindError {
    BindError::TypeMismatch {
        target: shape.to_string(),
        found: format!("JSON {}", json),
    }
}

fn scalar_from_json(json: &Json, kind: ScalarKind, shape: &Shape) -> Result<Scalar> {
    match json {
        Json::String(s) => kind.coerce(s),
        Json::Number(n) => kind.coerce(&n.to_string()),
        Json::Bool(b) => kind.coerce(if *b { "true" } else { "false" }),
        other => Err(mismatch(other, shape)),
    }
}

fn json_items<'a>(json: &'a Json, shape: &Shape) -> Result<&'a Vec<Json>> {
    json.as_array().ok_or_else(|| mismatch(json, shape))
}

fn json_entries<'a>(json: &'a Json, shape: &Shape) -> Result<&'a Map<String, Json>> {
    json.as_object().ok_or_else(|| mismatch(json, shape))
}

fn element_from_json(json: &Json, element: &Element, shape: &Shape) -> Result<Value> {
    match element {
        Element::Scalar(kind) => scalar_from_json(json, *kind, shape).map(Value::Scalar),
        Element::Container(container) => container_from_json(json, container, shape),
    }
}

fn container_from_json(json: &Json, container: &Container, shape: &Shape) -> Result<Value> {
    let items = json_items(json, shape)?
        .iter()
        .map(|item| scalar_from_json(item, container.element, shape).map(Value::Scalar));
    Ok(match container.kind {
        ContainerKind::Sequence => Value::Sequence(items.collect::<Result<_>>()?),
        ContainerKind::Set | ContainerKind::OrderedSet => Value::Set(items.collect::<Result<_>>()?),
    })
}
