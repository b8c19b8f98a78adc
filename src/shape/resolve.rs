//! Type Shape Resolver
//!
//! Classifies a `TypeDescriptor` into the closed `Shape` vocabulary. Runs once
//! per binding at registration; everything downstream dispatches on `Shape`.

use std::fmt;

use crate::error::{BindError, Result};
use crate::value::{ScalarKind, Value};

use super::descriptor::TypeDescriptor;

/// Collection flavour of a container shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// `Vec<T>`: keeps duplicates and source order
    Sequence,
    /// `HashSet<T>`: unique, keeps source order when the source has one
    Set,
    /// `IndexSet<T>`: unique, always deterministically ordered
    OrderedSet,
}

impl ContainerKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ContainerKind::Sequence => "Vec",
            ContainerKind::Set => "HashSet",
            ContainerKind::OrderedSet => "IndexSet",
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "Vec" => Some(ContainerKind::Sequence),
            "HashSet" => Some(ContainerKind::Set),
            "IndexSet" => Some(ContainerKind::OrderedSet),
            _ => None,
        }
    }
}

/// One container level over scalar elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Container {
    pub kind: ContainerKind,
    pub element: ScalarKind,
}

impl Container {
    pub fn new(kind: ContainerKind, element: ScalarKind) -> Self {
        Self { kind, element }
    }

    /// Empty value of this container
    pub fn empty(&self) -> Value {
        match self.kind {
            ContainerKind::Sequence => Value::Sequence(Vec::new()),
            ContainerKind::Set | ContainerKind::OrderedSet => Value::Set(Default::default()),
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        let element_ok = |v: &Value| matches!(v, Value::Scalar(s) if s.kind() == self.element);
        match (self.kind, value) {
            (ContainerKind::Sequence, Value::Sequence(items)) => items.iter().all(element_ok),
            (ContainerKind::Set | ContainerKind::OrderedSet, Value::Set(items)) => {
                items.iter().all(element_ok)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}>", self.kind.type_name(), self.element)
    }
}

/// Element of a top-level container: a scalar or one nested container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    Scalar(ScalarKind),
    Container(Container),
}

impl Element {
    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Element::Scalar(kind), Value::Scalar(s)) => s.kind() == *kind,
            (Element::Container(container), v) => container.accepts(v),
            _ => false,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Element::Scalar(kind) => write!(f, "{}", kind),
            Element::Container(container) => write!(f, "{}", container),
        }
    }
}

/// Closed classification of binding target types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Non-nullable scalar (`i64`)
    Scalar(ScalarKind),
    /// Nullable scalar (`Option<i64>`)
    NullableScalar(ScalarKind),
    Sequence(Element),
    Set(Element),
    OrderedSet(Element),
    /// `HashMap<String, T>` filled from a store hash
    Map(ScalarKind),
    /// `HashMap<String, C<T>>`: the key's container, keyed by the key itself
    MapOfContainer(Container),
}

impl Shape {
    /// Value bound for an absent key when neither null nor a default applies
    pub fn zero_value(&self) -> Value {
        match self {
            Shape::Scalar(kind) | Shape::NullableScalar(kind) => Value::Scalar(kind.zero()),
            Shape::Sequence(_) => Value::Sequence(Vec::new()),
            Shape::Set(_) | Shape::OrderedSet(_) => Value::Set(Default::default()),
            Shape::Map(_) | Shape::MapOfContainer(_) => Value::Map(Default::default()),
        }
    }

    /// True if the shape admits a null (`Absent`) binding without a default
    pub fn is_nullable(&self) -> bool {
        !matches!(self, Shape::Scalar(_))
    }

    /// Check a caller-supplied value (e.g. a default) conforms to this shape
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Shape::Scalar(kind) | Shape::NullableScalar(kind), Value::Scalar(s)) => {
                s.kind() == *kind
            }
            (Shape::Sequence(element), Value::Sequence(items)) => {
                items.iter().all(|v| element.accepts(v))
            }
            (Shape::Set(element) | Shape::OrderedSet(element), Value::Set(items)) => {
                items.iter().all(|v| element.accepts(v))
            }
            (Shape::Map(kind), Value::Map(entries)) => entries
                .values()
                .all(|v| matches!(v, Value::Scalar(s) if s.kind() == *kind)),
            (Shape::MapOfContainer(container), Value::Map(entries)) => {
                entries.values().all(|v| container.accepts(v))
            }
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Scalar(kind) => write!(f, "{}", kind),
            Shape::NullableScalar(kind) => write!(f, "Option<{}>", kind),
            Shape::Sequence(element) => write!(f, "Vec<{}>", element),
            Shape::Set(element) => write!(f, "HashSet<{}>", element),
            Shape::OrderedSet(element) => write!(f, "IndexSet<{}>", element),
            Shape::Map(kind) => write!(f, "HashMap<String, {}>", kind),
            Shape::MapOfContainer(container) => write!(f, "HashMap<String, {}>", container),
        }
    }
}

fn unsupported(descriptor: &TypeDescriptor, reason: impl Into<String>) -> BindError {
    BindError::UnsupportedShape {
        descriptor: descriptor.to_string(),
        reason: reason.into(),
    }
}

/// Classify a descriptor into a `Shape`
pub fn resolve_shape(descriptor: &TypeDescriptor) -> Result<Shape> {
    if descriptor.depth() > 2 {
        return Err(unsupported(
            descriptor,
            "nests more than one container level",
        ));
    }

    match descriptor {
        TypeDescriptor::Named(_) => scalar_kind(descriptor).map(Shape::Scalar),
        TypeDescriptor::Generic { name, args } => match (name.as_str(), args.as_slice()) {
            ("Option", [inner]) => match inner {
                TypeDescriptor::Named(_) => scalar_kind(inner).map(Shape::NullableScalar),
                _ => Err(unsupported(
                    descriptor,
                    "Option is only supported around scalar types",
                )),
            },
            ("HashMap", [key, value]) => {
                if *key != TypeDescriptor::named("String") {
                    return Err(unsupported(descriptor, "map keys must be String"));
                }
                match value {
                    TypeDescriptor::Named(_) => scalar_kind(value).map(Shape::Map),
                    _ => container(value).map(Shape::MapOfContainer),
                }
            }
            (name, [inner]) => {
                let kind = ContainerKind::from_type_name(name).ok_or_else(|| {
                    unsupported(descriptor, format!("unknown container '{}'", name))
                })?;
                let element = element(inner)?;
                Ok(match kind {
                    ContainerKind::Sequence => Shape::Sequence(element),
                    ContainerKind::Set => Shape::Set(element),
                    ContainerKind::OrderedSet => Shape::OrderedSet(element),
                })
            }
            (name, args) => Err(unsupported(
                descriptor,
                format!("'{}' with {} type arguments is not a supported type", name, args.len()),
            )),
        },
    }
}

fn scalar_kind(descriptor: &TypeDescriptor) -> Result<ScalarKind> {
    ScalarKind::from_name(descriptor.name())
        .ok_or_else(|| unsupported(descriptor, "unknown scalar type"))
}

fn element(descriptor: &TypeDescriptor) -> Result<Element> {
    match descriptor {
        TypeDescriptor::Named(_) => scalar_kind(descriptor).map(Element::Scalar),
        TypeDescriptor::Generic { .. } => container(descriptor).map(Element::Container),
    }
}

/// One container level over a scalar (`Vec<i64>`, `HashSet<String>`, ...)
fn container(descriptor: &TypeDescriptor) -> Result<Container> {
    let TypeDescriptor::Generic { name, args } = descriptor else {
        return Err(unsupported(descriptor, "expected a container type"));
    };
    let kind = ContainerKind::from_type_name(name).ok_or_else(|| {
        unsupported(
            descriptor,
            format!("'{}' is not a supported element container", name),
        )
    })?;
    match args.as_slice() {
        [inner @ TypeDescriptor::Named(_)] => Ok(Container::new(kind, scalar_kind(inner)?)),
        [_] => Err(unsupported(
            descriptor,
            "container elements must be scalars at the nested level",
        )),
        _ => Err(unsupported(
            descriptor,
            format!("'{}' takes exactly one type argument", name),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn shape(s: &str) -> Result<Shape> {
        resolve_shape(&s.parse::<TypeDescriptor>()?)
    }

    fn is_unsupported(result: Result<Shape>) -> bool {
        matches!(result, Err(BindError::UnsupportedShape { .. }))
    }

    #[test]
    fn scalars_and_nullable_scalars() {
        assert_eq!(shape("i64").unwrap(), Shape::Scalar(ScalarKind::Long));
        assert_eq!(
            shape("Option<bool>").unwrap(),
            Shape::NullableScalar(ScalarKind::Boolean)
        );
        assert_eq!(shape("String").unwrap(), Shape::Scalar(ScalarKind::String));
    }

    #[test]
    fn flat_containers() {
        assert_eq!(
            shape("Vec<String>").unwrap(),
            Shape::Sequence(Element::Scalar(ScalarKind::String))
        );
        assert_eq!(
            shape("HashSet<i32>").unwrap(),
            Shape::Set(Element::Scalar(ScalarKind::Integer))
        );
        assert_eq!(
            shape("IndexSet<String>").unwrap(),
            Shape::OrderedSet(Element::Scalar(ScalarKind::String))
        );
        assert_eq!(shape("HashMap<String, f64>").unwrap(), Shape::Map(ScalarKind::Double));
    }

    #[test]
    fn one_level_of_container_nesting() {
        let set_of_strings = Container::new(ContainerKind::Set, ScalarKind::String);
        assert_eq!(
            shape("HashMap<String, HashSet<String>>").unwrap(),
            Shape::MapOfContainer(set_of_strings)
        );
        assert_eq!(
            shape("Vec<HashSet<String>>").unwrap(),
            Shape::Sequence(Element::Container(set_of_strings))
        );
        assert_eq!(
            shape("HashSet<HashSet<String>>").unwrap(),
            Shape::Set(Element::Container(set_of_strings))
        );
    }

    #[test]
    fn deeper_nesting_is_unsupported() {
        assert!(is_unsupported(shape("Vec<Vec<Vec<i64>>>")));
        assert!(is_unsupported(shape("HashMap<String, Vec<Vec<i64>>>")));
        assert!(is_unsupported(shape("Vec<HashMap<String, i64>>")));
    }

    #[test]
    fn unknown_names_are_unsupported() {
        assert!(is_unsupported(shape("u128")));
        assert!(is_unsupported(shape("Box<i64>")));
        assert!(is_unsupported(shape("Vec<Widget>")));
        assert!(is_unsupported(shape("HashMap<i64, String>")));
        assert!(is_unsupported(shape("Option<Vec<i64>>")));
        assert!(is_unsupported(shape("Vec<Option<i64>>")));
        assert!(is_unsupported(shape("Vec<i64, i64>")));
    }

    #[test]
    fn display_matches_descriptor_syntax() {
        for text in [
            "i64",
            "Option<bool>",
            "Vec<String>",
            "IndexSet<HashSet<i32>>",
            "HashMap<String, Vec<BigInt>>",
            "HashMap<String, char>",
        ] {
            assert_eq!(shape(text).unwrap().to_string(), text);
        }
    }

    #[test]
    fn zero_values_per_shape() {
        assert_eq!(shape("i32").unwrap().zero_value(), Value::from(0i32));
        assert_eq!(shape("Option<bool>").unwrap().zero_value(), Value::from(false));
        assert_eq!(shape("Vec<i64>").unwrap().zero_value(), Value::Sequence(vec![]));
        assert_eq!(shape("HashSet<String>").unwrap().zero_value().len(), Some(0));
        assert_eq!(
            shape("HashMap<String, Vec<i64>>").unwrap().zero_value(),
            Value::Map(Default::default())
        );
    }

    #[test]
    fn accepts_checks_kinds_recursively() {
        let s = shape("IndexSet<String>").unwrap();
        assert!(s.accepts(&Value::set(["a", "b"])));
        assert!(!s.accepts(&Value::set([1i64])));
        assert!(!s.accepts(&Value::sequence(["a"])));
        assert!(!s.accepts(&Value::Absent));

        let nested = shape("HashMap<String, Vec<i64>>").unwrap();
        assert!(nested.accepts(&Value::map([("k", Value::sequence([1i64, 2]))])));
        assert!(!nested.accepts(&Value::map([("k", Value::from(1i64))])));
    }
}
