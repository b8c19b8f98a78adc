//! Binding registration
//!
//! A `BindingSpec` is built once per declared field and is immutable after
//! `build()`. The shape is resolved and the options validated up front so
//! resolution never has to revisit the declaration.

use std::fmt;

use serde_json::Value as Json;
use xxhash_rust::xxh3::Xxh3;

use crate::config::BindingDefaults;
use crate::error::{BindError, Result};
use crate::shape::{resolve_shape, Shape, TypeDescriptor};
use crate::value::Value;

/// Opaque cache identity of a binding
///
/// xxh3-128 over declaring type, field, key, shape and options: two bindings
/// on the same key with different shapes or options never share an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingIdentity(u128);

impl BindingIdentity {
    pub fn as_u128(self) -> u128 {
        self.0
    }
}

impl fmt::Display for BindingIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// A registered binding: key, target shape and resolution options
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSpec {
    identity: BindingIdentity,
    declaring_type: String,
    field: String,
    key: String,
    descriptor: TypeDescriptor,
    shape: Shape,
    allow_null: bool,
    force_update: bool,
    default: Option<Value>,
}

impl BindingSpec {
    /// Start declaring a binding of `declaring_type.field` to store `key`
    pub fn builder(
        declaring_type: impl Into<String>,
        field: impl Into<String>,
        key: impl Into<String>,
        descriptor: TypeDescriptor,
    ) -> BindingSpecBuilder {
        BindingSpecBuilder {
            declaring_type: declaring_type.into(),
            field: field.into(),
            key: key.into(),
            descriptor,
            options: BindingDefaults::default(),
            default: None,
        }
    }

    pub fn identity(&self) -> BindingIdentity {
        self.identity
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// `Type.field`, as shown in logs and errors
    pub fn name(&self) -> String {
        format!("{}.{}", self.declaring_type, self.field)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn allow_null(&self) -> bool {
        self.allow_null
    }

    pub fn force_update(&self) -> bool {
        self.force_update
    }

    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Default value as given to the builder
#[derive(Debug, Clone)]
enum DefaultSource {
    Value(Value),
    /// Converted against the shape at `build()`
    Json(Json),
}

/// Builder for `BindingSpec`
#[derive(Debug, Clone)]
pub struct BindingSpecBuilder {
    declaring_type: String,
    field: String,
    key: String,
    descriptor: TypeDescriptor,
    options: BindingDefaults,
    default: Option<DefaultSource>,
}

impl BindingSpecBuilder {
    /// Take `allow_null` / `force_update` from configured defaults
    pub fn with_defaults(mut self, defaults: &BindingDefaults) -> Self {
        self.options = *defaults;
        self
    }

    pub fn allow_null(mut self, allow_null: bool) -> Self {
        self.options.allow_null = allow_null;
        self
    }

    pub fn force_update(mut self, force_update: bool) -> Self {
        self.options.force_update = force_update;
        self
    }

    /// Value bound when the key is absent
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultSource::Value(value.into()));
        self
    }

    /// Default given as JSON, coerced with the binding's scalar rules
    pub fn default_json(mut self, json: Json) -> Self {
        self.default = Some(DefaultSource::Json(json));
        self
    }

    /// Resolve the shape, validate options and compute the identity
    pub fn build(self) -> Result<BindingSpec> {
        let name = format!("{}.{}", self.declaring_type, self.field);
        let invalid = |reason: String| BindError::InvalidBinding {
            binding: name.clone(),
            reason,
        };

        let shape = resolve_shape(&self.descriptor)?;

        let default = match self.default {
            None => None,
            Some(DefaultSource::Value(value)) if value.is_absent() || shape.accepts(&value) => {
                Some(value)
            }
            // Literals of another width (`7` for an i64 binding) convert like JSON defaults
            Some(DefaultSource::Value(value)) => {
                let converted = Value::from_json(&value.to_json(), &shape).map_err(|e| {
                    invalid(format!(
                        "default {} does not conform to {}: {}",
                        value.describe(),
                        shape,
                        e
                    ))
                })?;
                Some(converted)
            }
            Some(DefaultSource::Json(json)) => {
                let value = Value::from_json(&json, &shape).map_err(|e| {
                    invalid(format!("default value is not a valid {}: {}", shape, e))
                })?;
                Some(value)
            }
        };

        if let Some(value) = &default {
            if value.is_absent() || !shape.accepts(value) {
                return Err(invalid(format!(
                    "default {} does not conform to {}",
                    value.describe(),
                    shape
                )));
            }
        }

        if let Shape::Scalar(kind) = shape {
            if self.options.allow_null && default.is_none() {
                return Err(invalid(format!(
                    "{} cannot hold null; declare Option<{}>, disable allow_null or give a default",
                    kind, kind
                )));
            }
        }

        let identity = identity_of(
            &self.declaring_type,
            &self.field,
            &self.key,
            &shape,
            &self.options,
            default.as_ref(),
        );

        Ok(BindingSpec {
            identity,
            declaring_type: self.declaring_type,
            field: self.field,
            key: self.key,
            descriptor: self.descriptor,
            shape,
            allow_null: self.options.allow_null,
            force_update: self.options.force_update,
            default,
        })
    }
}

fn identity_of(
    declaring_type: &str,
    field: &str,
    key: &str,
    shape: &Shape,
    options: &BindingDefaults,
    default: Option<&Value>,
) -> BindingIdentity {
    let shape = shape.to_string();
    let mut hasher = Xxh3::new();
    for part in [declaring_type, field, key, shape.as_str()] {
        hasher.update(part.as_bytes());
        hasher.update(&[0]);
    }
    hasher.update(&[options.allow_null as u8, options.force_update as u8]);
    if let Some(value) = default {
        hasher.update(value.to_json().to_string().as_bytes());
    }
    BindingIdentity(hasher.digest128())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ty(s: &str) -> TypeDescriptor {
        s.parse().unwrap()
    }

    #[test]
    fn build_resolves_shape() {
        let spec = BindingSpec::builder("Config", "port", "port", ty("Option<i32>"))
            .build()
            .unwrap();
        assert_eq!(spec.shape().to_string(), "Option<i32>");
        assert!(spec.allow_null());
        assert!(!spec.force_update());
        assert!(!spec.has_default());
        assert_eq!(spec.name(), "Config.port");
    }

    #[test]
    fn non_nullable_scalar_with_allow_null_is_rejected() {
        let err = BindingSpec::builder("Config", "port", "port", ty("i32"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::InvalidBinding { .. }));

        assert!(BindingSpec::builder("Config", "port", "port", ty("i32"))
            .allow_null(false)
            .build()
            .is_ok());
        assert!(BindingSpec::builder("Config", "port", "port", ty("i32"))
            .default_value(8080)
            .build()
            .is_ok());
    }

    #[test]
    fn nonconforming_default_is_rejected() {
        let err = BindingSpec::builder("Config", "port", "port", ty("Option<i64>"))
            .default_value("eighty")
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::InvalidBinding { .. }));

        let err = BindingSpec::builder("Config", "names", "names", ty("Vec<String>"))
            .default_json(json!("not a list"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::InvalidBinding { .. }));
    }

    #[test]
    fn integer_literal_default_takes_the_declared_width() {
        let spec = BindingSpec::builder("Config", "total", "total", ty("i64"))
            .default_value(7)
            .build()
            .unwrap();
        assert_eq!(spec.default(), Some(&Value::from(7i64)));

        let spec = BindingSpec::builder("Config", "ids", "ids", ty("IndexSet<i64>"))
            .default_value(Value::set([3i32, 1]))
            .build()
            .unwrap();
        assert_eq!(spec.default(), Some(&Value::set([3i64, 1])));

        let err = BindingSpec::builder("Config", "small", "small", ty("Option<i8>"))
            .default_value(300)
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::InvalidBinding { .. }));
    }

    #[test]
    fn json_default_is_coerced_to_shape() {
        let spec = BindingSpec::builder("Config", "ids", "ids", ty("Vec<i64>"))
            .default_json(json!(["1", 2]))
            .build()
            .unwrap();
        assert_eq!(spec.default(), Some(&Value::sequence([1i64, 2])));
    }

    #[test]
    fn unsupported_descriptor_fails_at_build() {
        let err = BindingSpec::builder("Config", "deep", "deep", ty("Vec<Vec<Vec<i32>>>"))
            .build()
            .unwrap_err();
        assert!(matches!(err, BindError::UnsupportedShape { .. }));
    }

    #[test]
    fn identity_distinguishes_shape_and_options() {
        let base = || BindingSpec::builder("Config", "ids", "ids", ty("Vec<i64>"));
        let a = base().build().unwrap();
        let b = base().build().unwrap();
        assert_eq!(a.identity(), b.identity());

        let forced = base().force_update(true).build().unwrap();
        let other_shape = BindingSpec::builder("Config", "ids", "ids", ty("HashSet<i64>"))
            .build()
            .unwrap();
        let other_field = BindingSpec::builder("Config", "ids2", "ids", ty("Vec<i64>"))
            .build()
            .unwrap();

        assert_ne!(a.identity(), forced.identity());
        assert_ne!(a.identity(), other_shape.identity());
        assert_ne!(a.identity(), other_field.identity());
    }

    #[test]
    fn with_defaults_applies_config() {
        let defaults = BindingDefaults {
            allow_null: false,
            force_update: true,
        };
        let spec = BindingSpec::builder("Config", "port", "port", ty("i32"))
            .with_defaults(&defaults)
            .build()
            .unwrap();
        assert!(!spec.allow_null());
        assert!(spec.force_update());
    }

    #[test]
    fn identity_displays_as_hex() {
        let spec = BindingSpec::builder("Config", "name", "name", ty("String"))
            .allow_null(false)
            .build()
            .unwrap();
        let hex = spec.identity().to_string();
        assert_eq!(hex.len(), 32);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
