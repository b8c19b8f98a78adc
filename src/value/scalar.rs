//! Scalar kinds and the text → scalar coercer
//!
//! Every store read ends up here: plain values, hash fields and collection
//! members are all text until coerced into the binding's scalar kind.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::num::{IntErrorKind, ParseIntError};
use std::str::FromStr;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;

use crate::error::{BindError, Result};

/// Case-insensitive spellings accepted as `true`
const TRUTHY: [&str; 5] = ["true", "t", "yes", "y", "1"];
/// Case-insensitive spellings accepted as `false`
const FALSY: [&str; 5] = ["false", "f", "no", "n", "0"];

/// Scalar target kinds, named by the Rust type they bind into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Boolean,
    Byte,
    Short,
    Integer,
    Long,
    BigInteger,
    Float,
    Double,
    BigDecimal,
    Char,
    String,
}

impl ScalarKind {
    /// All supported kinds (used by tests and the CLI help)
    pub const ALL: [ScalarKind; 11] = [
        ScalarKind::Boolean,
        ScalarKind::Byte,
        ScalarKind::Short,
        ScalarKind::Integer,
        ScalarKind::Long,
        ScalarKind::BigInteger,
        ScalarKind::Float,
        ScalarKind::Double,
        ScalarKind::BigDecimal,
        ScalarKind::Char,
        ScalarKind::String,
    ];

    /// Type name used in descriptors (`i64`, `BigInt`, ...)
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Boolean => "bool",
            ScalarKind::Byte => "i8",
            ScalarKind::Short => "i16",
            ScalarKind::Integer => "i32",
            ScalarKind::Long => "i64",
            ScalarKind::BigInteger => "BigInt",
            ScalarKind::Float => "f32",
            ScalarKind::Double => "f64",
            ScalarKind::BigDecimal => "BigDecimal",
            ScalarKind::Char => "char",
            ScalarKind::String => "String",
        }
    }

    /// Look up a kind by descriptor name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Value bound when the key is absent and neither null nor a default applies
    pub fn zero(self) -> Scalar {
        match self {
            ScalarKind::Boolean => Scalar::Bool(false),
            ScalarKind::Byte => Scalar::Byte(0),
            ScalarKind::Short => Scalar::Short(0),
            ScalarKind::Integer => Scalar::Int(0),
            ScalarKind::Long => Scalar::Long(0),
            ScalarKind::BigInteger => Scalar::BigInt(BigInt::default()),
            ScalarKind::Float => Scalar::Float(0.0),
            ScalarKind::Double => Scalar::Double(0.0),
            ScalarKind::BigDecimal => Scalar::Decimal(BigDecimal::default()),
            ScalarKind::Char => Scalar::Char('\0'),
            ScalarKind::String => Scalar::Str(String::new()),
        }
    }

    /// Convert stored text into this kind
    ///
    /// Only handles present text; absence is decided by the caller.
    pub fn coerce(self, text: &str) -> Result<Scalar> {
        match self {
            ScalarKind::Boolean => parse_bool(text).map(Scalar::Bool),
            ScalarKind::Byte => parse_int(self, text).map(Scalar::Byte),
            ScalarKind::Short => parse_int(self, text).map(Scalar::Short),
            ScalarKind::Integer => parse_int(self, text).map(Scalar::Int),
            ScalarKind::Long => parse_int(self, text).map(Scalar::Long),
            ScalarKind::BigInteger => {
                if !is_integer_text(text) {
                    return Err(format_error(self, text));
                }
                BigInt::from_str(text)
                    .map(Scalar::BigInt)
                    .map_err(|_| format_error(self, text))
            }
            ScalarKind::Float => text
                .parse::<f32>()
                .map(Scalar::Float)
                .map_err(|_| format_error(self, text)),
            ScalarKind::Double => text
                .parse::<f64>()
                .map(Scalar::Double)
                .map_err(|_| format_error(self, text)),
            ScalarKind::BigDecimal => {
                // BigDecimal's parser tolerates digit separators; stored text may not.
                if text.contains('_') {
                    return Err(format_error(self, text));
                }
                BigDecimal::from_str(text)
                    .map(Scalar::Decimal)
                    .map_err(|_| format_error(self, text))
            }
            ScalarKind::Char => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(Scalar::Char(c)),
                    _ => Err(format_error(self, text)),
                }
            }
            ScalarKind::String => Ok(Scalar::Str(text.to_string())),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn format_error(kind: ScalarKind, text: &str) -> BindError {
    BindError::FormatError {
        kind: kind.name().to_string(),
        text: text.to_string(),
    }
}

fn parse_bool(text: &str) -> Result<bool> {
    if TRUTHY.iter().any(|t| t.eq_ignore_ascii_case(text)) {
        Ok(true)
    } else if FALSY.iter().any(|f| f.eq_ignore_ascii_case(text)) {
        Ok(false)
    } else {
        Err(format_error(ScalarKind::Boolean, text))
    }
}

/// `[+-]?[0-9]+`, nothing else
fn is_integer_text(text: &str) -> bool {
    let digits = text.strip_prefix(['+', '-']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn parse_int<T>(kind: ScalarKind, text: &str) -> Result<T>
where
    T: FromStr<Err = ParseIntError>,
{
    if !is_integer_text(text) {
        return Err(format_error(kind, text));
    }
    text.parse::<T>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => BindError::RangeError {
            kind: kind.name().to_string(),
            text: text.to_string(),
        },
        _ => format_error(kind, text),
    })
}

/// A single coerced value
///
/// Floats compare and hash by bit pattern so scalars can live in sets.
#[derive(Debug, Clone)]
pub enum Scalar {
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    BigInt(BigInt),
    Float(f32),
    Double(f64),
    Decimal(BigDecimal),
    Char(char),
    Str(String),
}

impl Scalar {
    /// Kind this scalar was coerced into
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Bool(_) => ScalarKind::Boolean,
            Scalar::Byte(_) => ScalarKind::Byte,
            Scalar::Short(_) => ScalarKind::Short,
            Scalar::Int(_) => ScalarKind::Integer,
            Scalar::Long(_) => ScalarKind::Long,
            Scalar::BigInt(_) => ScalarKind::BigInteger,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Double(_) => ScalarKind::Double,
            Scalar::Decimal(_) => ScalarKind::BigDecimal,
            Scalar::Char(_) => ScalarKind::Char,
            Scalar::Str(_) => ScalarKind::String,
        }
    }
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Byte(a), Scalar::Byte(b)) => a == b,
            (Scalar::Short(a), Scalar::Short(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Long(a), Scalar::Long(b)) => a == b,
            (Scalar::BigInt(a), Scalar::BigInt(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Double(a), Scalar::Double(b)) => a.to_bits() == b.to_bits(),
            (Scalar::Decimal(a), Scalar::Decimal(b)) => a == b,
            (Scalar::Char(a), Scalar::Char(b)) => a == b,
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Scalar {}

impl Hash for Scalar {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Scalar::Bool(v) => v.hash(state),
            Scalar::Byte(v) => v.hash(state),
            Scalar::Short(v) => v.hash(state),
            Scalar::Int(v) => v.hash(state),
            Scalar::Long(v) => v.hash(state),
            Scalar::BigInt(v) => v.hash(state),
            Scalar::Float(v) => v.to_bits().hash(state),
            Scalar::Double(v) => v.to_bits().hash(state),
            Scalar::Decimal(v) => v.hash(state),
            Scalar::Char(v) => v.hash(state),
            Scalar::Str(v) => v.hash(state),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(v) => write!(f, "{}", v),
            Scalar::Byte(v) => write!(f, "{}", v),
            Scalar::Short(v) => write!(f, "{}", v),
            Scalar::Int(v) => write!(f, "{}", v),
            Scalar::Long(v) => write!(f, "{}", v),
            Scalar::BigInt(v) => write!(f, "{}", v),
            Scalar::Float(v) => write!(f, "{}", v),
            Scalar::Double(v) => write!(f, "{}", v),
            Scalar::Decimal(v) => write!(f, "{}", v),
            Scalar::Char(v) => write!(f, "{}", v),
            Scalar::Str(v) => f.write_str(v),
        }
    }
}
