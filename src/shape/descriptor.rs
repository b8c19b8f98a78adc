//! Target type descriptors
//!
//! A descriptor is the syntactic form of a binding's declared type, e.g.
//! `Option<i64>` or `HashMap<String, IndexSet<String>>`. Parsing only checks
//! syntax; classification into a `Shape` happens in `resolve`.

use std::fmt;
use std::iter::Peekable;
use std::str::{CharIndices, FromStr};

use crate::error::{BindError, Result};

/// Deepest generic nesting the parser accepts. Shapes allow two levels;
/// the slack lets the resolver report deeper types as unsupported.
const MAX_NESTING: usize = 8;

/// Declared target type, before classification
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    /// Leaf type name (`i64`, `String`, `BigInt`, ...)
    Named(String),
    /// Generic type with arguments (`Vec<T>`, `HashMap<K, V>`, ...)
    Generic {
        name: String,
        args: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn named(name: impl Into<String>) -> Self {
        TypeDescriptor::Named(name.into())
    }

    pub fn generic(name: impl Into<String>, args: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Generic {
            name: name.into(),
            args,
        }
    }

    pub fn option(inner: TypeDescriptor) -> Self {
        Self::generic("Option", vec![inner])
    }

    pub fn vec(inner: TypeDescriptor) -> Self {
        Self::generic("Vec", vec![inner])
    }

    pub fn hash_set(inner: TypeDescriptor) -> Self {
        Self::generic("HashSet", vec![inner])
    }

    pub fn index_set(inner: TypeDescriptor) -> Self {
        Self::generic("IndexSet", vec![inner])
    }

    pub fn hash_map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::generic("HashMap", vec![key, value])
    }

    /// Outermost type name
    pub fn name(&self) -> &str {
        match self {
            TypeDescriptor::Named(name) => name,
            TypeDescriptor::Generic { name, .. } => name,
        }
    }

    /// Number of generic levels (`i64` = 0, `Vec<i64>` = 1, `Vec<Vec<i64>>` = 2)
    pub fn depth(&self) -> usize {
        match self {
            TypeDescriptor::Named(_) => 0,
            TypeDescriptor::Generic { args, .. } => {
                1 + args.iter().map(TypeDescriptor::depth).max().unwrap_or(0)
            }
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Named(name) => f.write_str(name),
            TypeDescriptor::Generic { name, args } => {
                write!(f, "{}<", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(">")
            }
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        let mut parser = Parser {
            chars: s.char_indices().peekable(),
            len: s.len(),
        };
        let descriptor = parser.parse_type(0)?;
        parser.skip_whitespace();
        match parser.chars.peek() {
            None => Ok(descriptor),
            Some(&(pos, ch)) => Err(parse_error(pos, format!("unexpected '{}' after type", ch))),
        }
    }
}

fn parse_error(position: usize, details: impl Into<String>) -> BindError {
    BindError::DescriptorParse {
        position,
        details: details.into(),
    }
}

/// Recursive descent over `ident ( '<' type (',' type)* '>' )?`
struct Parser<'a> {
    chars: Peekable<CharIndices<'a>>,
    len: usize,
}

impl Parser<'_> {
    fn position(&mut self) -> usize {
        self.chars.peek().map(|&(i, _)| i).unwrap_or(self.len)
    }

    fn skip_whitespace(&mut self) {
        while self.chars.next_if(|&(_, c)| c.is_whitespace()).is_some() {}
    }

    fn parse_type(&mut self, depth: usize) -> Result<TypeDescriptor> {
        self.skip_whitespace();
        let name = self.parse_ident()?;
        self.skip_whitespace();

        let open = self.position();
        if self.chars.next_if(|&(_, c)| c == '<').is_none() {
            return Ok(TypeDescriptor::Named(name));
        }
        if depth >= MAX_NESTING {
            return Err(parse_error(
                open,
                format!("generics nested deeper than {} levels", MAX_NESTING),
            ));
        }

        let mut args = vec![self.parse_type(depth + 1)?];
        loop {
            self.skip_whitespace();
            let pos = self.position();
            match self.chars.next() {
                Some((_, ',')) => args.push(self.parse_type(depth + 1)?),
                Some((_, '>')) => break,
                Some((_, ch)) => {
                    let details = format!("expected ',' or '>', found '{}'", ch);
                    return Err(parse_error(pos, details));
                }
                None => return Err(parse_error(pos, "unclosed '<'")),
            }
        }
        Ok(TypeDescriptor::Generic { name, args })
    }

    /// Identifier, optionally path-qualified (`std::collections::HashSet`).
    /// Only the last path segment is kept.
    fn parse_ident(&mut self) -> Result<String> {
        let start = self.position();
        let mut ident = String::new();
        while let Some((_, c)) = self
            .chars
            .next_if(|&(_, c)| c.is_alphanumeric() || c == '_' || c == ':')
        {
            ident.push(c);
        }
        if ident.is_empty() {
            return Err(match self.chars.peek() {
                Some(&(pos, ch)) => {
                    parse_error(pos, format!("expected type name, found '{}'", ch))
                }
                None => parse_error(start, "expected type name"),
            });
        }
        let segment = ident.rsplit("::").next().unwrap_or_default();
        if segment.is_empty()
            || segment.contains(':')
            || segment.starts_with(|c: char| c.is_ascii_digit())
        {
            return Err(parse_error(start, format!("invalid type name '{}'", ident)));
        }
        Ok(segment.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeDescriptor {
        s.parse().unwrap()
    }

    #[test]
    fn parse_leaf() {
        assert_eq!(parse("i64"), TypeDescriptor::named("i64"));
        assert_eq!(parse("  String "), TypeDescriptor::named("String"));
    }

    #[test]
    fn parse_nested_generics() {
        assert_eq!(
            parse("HashMap<String, IndexSet<String>>"),
            TypeDescriptor::hash_map(
                TypeDescriptor::named("String"),
                TypeDescriptor::index_set(TypeDescriptor::named("String")),
            )
        );
        assert_eq!(
            parse("Option<bool>"),
            TypeDescriptor::option(TypeDescriptor::named("bool"))
        );
    }

    #[test]
    fn parse_keeps_last_path_segment() {
        assert_eq!(
            parse("std::collections::HashSet<std::string::String>"),
            TypeDescriptor::hash_set(TypeDescriptor::named("String"))
        );
    }

    #[test]
    fn display_is_canonical_and_reparses() {
        let descriptor = parse("HashMap<String,Vec< i32 >>");
        assert_eq!(descriptor.to_string(), "HashMap<String, Vec<i32>>");
        assert_eq!(parse(&descriptor.to_string()), descriptor);
    }

    #[test]
    fn depth_counts_generic_levels() {
        assert_eq!(parse("i64").depth(), 0);
        assert_eq!(parse("Vec<i64>").depth(), 1);
        assert_eq!(parse("Vec<HashSet<i64>>").depth(), 2);
    }

    #[test]
    fn parse_errors_report_position() {
        let err = "Vec<i64".parse::<TypeDescriptor>().unwrap_err();
        assert!(matches!(err, BindError::DescriptorParse { position: 7, .. }));

        let err = "Vec<>".parse::<TypeDescriptor>().unwrap_err();
        assert!(matches!(err, BindError::DescriptorParse { position: 4, .. }));

        let err = "i64 extra".parse::<TypeDescriptor>().unwrap_err();
        assert!(matches!(err, BindError::DescriptorParse { position: 4, .. }));

        assert!("".parse::<TypeDescriptor>().is_err());
        assert!("Vec<i64;>".parse::<TypeDescriptor>().is_err());
        assert!("a::".parse::<TypeDescriptor>().is_err());
    }

    #[test]
    fn very_deep_nesting_is_a_parse_error() {
        let levels = 200_000;
        let text = format!("{}i64{}", "Vec<".repeat(levels), ">".repeat(levels));
        let err = text.parse::<TypeDescriptor>().unwrap_err();
        // The first '<' past the cap: "Vec<" repeated MAX_NESTING times, then "Vec"
        let expected = 4 * MAX_NESTING + 3;
        assert!(
            matches!(err, BindError::DescriptorParse { position, .. } if position == expected),
            "got {:?}",
            err
        );
    }

    #[test]
    fn nesting_up_to_the_cap_parses() {
        let text = format!("{}i64{}", "Vec<".repeat(MAX_NESTING), ">".repeat(MAX_NESTING));
        assert_eq!(parse(&text).depth(), MAX_NESTING);
    }
}
