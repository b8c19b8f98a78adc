//! Error types with fix suggestions
//!
//! Error code ranges:
//! - BIND-000-009: Registration errors (descriptor, shape, binding options)
//! - BIND-010-019: Coercion errors (format, range)
//! - BIND-020-029: Assembly errors (shape/representation mismatch)
//! - BIND-030-039: Store errors
//! - BIND-040-049: Config/IO errors

use std::sync::Arc;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, BindError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

/// All error variants are part of the public API.
///
/// Cloneable so one failed resolution can be handed to every caller waiting on it.
#[derive(Error, Debug, Clone)]
pub enum BindError {
    // ─────────────────────────────────────────────────────────────
    // Registration errors (BIND-000 to BIND-009)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-001] Unsupported target type '{descriptor}': {reason}")]
    UnsupportedShape { descriptor: String, reason: String },

    #[error("[BIND-002] Type descriptor parse error at position {position}: {details}")]
    DescriptorParse { position: usize, details: String },

    #[error("[BIND-003] Invalid binding '{binding}': {reason}")]
    InvalidBinding { binding: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Coercion errors (BIND-010 to BIND-019)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-010] Cannot convert '{text}' to {kind}")]
    FormatError { kind: String, text: String },

    #[error("[BIND-011] Value '{text}' is out of range for {kind}")]
    RangeError { kind: String, text: String },

    // ─────────────────────────────────────────────────────────────
    // Assembly errors (BIND-020 to BIND-029)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-020] Key '{key}' holds {representation}, which cannot fill {shape}")]
    ShapeMismatch {
        key: String,
        shape: String,
        representation: String,
    },

    #[error("[BIND-021] Cannot bind {found} into {target}")]
    TypeMismatch { target: String, found: String },

    // ─────────────────────────────────────────────────────────────
    // Store errors (BIND-030 to BIND-039)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-030] Store unavailable while reading '{key}': {reason}")]
    StoreUnavailable { key: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Config/IO errors (BIND-040 to BIND-049)
    // ─────────────────────────────────────────────────────────────
    #[error("[BIND-040] Configuration error: {reason}")]
    ConfigError { reason: String },

    #[error("[BIND-041] JSON error: {0}")]
    Json(#[source] Arc<serde_json::Error>),

    #[error("[BIND-042] IO error: {0}")]
    Io(#[source] Arc<std::io::Error>),
}

impl From<serde_json::Error> for BindError {
    fn from(err: serde_json::Error) -> Self {
        BindError::Json(Arc::new(err))
    }
}

impl From<std::io::Error> for BindError {
    fn from(err: std::io::Error) -> Self {
        BindError::Io(Arc::new(err))
    }
}

impl BindError {
    /// Build a store error from any client-side failure
    pub fn store(key: &str, reason: impl std::fmt::Display) -> Self {
        BindError::StoreUnavailable {
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }

    /// True for errors raised while converting stored data (never cached)
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            BindError::FormatError { .. }
                | BindError::RangeError { .. }
                | BindError::ShapeMismatch { .. }
                | BindError::TypeMismatch { .. }
        )
    }
}

impl FixSuggestion for BindError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            BindError::UnsupportedShape { .. } => Some(
                "Use a scalar, Option<scalar>, Vec/HashSet/IndexSet of scalars, \
                 or one container level inside Vec/HashSet/IndexSet/HashMap<String, _>",
            ),
            BindError::DescriptorParse { .. } => {
                Some("Check descriptor syntax, e.g. Vec<i64> or HashMap<String, IndexSet<String>>")
            }
            BindError::InvalidBinding { .. } => Some(
                "Use Option<_> for nullable scalars, set allow_null(false), \
                 or give the binding a default of the declared type",
            ),
            BindError::FormatError { .. } => {
                Some("Fix the stored value or change the binding's target type")
            }
            BindError::RangeError { .. } => {
                Some("Use a wider integer type (i64 or BigInt) for this binding")
            }
            BindError::ShapeMismatch { .. } => {
                Some("Check the key holds the store representation the target type expects")
            }
            BindError::TypeMismatch { .. } => {
                Some("Bind into the Rust type matching the binding's declared target type")
            }
            BindError::StoreUnavailable { .. } => Some("Check the store connection and retry"),
            BindError::ConfigError { .. } => {
                Some("Check ~/.config/storebind/config.toml syntax")
            }
            BindError::Json(_) => {
                Some("Ensure the snapshot file and --default value are valid JSON")
            }
            BindError::Io(_) => Some("Check file path and permissions"),
        }
    }
}
