//! Storebind Configuration Module
//!
//! Default binding options, stored in `~/.config/storebind/config.toml`.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Options set explicitly on a `BindingSpecBuilder`
//! 2. Environment variables (`STOREBIND_ALLOW_NULL`, `STOREBIND_FORCE_UPDATE`)
//! 3. Config file (`~/.config/storebind/config.toml`)
//! 4. Defaults (`allow_null = true`, `force_update = false`)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{BindError, Result};
use crate::value::{Scalar, ScalarKind};

pub const ENV_ALLOW_NULL: &str = "STOREBIND_ALLOW_NULL";
pub const ENV_FORCE_UPDATE: &str = "STOREBIND_FORCE_UPDATE";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StorebindConfig {
    #[serde(default)]
    pub bindings: BindingDefaults,
}

/// Options applied to every new binding unless overridden
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BindingDefaults {
    /// Bind absence as null instead of the zero value
    pub allow_null: bool,

    /// Re-read the store on every resolution
    pub force_update: bool,
}

impl Default for BindingDefaults {
    fn default() -> Self {
        Self {
            allow_null: true,
            force_update: false,
        }
    }
}

impl StorebindConfig {
    /// Returns `~/.config/storebind/` on Unix, `%APPDATA%/storebind/` on Windows
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("storebind")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load from the default path (defaults if the file doesn't exist)
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path())
    }

    /// Load from a given path
    ///
    /// Returns default config if file doesn't exist.
    /// Returns error if file exists but is malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| BindError::ConfigError {
            reason: format!("Failed to read config file: {}", e),
        })?;

        toml::from_str(&content).map_err(|e| BindError::ConfigError {
            reason: format!("Failed to parse config file: {}", e),
        })
    }

    /// Merge with environment variables
    ///
    /// Values use the boolean spellings accepted for stored values
    /// (`true`/`yes`/`1`, `false`/`no`/`0`). Empty variables are ignored.
    pub fn with_env(mut self) -> Result<Self> {
        if let Some(v) = env_bool(ENV_ALLOW_NULL)? {
            self.bindings.allow_null = v;
        }
        if let Some(v) = env_bool(ENV_FORCE_UPDATE)? {
            self.bindings.force_update = v;
        }
        Ok(self)
    }
}

fn env_bool(name: &str) -> Result<Option<bool>> {
    let Ok(raw) = std::env::var(name) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    match ScalarKind::Boolean.coerce(raw.trim()) {
        Ok(Scalar::Bool(v)) => Ok(Some(v)),
        _ => Err(BindError::ConfigError {
            reason: format!("{} must be a boolean, got '{}'", name, raw),
        }),
    }
}
