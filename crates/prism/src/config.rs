//! Runtime configuration.
//!
//! Every field has a default, so an empty document is a valid configuration.
//!
//! ```
//! use prism::config::{DiffMode, PrismConfig};
//!
//! let config = PrismConfig::from_toml_str(r#"
//!     [diff]
//!     multi_valued = "replace"
//!
//!     [binding]
//!     raw_passthrough = true
//! "#).unwrap();
//! assert_eq!(config.diff.multi_valued, DiffMode::Replace);
//! assert_eq!(config.diff.single_valued, DiffMode::Replace);
//! assert!(config.binding.raw_passthrough);
//! ```

use std::path::Path;

use prism_path::PrefixMap;
use prism_schema::constants::{default_prefixes, COMMON_NS};
use serde::{Deserialize, Serialize};

use crate::error::{PrismError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrismConfig {
    pub diff: DiffPolicy,
    pub binding: BindingConfig,
    pub normalizer: NormalizerOptions,
    pub codec: CodecConfig,
}

impl PrismConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Loads a `.toml` or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml_str(&text),
            Some("json") => Self::from_json_str(&text),
            other => Err(PrismError::IllegalArgument(format!(
                "unsupported config format: {}",
                other.unwrap_or("<none>")
            ))),
        }
    }
}

/// How a changed item is expressed in a computed delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffMode {
    /// One replace carrying the full new value set.
    Replace,
    /// Deletes for values only in the old object, adds for values only in
    /// the new one.
    AddDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffPolicy {
    pub single_valued: DiffMode,
    pub multi_valued: DiffMode,
    /// Recurse into container values paired by id or equivalence instead of
    /// replacing them whole.
    pub recurse_containers: bool,
}

impl Default for DiffPolicy {
    fn default() -> Self {
        Self {
            single_valued: DiffMode::Replace,
            multi_valued: DiffMode::AddDelete,
            recurse_containers: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BindingConfig {
    /// Keep undeclared keys as raw property values instead of failing.
    pub raw_passthrough: bool,
    /// Emit PolyStrings as `{orig, norm}` maps; otherwise as plain `orig`.
    pub emit_norm: bool,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            raw_passthrough: false,
            emit_norm: true,
        }
    }
}

/// Steps of the default PolyString normalizer, applied in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerOptions {
    pub strip_accents: bool,
    pub lowercase: bool,
    pub ascii_only: bool,
    pub collapse_whitespace: bool,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            strip_accents: true,
            lowercase: true,
            ascii_only: true,
            collapse_whitespace: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Prefixes used to shorten keys in encoded documents.
    pub prefixes: PrefixMap,
    /// Keys in this namespace are written without a prefix.
    pub default_namespace: Option<String>,
    pub pretty: bool,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            default_namespace: Some(COMMON_NS.to_string()),
            pretty: true,
        }
    }
}
