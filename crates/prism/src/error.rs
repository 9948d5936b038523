//! Error taxonomy of the object model.
//!
//! Every model or delta error carries a path trail such as
//! `assignment/3/description[1]` (item path, then the value index when one is
//! known) so the offending data can be located without re-parsing.

use std::fmt::Display;

use prism_path::{ItemPath, NameError};
use prism_schema::SchemaError;
use prism_util::CloneError;
use thiserror::Error;

use crate::matching::MatchingError;

#[derive(Debug, Error)]
pub enum PrismError {
    /// Structure does not fit the bound definition: cardinality, unknown key,
    /// unresolvable path.
    #[error("schema violation at '{path}': {message}")]
    SchemaViolation { path: String, message: String },
    /// A scalar cannot be converted to the target primitive type.
    #[error("type mismatch at '{path}': expected {expected}, got {raw}")]
    TypeMismatch {
        path: String,
        expected: String,
        raw: String,
    },
    /// A name or type was not found in a registry.
    #[error("unresolved reference at '{path}': {name}")]
    UnresolvedReference { path: String, name: String },
    /// An add/modify/delete combination violates object lifecycle or
    /// internal consistency.
    #[error("illegal delta state at '{path}': {message}")]
    IllegalDeltaState { path: String, message: String },
    #[error("illegal argument: {0}")]
    IllegalArgument(String),
    #[error(transparent)]
    Matching(#[from] MatchingError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Name(#[from] NameError),
    #[error(transparent)]
    Clone(#[from] CloneError),
    #[error("codec error: {0}")]
    Codec(#[from] serde_json::Error),
    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = PrismError> = std::result::Result<T, E>;

impl PrismError {
    pub fn violation(path: impl Display, message: impl Into<String>) -> Self {
        PrismError::SchemaViolation {
            path: path.to_string(),
            message: message.into(),
        }
    }

    pub fn mismatch(path: impl Display, expected: impl Display, raw: impl Display) -> Self {
        PrismError::TypeMismatch {
            path: path.to_string(),
            expected: expected.to_string(),
            raw: raw.to_string(),
        }
    }

    pub fn unresolved(path: impl Display, name: impl Display) -> Self {
        PrismError::UnresolvedReference {
            path: path.to_string(),
            name: name.to_string(),
        }
    }

    pub fn illegal_delta(path: impl Display, message: impl Into<String>) -> Self {
        PrismError::IllegalDeltaState {
            path: path.to_string(),
            message: message.into(),
        }
    }

    /// The path trail, for the variants that carry one.
    pub fn path(&self) -> Option<&str> {
        match self {
            PrismError::SchemaViolation { path, .. }
            | PrismError::TypeMismatch { path, .. }
            | PrismError::UnresolvedReference { path, .. }
            | PrismError::IllegalDeltaState { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Formats a value position: `path[index]`.
pub fn value_trail(path: &ItemPath, index: usize) -> String {
    format!("{path}[{index}]")
}
