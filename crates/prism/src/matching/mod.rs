//! Matching rules: named equality and normalization strategies.
//!
//! A rule must satisfy `matches(a, b) == (normalize(a) == normalize(b))`.
//! The provided [`MatchingRule::matches`] holds by construction; rules that
//! override it for speed must keep the equivalence.

mod registry;
mod rules;

use std::fmt;

use prism_path::QName;
use prism_schema::PrimitiveType;
use thiserror::Error;

use crate::value::PrimitiveValue;

pub use registry::MatchingRuleRegistry;
pub use rules::{
    builtin_rules, DefaultRule, EmailAddressRule, PolyStringNormRule, PolyStringOrigRule,
    PolyStringStrictRule, StringIgnoreCaseRule, UuidRule,
};

/// A value a rule cannot normalize.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("matching rule {rule} cannot normalize {value}: {reason}")]
pub struct MatchingError {
    pub rule: QName,
    pub value: String,
    pub reason: String,
}

impl MatchingError {
    pub fn new(rule: &QName, value: &PrimitiveValue, reason: impl Into<String>) -> Self {
        Self {
            rule: rule.clone(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(rule: &QName, value: &PrimitiveValue) -> Self {
        Self::new(
            rule,
            value,
            format!("unsupported type {}", value.primitive_type()),
        )
    }
}

pub trait MatchingRule: Send + Sync + fmt::Debug {
    fn name(&self) -> &QName;

    fn supports(&self, ty: PrimitiveType) -> bool;

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError>;

    fn matches(&self, a: &PrimitiveValue, b: &PrimitiveValue) -> Result<bool, MatchingError> {
        Ok(self.normalize(a)? == self.normalize(b)?)
    }
}
