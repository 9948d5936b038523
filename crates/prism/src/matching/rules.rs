//! Built-in matching rules.

use std::sync::Arc;

use prism_path::QName;
use prism_schema::constants::MATCHING_NS;
use prism_schema::PrimitiveType;

use super::{MatchingError, MatchingRule};
use crate::value::PrimitiveValue;

fn rule_name(local: &str) -> QName {
    QName::new(MATCHING_NS, local)
}

/// Exact comparison.
#[derive(Debug)]
pub struct DefaultRule {
    name: QName,
}

impl Default for DefaultRule {
    fn default() -> Self {
        Self {
            name: rule_name("default"),
        }
    }
}

impl MatchingRule for DefaultRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, _ty: PrimitiveType) -> bool {
        true
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        Ok(value.clone())
    }

    fn matches(&self, a: &PrimitiveValue, b: &PrimitiveValue) -> Result<bool, MatchingError> {
        Ok(a == b)
    }
}

/// Case-insensitive strings.
#[derive(Debug)]
pub struct StringIgnoreCaseRule {
    name: QName,
}

impl Default for StringIgnoreCaseRule {
    fn default() -> Self {
        Self {
            name: rule_name("stringIgnoreCase"),
        }
    }
}

impl MatchingRule for StringIgnoreCaseRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, ty: PrimitiveType) -> bool {
        ty == PrimitiveType::String
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        match value {
            PrimitiveValue::String(s) => Ok(PrimitiveValue::String(s.to_lowercase())),
            other => Err(MatchingError::unsupported(&self.name, other)),
        }
    }
}

/// Both `orig` and `norm` must agree.
#[derive(Debug)]
pub struct PolyStringStrictRule {
    name: QName,
}

impl Default for PolyStringStrictRule {
    fn default() -> Self {
        Self {
            name: rule_name("polyStringStrict"),
        }
    }
}

impl MatchingRule for PolyStringStrictRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, ty: PrimitiveType) -> bool {
        ty == PrimitiveType::PolyString
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        match value {
            PrimitiveValue::PolyString(_) => Ok(value.clone()),
            other => Err(MatchingError::unsupported(&self.name, other)),
        }
    }
}

/// Only `orig` is compared.
#[derive(Debug)]
pub struct PolyStringOrigRule {
    name: QName,
}

impl Default for PolyStringOrigRule {
    fn default() -> Self {
        Self {
            name: rule_name("polyStringOrig"),
        }
    }
}

impl MatchingRule for PolyStringOrigRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, ty: PrimitiveType) -> bool {
        ty == PrimitiveType::PolyString
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        match value {
            PrimitiveValue::PolyString(p) => Ok(PrimitiveValue::String(p.orig().to_string())),
            other => Err(MatchingError::unsupported(&self.name, other)),
        }
    }
}

/// Only `norm` is compared; variants differing in case or accents unify.
#[derive(Debug)]
pub struct PolyStringNormRule {
    name: QName,
}

impl Default for PolyStringNormRule {
    fn default() -> Self {
        Self {
            name: rule_name("polyStringNorm"),
        }
    }
}

impl MatchingRule for PolyStringNormRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, ty: PrimitiveType) -> bool {
        ty == PrimitiveType::PolyString
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        match value {
            PrimitiveValue::PolyString(p) => Ok(PrimitiveValue::String(p.norm().to_string())),
            other => Err(MatchingError::unsupported(&self.name, other)),
        }
    }
}

/// UUID text, ignoring case and hyphens. Anything that is not 32 hex
/// digits fails to normalize.
#[derive(Debug)]
pub struct UuidRule {
    name: QName,
}

impl Default for UuidRule {
    fn default() -> Self {
        Self {
            name: rule_name("uuid"),
        }
    }
}

impl MatchingRule for UuidRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, ty: PrimitiveType) -> bool {
        ty == PrimitiveType::String
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        let PrimitiveValue::String(s) = value else {
            return Err(MatchingError::unsupported(&self.name, value));
        };
        let digits: String = s
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if digits.len() != 32 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MatchingError::new(&self.name, value, "not a UUID"));
        }
        Ok(PrimitiveValue::String(digits))
    }
}

/// E-mail addresses: the domain part is case-insensitive, the local part
/// is compared verbatim.
#[derive(Debug)]
pub struct EmailAddressRule {
    name: QName,
}

impl Default for EmailAddressRule {
    fn default() -> Self {
        Self {
            name: rule_name("emailAddress"),
        }
    }
}

impl MatchingRule for EmailAddressRule {
    fn name(&self) -> &QName {
        &self.name
    }

    fn supports(&self, ty: PrimitiveType) -> bool {
        ty == PrimitiveType::String
    }

    fn normalize(&self, value: &PrimitiveValue) -> Result<PrimitiveValue, MatchingError> {
        let PrimitiveValue::String(s) = value else {
            return Err(MatchingError::unsupported(&self.name, value));
        };
        let s = s.trim();
        Ok(PrimitiveValue::String(match s.rsplit_once('@') {
            Some((local, domain)) => format!("{local}@{}", domain.to_lowercase()),
            None => s.to_string(),
        }))
    }
}

/// Every built-in rule, default first.
pub fn builtin_rules() -> Vec<Arc<dyn MatchingRule>> {
    vec![
        Arc::new(DefaultRule::default()),
        Arc::new(StringIgnoreCaseRule::default()),
        Arc::new(PolyStringStrictRule::default()),
        Arc::new(PolyStringOrigRule::default()),
        Arc::new(PolyStringNormRule::default()),
        Arc::new(UuidRule::default()),
        Arc::new(EmailAddressRule::default()),
    ]
}
