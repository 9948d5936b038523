//! Typed scalar values and their parsers.

use std::fmt;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use prism_path::{NamespaceResolver, QName};
use prism_schema::PrimitiveType;

use super::poly_string::{Normalizer, PolyString};
use crate::xnode::RawValue;

/// A parsed property value.
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveValue {
    String(String),
    Integer(i64),
    Double(f64),
    Boolean(bool),
    DateTime(DateTime<FixedOffset>),
    Binary(Vec<u8>),
    QName(QName),
    PolyString(PolyString),
}

impl PrimitiveValue {
    pub fn primitive_type(&self) -> PrimitiveType {
        match self {
            PrimitiveValue::String(_) => PrimitiveType::String,
            PrimitiveValue::Integer(_) => PrimitiveType::Integer,
            PrimitiveValue::Double(_) => PrimitiveType::Double,
            PrimitiveValue::Boolean(_) => PrimitiveType::Boolean,
            PrimitiveValue::DateTime(_) => PrimitiveType::DateTime,
            PrimitiveValue::Binary(_) => PrimitiveType::Binary,
            PrimitiveValue::QName(_) => PrimitiveType::QName,
            PrimitiveValue::PolyString(_) => PrimitiveType::PolyString,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            PrimitiveValue::String(s) => Some(s),
            PrimitiveValue::PolyString(p) => Some(p.orig()),
            _ => None,
        }
    }

    pub fn as_poly_string(&self) -> Option<&PolyString> {
        match self {
            PrimitiveValue::PolyString(p) => Some(p),
            _ => None,
        }
    }

    /// Parses a raw scalar as `ty`.
    ///
    /// On failure returns the raw spelling, for the caller to wrap into a
    /// type mismatch with its own path trail.
    pub fn parse(
        raw: &RawValue,
        ty: PrimitiveType,
        normalizer: &dyn Normalizer,
        resolver: &dyn NamespaceResolver,
    ) -> Result<Self, String> {
        let fail = || raw.to_string();
        let text = raw.as_text().ok_or_else(fail)?;
        Ok(match ty {
            PrimitiveType::String => PrimitiveValue::String(text.to_string()),
            PrimitiveType::Integer => {
                PrimitiveValue::Integer(text.trim().parse().map_err(|_| fail())?)
            }
            PrimitiveType::Double => {
                PrimitiveValue::Double(text.trim().parse().map_err(|_| fail())?)
            }
            PrimitiveType::Boolean => match (raw, text) {
                (RawValue::Boolean(b), _) => PrimitiveValue::Boolean(*b),
                (RawValue::Text(_), "true" | "1") => PrimitiveValue::Boolean(true),
                (RawValue::Text(_), "false" | "0") => PrimitiveValue::Boolean(false),
                _ => return Err(fail()),
            },
            PrimitiveType::DateTime => PrimitiveValue::DateTime(
                DateTime::parse_from_rfc3339(text.trim()).map_err(|_| fail())?,
            ),
            PrimitiveType::Binary => {
                PrimitiveValue::Binary(STANDARD.decode(text.trim()).map_err(|_| fail())?)
            }
            PrimitiveType::QName => {
                PrimitiveValue::QName(QName::parse(text, resolver).map_err(|_| fail())?)
            }
            PrimitiveType::PolyString => {
                PrimitiveValue::PolyString(PolyString::new(text, normalizer))
            }
        })
    }

    /// The raw scalar spelling. PolyStrings give their `orig`.
    pub fn to_raw(&self) -> RawValue {
        match self {
            PrimitiveValue::String(s) => RawValue::Text(s.clone()),
            PrimitiveValue::Integer(i) => RawValue::Number(i.to_string()),
            PrimitiveValue::Double(d) => RawValue::Number(format_double(*d)),
            PrimitiveValue::Boolean(b) => RawValue::Boolean(*b),
            PrimitiveValue::DateTime(dt) => {
                RawValue::Text(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            PrimitiveValue::Binary(bytes) => RawValue::Text(STANDARD.encode(bytes)),
            PrimitiveValue::QName(q) => RawValue::Text(q.to_string()),
            PrimitiveValue::PolyString(p) => RawValue::Text(p.orig().to_string()),
        }
    }
}

fn format_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{d:.1}")
    } else {
        d.to_string()
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrimitiveValue::PolyString(p) => write!(f, "{p}"),
            other => match other.to_raw() {
                RawValue::Text(s) | RawValue::Number(s) => f.write_str(&s),
                RawValue::Boolean(b) => write!(f, "{b}"),
                RawValue::Null => f.write_str("null"),
            },
        }
    }
}

impl From<&str> for PrimitiveValue {
    fn from(s: &str) -> Self {
        PrimitiveValue::String(s.to_string())
    }
}

impl From<String> for PrimitiveValue {
    fn from(s: String) -> Self {
        PrimitiveValue::String(s)
    }
}

impl From<i64> for PrimitiveValue {
    fn from(i: i64) -> Self {
        PrimitiveValue::Integer(i)
    }
}

impl From<bool> for PrimitiveValue {
    fn from(b: bool) -> Self {
        PrimitiveValue::Boolean(b)
    }
}

impl From<PolyString> for PrimitiveValue {
    fn from(p: PolyString) -> Self {
        PrimitiveValue::PolyString(p)
    }
}
