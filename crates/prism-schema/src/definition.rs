//! Resolved definitions, as held by the registry.
//!
//! These are produced from [`crate::source`] documents during registration.
//! Item kinds and inherited items are already resolved, so consumers never
//! need to chase base types themselves.

use std::fmt;
use std::sync::Arc;

use prism_path::QName;
use prism_util::{CloneStrategy, Cloneable};
use serde::{Deserialize, Serialize};

use crate::constants::XSD_NS;

/// The scalar value types a property can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PrimitiveType {
    String,
    Integer,
    Double,
    Boolean,
    DateTime,
    Binary,
    #[serde(rename = "qname")]
    QName,
    PolyString,
}

impl PrimitiveType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::QName => "qname",
            Self::PolyString => "polyString",
        }
    }

    /// Resolves an XML Schema built-in type name.
    pub fn from_xsd(name: &QName) -> Option<Self> {
        if name.namespace() != Some(XSD_NS) {
            return None;
        }
        Some(match name.local_part() {
            "string" | "anyURI" | "token" | "normalizedString" => Self::String,
            "int" | "integer" | "long" | "short" | "byte" | "nonNegativeInteger" => Self::Integer,
            "double" | "float" | "decimal" => Self::Double,
            "boolean" => Self::Boolean,
            "dateTime" => Self::DateTime,
            "base64Binary" => Self::Binary,
            "QName" => Self::QName,
            _ => return None,
        })
    }

    /// The canonical XML Schema type name for this primitive.
    pub fn xsd_name(self) -> Option<QName> {
        let local = match self {
            Self::String => "string",
            Self::Integer => "long",
            Self::Double => "double",
            Self::Boolean => "boolean",
            Self::DateTime => "dateTime",
            Self::Binary => "base64Binary",
            Self::QName => "QName",
            Self::PolyString => return None,
        };
        Some(QName::new(XSD_NS, local))
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper multiplicity bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Occurs {
    Bounded(u32),
    Unbounded,
}

impl Occurs {
    pub fn allows(self, count: usize) -> bool {
        match self {
            Occurs::Bounded(max) => count <= max as usize,
            Occurs::Unbounded => true,
        }
    }
}

impl fmt::Display for Occurs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Occurs::Bounded(n) => write!(f, "{n}"),
            Occurs::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// What kind of values an item holds.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Property { primitive: PrimitiveType },
    Reference { target_type: Option<QName> },
    Container,
}

impl ItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            ItemKind::Property { .. } => "property",
            ItemKind::Reference { .. } => "reference",
            ItemKind::Container => "container",
        }
    }
}

/// Definition of one named item inside a complex type, or of a global
/// element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemDefinition {
    pub name: QName,
    pub type_name: QName,
    pub kind: ItemKind,
    pub min_occurs: u32,
    pub max_occurs: Occurs,
    /// Explicit rule, or the default declared by the item's simple type.
    pub matching_rule: Option<QName>,
}

impl ItemDefinition {
    pub fn is_single_valued(&self) -> bool {
        self.max_occurs == Occurs::Bounded(1)
    }

    pub fn is_multi_valued(&self) -> bool {
        !self.is_single_valued()
    }

    pub fn is_mandatory(&self) -> bool {
        self.min_occurs > 0
    }

    pub fn primitive(&self) -> Option<PrimitiveType> {
        match self.kind {
            ItemKind::Property { primitive } => Some(primitive),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        matches!(self.kind, ItemKind::Container)
    }
}

/// A structured type: an ordered list of item definitions.
///
/// `items` is flattened: inherited items come first, in base-type order,
/// followed by the type's own items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexTypeDefinition {
    pub name: QName,
    pub base: Option<QName>,
    /// Base chain, nearest first.
    pub ancestors: Vec<QName>,
    /// Object types are roots carrying an OID and version.
    pub object: bool,
    /// Extension item types receiving items from extension schemas.
    pub extension_of: Option<QName>,
    pub items: Vec<Arc<ItemDefinition>>,
}

impl ComplexTypeDefinition {
    /// Namespace-aware item lookup.
    pub fn find_item(&self, name: &QName) -> Option<&Arc<ItemDefinition>> {
        self.items
            .iter()
            .find(|d| d.name == *name)
            .or_else(|| self.items.iter().find(|d| d.name.matches(name)))
    }

    /// Declaration position of an item, used for stable output ordering.
    pub fn item_position(&self, name: &QName) -> Option<usize> {
        self.items
            .iter()
            .position(|d| d.name == *name)
            .or_else(|| self.items.iter().position(|d| d.name.matches(name)))
    }

    /// True if this type is `other` or derives from it.
    pub fn is_a(&self, other: &QName) -> bool {
        self.name == *other || self.ancestors.iter().any(|a| a == other)
    }
}

/// A named scalar type with an optional default matching rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimpleTypeDefinition {
    pub name: QName,
    pub kind: ItemKind,
    pub matching_rule: Option<QName>,
}

/// Anything the registry can return for a type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Definition {
    Complex(Arc<ComplexTypeDefinition>),
    Simple(Arc<SimpleTypeDefinition>),
}

impl Definition {
    pub fn name(&self) -> &QName {
        match self {
            Definition::Complex(c) => &c.name,
            Definition::Simple(s) => &s.name,
        }
    }

    pub fn as_complex(&self) -> Option<&Arc<ComplexTypeDefinition>> {
        match self {
            Definition::Complex(c) => Some(c),
            Definition::Simple(_) => None,
        }
    }
}

impl Cloneable for Definition {
    fn strategy(&self) -> CloneStrategy {
        CloneStrategy::Immutable
    }

    fn self_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}
