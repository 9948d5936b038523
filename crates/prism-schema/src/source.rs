//! Schema source documents.
//!
//! A [`SchemaSource`] is the unresolved, serializable description of one
//! schema: a target namespace, its prefixes, and simple types, complex types
//! and global elements in declaration order. Names are kept as text and only
//! resolved when the source is registered.
//!
//! ```
//! use prism_schema::SchemaSource;
//!
//! let source = SchemaSource::from_json(r#"{
//!     "namespace": "urn:example:ext",
//!     "complexTypes": [{
//!         "name": "ShipType",
//!         "items": [{ "name": "name", "type": "xsd:string" }]
//!     }]
//! }"#).unwrap();
//! assert_eq!(source.complex_types.len(), 1);
//! ```

use prism_path::PrefixMap;
use serde::{Deserialize, Serialize};

use crate::definition::PrimitiveType;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSource {
    /// Target namespace; unprefixed names declared here belong to it.
    pub namespace: String,
    /// Extra prefixes; the built-in ones (`xsd`, `t`, `q`, `c`, `m`) are
    /// always available.
    #[serde(default)]
    pub prefixes: PrefixMap,
    #[serde(default)]
    pub simple_types: Vec<SimpleTypeSource>,
    #[serde(default)]
    pub complex_types: Vec<ComplexTypeSource>,
    #[serde(default)]
    pub elements: Vec<ElementSource>,
}

impl SchemaSource {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Self::default()
        }
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleTypeSource {
    pub name: String,
    /// Scalar type; `None` together with `reference: true` declares a
    /// reference type.
    #[serde(default)]
    pub primitive: Option<PrimitiveType>,
    #[serde(default)]
    pub reference: bool,
    #[serde(default)]
    pub matching_rule: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplexTypeSource {
    pub name: String,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub object: bool,
    /// Object type whose `extension` container receives these items.
    #[serde(default)]
    pub extension_of: Option<String>,
    #[serde(default)]
    pub items: Vec<ItemSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSource {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub min_occurs: u32,
    #[serde(default)]
    pub max_occurs: MaxOccursSource,
    #[serde(default)]
    pub matching_rule: Option<String>,
    /// Declared target type of a reference item.
    #[serde(default)]
    pub target_type: Option<String>,
}

/// `maxOccurs`: a count or the keyword `"unbounded"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MaxOccursSource {
    Count(u32),
    Keyword(String),
}

impl Default for MaxOccursSource {
    fn default() -> Self {
        MaxOccursSource::Count(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSource {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}
