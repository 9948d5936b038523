//! Well-known namespaces and names.

use prism_path::{PrefixMap, QName};

pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema";
pub const TYPES_NS: &str = "urn:prism:types";
pub const QUERY_NS: &str = "urn:prism:query";
pub const COMMON_NS: &str = "urn:prism:common";
pub const MATCHING_NS: &str = "urn:prism:matching";

pub const POLY_STRING_TYPE: &str = "PolyStringType";
pub const OBJECT_REFERENCE_TYPE: &str = "ObjectReferenceType";
pub const EXTENSION_TYPE: &str = "ExtensionType";

pub fn poly_string_type() -> QName {
    QName::new(TYPES_NS, POLY_STRING_TYPE)
}

pub fn object_reference_type() -> QName {
    QName::new(TYPES_NS, OBJECT_REFERENCE_TYPE)
}

pub fn extension_type() -> QName {
    QName::new(COMMON_NS, EXTENSION_TYPE)
}

/// Prefixes understood by the built-in schema documents.
pub fn default_prefixes() -> PrefixMap {
    PrefixMap::new()
        .with("xsd", XSD_NS)
        .with("t", TYPES_NS)
        .with("q", QUERY_NS)
        .with("c", COMMON_NS)
        .with("m", MATCHING_NS)
}
