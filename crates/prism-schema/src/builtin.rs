//! Built-in schema documents, registered before any extension schema.
//!
//! Order matters: each document may only use types declared by itself or by
//! a document before it.

use crate::source::SchemaSource;
use crate::SchemaError;

/// Structural types: poly strings, references, paths.
pub const STRUCTURAL_SCHEMA: &str = r#"{
  "namespace": "urn:prism:types",
  "simpleTypes": [
    { "name": "PolyStringType", "primitive": "polyString", "matchingRule": "m:polyStringStrict" },
    { "name": "ObjectReferenceType", "reference": true },
    { "name": "ItemPathType", "primitive": "string" },
    { "name": "UuidType", "primitive": "string", "matchingRule": "m:uuid" }
  ]
}"#;

/// Query vocabulary.
pub const QUERY_SCHEMA: &str = r#"{
  "namespace": "urn:prism:query",
  "complexTypes": [
    {
      "name": "PagingType",
      "items": [
        { "name": "offset", "type": "xsd:int" },
        { "name": "maxSize", "type": "xsd:int" },
        { "name": "orderBy", "type": "t:ItemPathType" }
      ]
    },
    {
      "name": "FilterClauseType",
      "items": [
        { "name": "path", "type": "t:ItemPathType", "minOccurs": 1 },
        { "name": "equal", "type": "xsd:string", "maxOccurs": "unbounded" },
        { "name": "matching", "type": "xsd:QName" }
      ]
    },
    {
      "name": "QueryType",
      "items": [
        { "name": "filter", "type": "FilterClauseType", "maxOccurs": "unbounded" },
        { "name": "paging", "type": "PagingType" }
      ]
    }
  ],
  "elements": [
    { "name": "query", "type": "QueryType" }
  ]
}"#;

/// Common object types.
pub const COMMON_SCHEMA: &str = r#"{
  "namespace": "urn:prism:common",
  "complexTypes": [
    { "name": "ExtensionType" },
    {
      "name": "MetadataType",
      "items": [
        { "name": "createTimestamp", "type": "xsd:dateTime" },
        { "name": "modifyTimestamp", "type": "xsd:dateTime" },
        { "name": "creatorRef", "type": "t:ObjectReferenceType", "targetType": "c:UserType" }
      ]
    },
    {
      "name": "ActivationType",
      "items": [
        { "name": "administrativeStatus", "type": "xsd:string", "matchingRule": "m:stringIgnoreCase" },
        { "name": "validFrom", "type": "xsd:dateTime" },
        { "name": "validTo", "type": "xsd:dateTime" }
      ]
    },
    {
      "name": "AssignmentType",
      "items": [
        { "name": "description", "type": "xsd:string" },
        { "name": "targetRef", "type": "t:ObjectReferenceType" },
        { "name": "activation", "type": "ActivationType" },
        { "name": "order", "type": "xsd:int" }
      ]
    },
    {
      "name": "ObjectType",
      "object": true,
      "items": [
        { "name": "name", "type": "t:PolyStringType" },
        { "name": "description", "type": "xsd:string" },
        { "name": "metadata", "type": "MetadataType" },
        { "name": "extension", "type": "ExtensionType" }
      ]
    },
    {
      "name": "FocusType",
      "base": "ObjectType",
      "items": [
        { "name": "assignment", "type": "AssignmentType", "maxOccurs": "unbounded" },
        { "name": "linkRef", "type": "t:ObjectReferenceType", "maxOccurs": "unbounded", "targetType": "c:ShadowType" },
        { "name": "activation", "type": "ActivationType" },
        { "name": "jpegPhoto", "type": "xsd:base64Binary" }
      ]
    },
    {
      "name": "UserType",
      "base": "FocusType",
      "items": [
        { "name": "fullName", "type": "t:PolyStringType" },
        { "name": "givenName", "type": "t:PolyStringType" },
        { "name": "familyName", "type": "t:PolyStringType" },
        { "name": "additionalName", "type": "t:PolyStringType" },
        { "name": "emailAddress", "type": "xsd:string", "matchingRule": "m:emailAddress" },
        { "name": "employeeNumber", "type": "xsd:string" },
        { "name": "employeeType", "type": "xsd:string", "maxOccurs": "unbounded", "matchingRule": "m:stringIgnoreCase" },
        { "name": "organizationalUnit", "type": "t:PolyStringType", "maxOccurs": "unbounded" },
        { "name": "locality", "type": "t:PolyStringType" },
        { "name": "telephoneNumber", "type": "xsd:string" },
        { "name": "preferredLanguage", "type": "xsd:string" }
      ]
    },
    {
      "name": "RoleType",
      "base": "FocusType",
      "items": [
        { "name": "roleType", "type": "xsd:string" },
        { "name": "requestable", "type": "xsd:boolean" },
        { "name": "riskLevel", "type": "xsd:int" }
      ]
    },
    {
      "name": "ShadowType",
      "base": "ObjectType",
      "items": [
        { "name": "resourceRef", "type": "t:ObjectReferenceType", "targetType": "c:ResourceType" },
        { "name": "objectClass", "type": "xsd:QName" },
        { "name": "kind", "type": "xsd:string" },
        { "name": "dead", "type": "xsd:boolean" }
      ]
    },
    {
      "name": "ResourceType",
      "base": "ObjectType",
      "items": [
        { "name": "connectorRef", "type": "t:ObjectReferenceType" },
        { "name": "uri", "type": "xsd:anyURI" }
      ]
    }
  ],
  "elements": [
    { "name": "object", "type": "ObjectType" },
    { "name": "user", "type": "UserType" },
    { "name": "role", "type": "RoleType" },
    { "name": "shadow", "type": "ShadowType" },
    { "name": "resource", "type": "ResourceType" }
  ]
}"#;

/// Built-in sources in registration order.
pub fn builtin_sources() -> Result<Vec<SchemaSource>, SchemaError> {
    [STRUCTURAL_SCHEMA, QUERY_SCHEMA, COMMON_SCHEMA]
        .into_iter()
        .map(|text| SchemaSource::from_json(text).map_err(SchemaError::from))
        .collect()
}
