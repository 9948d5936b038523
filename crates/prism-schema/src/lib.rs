//! Schema definitions and the registry that serves them.
//!
//! Schemas are described by [`SchemaSource`] documents (JSON or built with
//! [`SchemaSourceBuilder`]) and registered into a [`SchemaRegistry`], which
//! resolves names, flattens inheritance and exposes immutable
//! [`SchemaSnapshot`]s for lookup.
//!
//! ```
//! use prism_path::QName;
//! use prism_schema::{constants::COMMON_NS, SchemaRegistry};
//!
//! let registry = SchemaRegistry::bootstrap(Vec::new()).unwrap();
//! let user = registry
//!     .find_type_definition(&QName::new(COMMON_NS, "UserType"))
//!     .unwrap();
//! assert!(user.as_complex().unwrap().object);
//! ```

use prism_path::{NameError, QName};
use thiserror::Error;

pub mod builder;
pub mod builtin;
pub mod constants;
pub mod definition;
pub mod registry;
pub mod source;

pub use builder::{ComplexTypeBuilder, SchemaSourceBuilder};
pub use definition::{
    ComplexTypeDefinition, Definition, ItemDefinition, ItemKind, Occurs, PrimitiveType,
    SimpleTypeDefinition,
};
pub use registry::{SchemaRegistry, SchemaSnapshot};
pub use source::{
    ComplexTypeSource, ElementSource, ItemSource, MaxOccursSource, SchemaSource, SimpleTypeSource,
};

/// Errors raised while registering schema sources.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema source has no target namespace")]
    MissingNamespace,
    #[error("type {0} is already defined")]
    DuplicateType(QName),
    #[error("element {0} is already defined")]
    DuplicateElement(QName),
    #[error("item {item} is declared twice in {type_name}")]
    DuplicateItem { type_name: QName, item: QName },
    #[error("{context}: unresolved type {type_name}")]
    UnresolvedType { context: QName, type_name: QName },
    #[error("{type_name}: unresolved base type {base}")]
    UnresolvedBase { type_name: QName, base: QName },
    #[error("extension target {0} is not a registered object type")]
    UnresolvedExtensionTarget(QName),
    #[error("simple type {0} must declare exactly one of primitive or reference")]
    InvalidSimpleType(QName),
    #[error("item {item}: invalid occurrence bound {value}")]
    InvalidOccurs { item: QName, value: String },
    #[error(transparent)]
    Name(#[from] NameError),
    #[error("invalid schema source: {0}")]
    Source(#[from] serde_json::Error),
}
