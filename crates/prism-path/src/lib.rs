//! Qualified names and item paths.
//!
//! Every addressable thing in the object model is named by a [`QName`] and
//! reached through an [`ItemPath`].
//!
//! # Example
//!
//! ```
//! use prism_path::{ItemPath, PathSegment, PrefixMap, QName};
//!
//! let prefixes = PrefixMap::new().with("c", "urn:prism:common");
//! let name = QName::parse("c:assignment", &prefixes).unwrap();
//! assert_eq!(name.to_string(), "{urn:prism:common}assignment");
//!
//! let path = ItemPath::parse("c:assignment/7/description", &prefixes).unwrap();
//! assert_eq!(path.segments()[1], PathSegment::Id(7));
//! assert_eq!(path.last_name().unwrap().local_part(), "description");
//! ```

use thiserror::Error;

pub mod item_path;
pub mod qname;
pub mod validate;

pub use item_path::{ItemPath, PathSegment};
pub use qname::{is_ncname, NamespaceResolver, NoPrefixes, PrefixMap, QName};
pub use validate::{validate_segments, MAX_PATH_LENGTH};

/// Errors from parsing or validating names and paths.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("malformed qualified name or path: {0}")]
    Malformed(String),
    #[error("unknown namespace prefix: {0}")]
    UnknownPrefix(String),
    #[error("empty path segment in: {0}")]
    EmptySegment(String),
    #[error("path too long: {0} segments")]
    PathTooLong(usize),
    #[error("id segment {0} does not follow a name")]
    MisplacedId(u64),
}
