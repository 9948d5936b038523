//! Changes to one object.

use prism_path::{ItemPath, QName};

use super::item_delta::ItemDelta;
use crate::model::PrismObject;

/// A whole-object change.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectDelta {
    /// Create the object.
    Add(Box<PrismObject>),
    /// Change items of an existing object.
    Modify {
        oid: String,
        type_name: QName,
        modifications: Vec<ItemDelta>,
    },
    /// Remove the object.
    Delete { oid: String, type_name: QName },
}

impl ObjectDelta {
    pub fn add(object: PrismObject) -> Self {
        ObjectDelta::Add(Box::new(object))
    }

    pub fn modify(oid: impl Into<String>, type_name: QName, modifications: Vec<ItemDelta>) -> Self {
        ObjectDelta::Modify {
            oid: oid.into(),
            type_name,
            modifications,
        }
    }

    pub fn delete(oid: impl Into<String>, type_name: QName) -> Self {
        ObjectDelta::Delete {
            oid: oid.into(),
            type_name,
        }
    }

    /// `add`, `modify` or `delete`.
    pub fn change_type(&self) -> &'static str {
        match self {
            ObjectDelta::Add(_) => "add",
            ObjectDelta::Modify { .. } => "modify",
            ObjectDelta::Delete { .. } => "delete",
        }
    }

    pub fn is_add(&self) -> bool {
        matches!(self, ObjectDelta::Add(_))
    }

    pub fn is_modify(&self) -> bool {
        matches!(self, ObjectDelta::Modify { .. })
    }

    pub fn is_delete(&self) -> bool {
        matches!(self, ObjectDelta::Delete { .. })
    }

    /// The target OID. An add of an object without one has none.
    pub fn oid(&self) -> Option<&str> {
        match self {
            ObjectDelta::Add(object) => object.oid(),
            ObjectDelta::Modify { oid, .. } | ObjectDelta::Delete { oid, .. } => Some(oid),
        }
    }

    pub fn type_name(&self) -> &QName {
        match self {
            ObjectDelta::Add(object) => object.type_name(),
            ObjectDelta::Modify { type_name, .. } | ObjectDelta::Delete { type_name, .. } => {
                type_name
            }
        }
    }

    pub fn modifications(&self) -> &[ItemDelta] {
        match self {
            ObjectDelta::Modify { modifications, .. } => modifications,
            _ => &[],
        }
    }

    /// The first item delta addressing exactly `path`.
    pub fn find_item_delta(&self, path: &ItemPath) -> Option<&ItemDelta> {
        self.modifications()
            .iter()
            .find(|d| d.path().equivalent(path))
    }

    /// A modify that changes nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            ObjectDelta::Modify { modifications, .. } => modifications.iter().all(ItemDelta::is_empty),
            _ => false,
        }
    }
}
