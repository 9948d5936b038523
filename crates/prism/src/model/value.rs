//! The three kinds of item values.

use std::sync::{Arc, Weak};

use prism_path::QName;
use prism_util::unordered_eq;

use super::item::Item;
use super::object::PrismObject;
use crate::error::{PrismError, Result};
use crate::value::{PolyString, PrimitiveValue};
use crate::xnode::XNode;

/// A property value: a parsed scalar, or an untyped subtree kept verbatim
/// when raw passthrough is enabled.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    Primitive(PrimitiveValue),
    Raw(XNode),
}

impl PropertyValue {
    pub fn as_primitive(&self) -> Option<&PrimitiveValue> {
        match self {
            PropertyValue::Primitive(p) => Some(p),
            PropertyValue::Raw(_) => None,
        }
    }
}

impl From<PrimitiveValue> for PropertyValue {
    fn from(v: PrimitiveValue) -> Self {
        PropertyValue::Primitive(v)
    }
}

/// A link to another object by OID.
///
/// The resolved target may be cached, but only as a [`Weak`] handle: a
/// reference never keeps its target alive.
#[derive(Debug, Clone, Default)]
pub struct ReferenceValue {
    oid: String,
    target_type: Option<QName>,
    relation: Option<QName>,
    resolved: Weak<PrismObject>,
}

impl ReferenceValue {
    pub fn new(oid: impl Into<String>) -> Self {
        Self {
            oid: oid.into(),
            ..Self::default()
        }
    }

    pub fn with_target_type(mut self, target_type: QName) -> Self {
        self.target_type = Some(target_type);
        self
    }

    pub fn with_relation(mut self, relation: QName) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn oid(&self) -> &str {
        &self.oid
    }

    pub fn target_type(&self) -> Option<&QName> {
        self.target_type.as_ref()
    }

    pub fn relation(&self) -> Option<&QName> {
        self.relation.as_ref()
    }

    /// The cached target, if it is still alive.
    pub fn resolved(&self) -> Option<Arc<PrismObject>> {
        self.resolved.upgrade()
    }

    pub fn set_resolved(&mut self, target: &Arc<PrismObject>) {
        self.resolved = Arc::downgrade(target);
    }

    pub fn clear_resolved(&mut self) {
        self.resolved = Weak::new();
    }

    /// Returns the cached target, or looks it up by OID and caches the
    /// result weakly.
    pub fn resolve_with<F>(&mut self, lookup: F) -> Option<Arc<PrismObject>>
    where
        F: FnOnce(&str) -> Option<Arc<PrismObject>>,
    {
        if let Some(target) = self.resolved.upgrade() {
            return Some(target);
        }
        let target = lookup(&self.oid)?;
        self.resolved = Arc::downgrade(&target);
        Some(target)
    }
}

/// Equality ignores the resolution cache.
impl PartialEq for ReferenceValue {
    fn eq(&self, other: &Self) -> bool {
        self.oid == other.oid
            && self.target_type == other.target_type
            && self.relation == other.relation
    }
}

/// A structured value: an ordered list of child items, optionally carrying a
/// positional id inside a multi-valued container.
#[derive(Debug, Clone, Default)]
pub struct ContainerValue {
    id: Option<u64>,
    items: Vec<Item>,
}

impl ContainerValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: Option<u64>) -> Self {
        Self {
            id,
            items: Vec::new(),
        }
    }

    pub fn id(&self) -> Option<u64> {
        self.id
    }

    pub fn set_id(&mut self, id: Option<u64>) {
        self.id = id;
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.iter().all(Item::is_empty)
    }

    pub fn find_item(&self, name: &QName) -> Option<&Item> {
        self.items.iter().find(|i| i.name().matches(name))
    }

    pub fn find_item_mut(&mut self, name: &QName) -> Option<&mut Item> {
        self.items.iter_mut().find(|i| i.name().matches(name))
    }

    /// Adds a child item; item names are unique within a container value.
    pub fn add_item(&mut self, item: Item) -> Result<()> {
        if self.find_item(item.name()).is_some() {
            return Err(PrismError::violation(
                item.name(),
                "item already present in container value",
            ));
        }
        self.items.push(item);
        Ok(())
    }

    /// Builder-style [`ContainerValue::add_item`].
    pub fn with_item(mut self, item: Item) -> Result<Self> {
        self.add_item(item)?;
        Ok(self)
    }

    pub fn remove_item(&mut self, name: &QName) -> Option<Item> {
        let pos = self.items.iter().position(|i| i.name().matches(name))?;
        Some(self.items.remove(pos))
    }
}

/// Structural equality: ids must agree, items compare regardless of order.
impl PartialEq for ContainerValue {
    fn eq(&self, other: &Self) -> bool {
        let a: Vec<&Item> = self.items.iter().filter(|i| !i.is_empty()).collect();
        let b: Vec<&Item> = other.items.iter().filter(|i| !i.is_empty()).collect();
        self.id == other.id && unordered_eq(&a, &b, |x, y| x == y)
    }
}

/// Any item value, as carried by deltas.
#[derive(Debug, Clone, PartialEq)]
pub enum PrismValue {
    Property(PropertyValue),
    Reference(ReferenceValue),
    Container(ContainerValue),
}

impl PrismValue {
    pub fn kind(&self) -> &'static str {
        match self {
            PrismValue::Property(_) => "property",
            PrismValue::Reference(_) => "reference",
            PrismValue::Container(_) => "container",
        }
    }

    pub fn as_property(&self) -> Option<&PropertyValue> {
        match self {
            PrismValue::Property(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&ReferenceValue> {
        match self {
            PrismValue::Reference(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerValue> {
        match self {
            PrismValue::Container(c) => Some(c),
            _ => None,
        }
    }
}

impl From<PropertyValue> for PrismValue {
    fn from(v: PropertyValue) -> Self {
        PrismValue::Property(v)
    }
}

impl From<PrimitiveValue> for PrismValue {
    fn from(v: PrimitiveValue) -> Self {
        PrismValue::Property(PropertyValue::Primitive(v))
    }
}

impl From<&str> for PrismValue {
    fn from(v: &str) -> Self {
        PrimitiveValue::from(v).into()
    }
}

impl From<i64> for PrismValue {
    fn from(v: i64) -> Self {
        PrimitiveValue::from(v).into()
    }
}

impl From<PolyString> for PrismValue {
    fn from(v: PolyString) -> Self {
        PrimitiveValue::from(v).into()
    }
}

impl From<ReferenceValue> for PrismValue {
    fn from(v: ReferenceValue) -> Self {
        PrismValue::Reference(v)
    }
}

impl From<ContainerValue> for PrismValue {
    fn from(v: ContainerValue) -> Self {
        PrismValue::Container(v)
    }
}
