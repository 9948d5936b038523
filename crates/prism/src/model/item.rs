//! Items: named, homogeneous value collections.

use std::sync::Arc;

use prism_path::QName;
use prism_schema::{ItemDefinition, ItemKind};
use prism_util::unordered_eq;

use super::value::{ContainerValue, PrismValue, PropertyValue, ReferenceValue};
use crate::error::{PrismError, Result};

/// The values of an item. All values of one item share a kind.
#[derive(Debug, Clone)]
pub enum ItemValues {
    Property(Vec<PropertyValue>),
    Reference(Vec<ReferenceValue>),
    Container(Vec<ContainerValue>),
}

impl ItemValues {
    /// An empty collection of the kind `kind` holds.
    pub fn empty_for(kind: &ItemKind) -> Self {
        match kind {
            ItemKind::Property { .. } => ItemValues::Property(Vec::new()),
            ItemKind::Reference { .. } => ItemValues::Reference(Vec::new()),
            ItemKind::Container => ItemValues::Container(Vec::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ItemValues::Property(v) => v.len(),
            ItemValues::Reference(v) => v.len(),
            ItemValues::Container(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ItemValues::Property(_) => "property",
            ItemValues::Reference(_) => "reference",
            ItemValues::Container(_) => "container",
        }
    }
}

/// Multiset equality: same kind, same values, any order.
impl PartialEq for ItemValues {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ItemValues::Property(a), ItemValues::Property(b)) => unordered_eq(a, b, |x, y| x == y),
            (ItemValues::Reference(a), ItemValues::Reference(b)) => {
                unordered_eq(a, b, |x, y| x == y)
            }
            (ItemValues::Container(a), ItemValues::Container(b)) => {
                unordered_eq(a, b, |x, y| x == y)
            }
            _ => self.is_empty() && other.is_empty(),
        }
    }
}

/// A named item. Undeclared items (raw passthrough) carry no definition and
/// hold raw property values.
#[derive(Debug, Clone)]
pub struct Item {
    name: QName,
    definition: Option<Arc<ItemDefinition>>,
    values: ItemValues,
}

impl Item {
    /// An empty item of the declared kind.
    pub fn new(definition: &Arc<ItemDefinition>) -> Self {
        Self {
            name: definition.name.clone(),
            values: ItemValues::empty_for(&definition.kind),
            definition: Some(Arc::clone(definition)),
        }
    }

    /// An undeclared item.
    pub fn undeclared(name: QName) -> Self {
        Self {
            name,
            definition: None,
            values: ItemValues::Property(Vec::new()),
        }
    }

    /// An item holding `values`, checked against the definition.
    pub fn with_values(
        definition: &Arc<ItemDefinition>,
        values: impl IntoIterator<Item = PrismValue>,
    ) -> Result<Self> {
        let mut item = Self::new(definition);
        item.set_values(values.into_iter().collect())?;
        Ok(item)
    }

    pub fn name(&self) -> &QName {
        &self.name
    }

    pub fn definition(&self) -> Option<&Arc<ItemDefinition>> {
        self.definition.as_ref()
    }

    pub fn values(&self) -> &ItemValues {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn is_single_valued(&self) -> bool {
        self.definition
            .as_ref()
            .is_some_and(|d| d.is_single_valued())
    }

    pub fn property_values(&self) -> &[PropertyValue] {
        match &self.values {
            ItemValues::Property(v) => v,
            _ => &[],
        }
    }

    pub fn reference_values(&self) -> &[ReferenceValue] {
        match &self.values {
            ItemValues::Reference(v) => v,
            _ => &[],
        }
    }

    pub fn reference_values_mut(&mut self) -> &mut [ReferenceValue] {
        match &mut self.values {
            ItemValues::Reference(v) => v,
            _ => &mut [],
        }
    }

    pub fn container_values(&self) -> &[ContainerValue] {
        match &self.values {
            ItemValues::Container(v) => v,
            _ => &[],
        }
    }

    pub fn container_values_mut(&mut self) -> &mut [ContainerValue] {
        match &mut self.values {
            ItemValues::Container(v) => v,
            _ => &mut [],
        }
    }

    /// The container value with the given id, or the only value of an item
    /// addressed without one.
    pub fn find_container_value(&self, id: Option<u64>) -> Option<&ContainerValue> {
        let values = self.container_values();
        match id {
            Some(id) => values.iter().find(|v| v.id() == Some(id)),
            None if values.len() == 1 => values.first(),
            None => None,
        }
    }

    pub fn find_container_value_mut(&mut self, id: Option<u64>) -> Option<&mut ContainerValue> {
        let values = self.container_values_mut();
        match id {
            Some(id) => values.iter_mut().find(|v| v.id() == Some(id)),
            None if values.len() == 1 => values.first_mut(),
            None => None,
        }
    }

    /// Copies of all values, in order.
    pub fn to_prism_values(&self) -> Vec<PrismValue> {
        match &self.values {
            ItemValues::Property(v) => v.iter().cloned().map(PrismValue::Property).collect(),
            ItemValues::Reference(v) => v.iter().cloned().map(PrismValue::Reference).collect(),
            ItemValues::Container(v) => v.iter().cloned().map(PrismValue::Container).collect(),
        }
    }

    /// Appends one value. The value kind must match the item's.
    pub fn push(&mut self, value: PrismValue) -> Result<()> {
        match (&mut self.values, value) {
            (ItemValues::Property(vs), PrismValue::Property(v)) => vs.push(v),
            (ItemValues::Reference(vs), PrismValue::Reference(v)) => vs.push(v),
            (ItemValues::Container(vs), PrismValue::Container(v)) => vs.push(v),
            (values, value) => {
                return Err(PrismError::violation(
                    &self.name,
                    format!(
                        "{} value in {} item",
                        value.kind(),
                        values.kind()
                    ),
                ))
            }
        }
        Ok(())
    }

    /// Replaces all values. Kinds and cardinality are checked; on error the
    /// item is left unchanged.
    pub fn set_values(&mut self, values: Vec<PrismValue>) -> Result<()> {
        if let Some(def) = &self.definition {
            if !def.max_occurs.allows(values.len()) {
                return Err(PrismError::violation(
                    &self.name,
                    format!(
                        "{} values exceed maxOccurs {}",
                        values.len(),
                        def.max_occurs
                    ),
                ));
            }
        }
        let mut next = Self {
            name: self.name.clone(),
            definition: self.definition.clone(),
            values: match &self.definition {
                Some(def) => ItemValues::empty_for(&def.kind),
                None => ItemValues::Property(Vec::new()),
            },
        };
        for value in values {
            next.push(value)?;
        }
        self.values = next.values;
        Ok(())
    }
}

/// Names match namespace-aware; values compare as multisets.
impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        self.name.matches(&other.name) && self.values == other.values
    }
}
