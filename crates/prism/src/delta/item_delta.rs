//! Changes to one item.

use prism_path::ItemPath;

use crate::error::{PrismError, Result};
use crate::model::PrismValue;

/// Add, delete and replace sets for the item at `path`.
///
/// A replace excludes add and delete. `Some(vec![])` as the replace set
/// clears the item; `None` means "no replace".
#[derive(Debug, Clone, PartialEq)]
pub struct ItemDelta {
    path: ItemPath,
    to_add: Vec<PrismValue>,
    to_delete: Vec<PrismValue>,
    to_replace: Option<Vec<PrismValue>>,
}

impl ItemDelta {
    pub fn new(path: ItemPath) -> Self {
        Self {
            path,
            to_add: Vec::new(),
            to_delete: Vec::new(),
            to_replace: None,
        }
    }

    pub fn add(path: ItemPath, values: impl IntoIterator<Item = PrismValue>) -> Self {
        let mut d = Self::new(path);
        d.add_values(values);
        d
    }

    pub fn delete(path: ItemPath, values: impl IntoIterator<Item = PrismValue>) -> Self {
        let mut d = Self::new(path);
        d.delete_values(values);
        d
    }

    pub fn replace(path: ItemPath, values: impl IntoIterator<Item = PrismValue>) -> Self {
        let mut d = Self::new(path);
        d.set_replace(values);
        d
    }

    pub fn path(&self) -> &ItemPath {
        &self.path
    }

    pub fn values_to_add(&self) -> &[PrismValue] {
        &self.to_add
    }

    pub fn values_to_delete(&self) -> &[PrismValue] {
        &self.to_delete
    }

    pub fn values_to_replace(&self) -> Option<&[PrismValue]> {
        self.to_replace.as_deref()
    }

    pub fn is_replace(&self) -> bool {
        self.to_replace.is_some()
    }

    pub fn add_values(&mut self, values: impl IntoIterator<Item = PrismValue>) {
        self.to_add.extend(values);
    }

    pub fn delete_values(&mut self, values: impl IntoIterator<Item = PrismValue>) {
        self.to_delete.extend(values);
    }

    pub fn set_replace(&mut self, values: impl IntoIterator<Item = PrismValue>) {
        self.to_replace = Some(values.into_iter().collect());
    }

    /// True when applying the delta changes nothing.
    pub fn is_empty(&self) -> bool {
        self.to_replace.is_none() && self.to_add.is_empty() && self.to_delete.is_empty()
    }

    /// Structural consistency: replace excludes add and delete, and no value
    /// is both added and deleted. Rule-aware overlap is checked on apply.
    pub fn validate(&self) -> Result<()> {
        if self.path.is_empty() {
            return Err(PrismError::illegal_delta("", "item delta without a path"));
        }
        if self.is_replace() && (!self.to_add.is_empty() || !self.to_delete.is_empty()) {
            return Err(PrismError::illegal_delta(
                &self.path,
                "replace combined with add or delete",
            ));
        }
        if self.to_add.iter().any(|v| self.to_delete.contains(v)) {
            return Err(PrismError::illegal_delta(
                &self.path,
                "value both added and deleted",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> ItemPath {
        ItemPath::from_names(&["employeeType"])
    }

    #[test]
    fn replace_excludes_add() {
        let mut d = ItemDelta::replace(path(), vec!["a".into()]);
        assert!(d.validate().is_ok());
        d.add_values(vec!["b".into()]);
        assert!(matches!(
            d.validate(),
            Err(PrismError::IllegalDeltaState { .. })
        ));
    }

    #[test]
    fn overlapping_add_and_delete() {
        let mut d = ItemDelta::add(path(), vec!["a".into()]);
        d.delete_values(vec!["a".into()]);
        let err = d.validate().unwrap_err();
        assert_eq!(err.path(), Some("employeeType"));
    }

    #[test]
    fn emptiness() {
        assert!(ItemDelta::new(path()).is_empty());
        assert!(!ItemDelta::replace(path(), vec![]).is_empty());
        assert_eq!(ItemDelta::replace(path(), vec![]).values_to_replace(), Some(&[][..]));
    }
}
