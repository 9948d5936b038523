//! Fluent construction of modify deltas.

use prism_path::{ItemPath, QName};

use super::item_delta::ItemDelta;
use super::object_delta::ObjectDelta;
use crate::model::{PrismObject, PrismValue};

/// Collects item changes for one object.
///
/// Adds and deletes for the same path go into one item delta unless a
/// replace for that path came in between.
#[derive(Debug, Clone)]
pub struct DeltaBuilder {
    oid: String,
    type_name: QName,
    modifications: Vec<ItemDelta>,
}

impl DeltaBuilder {
    pub fn modify(oid: impl Into<String>, type_name: QName) -> Self {
        Self {
            oid: oid.into(),
            type_name,
            modifications: Vec::new(),
        }
    }

    /// A builder targeting `object`.
    pub fn for_object(object: &PrismObject) -> Self {
        Self::modify(object.oid().unwrap_or_default(), object.type_name().clone())
    }

    pub fn add<V: Into<PrismValue>>(
        mut self,
        path: ItemPath,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.open(path).add_values(values.into_iter().map(Into::into));
        self
    }

    pub fn delete<V: Into<PrismValue>>(
        mut self,
        path: ItemPath,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.open(path).delete_values(values.into_iter().map(Into::into));
        self
    }

    pub fn replace<V: Into<PrismValue>>(
        mut self,
        path: ItemPath,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.modifications
            .push(ItemDelta::replace(path, values.into_iter().map(Into::into)));
        self
    }

    pub fn build(self) -> ObjectDelta {
        ObjectDelta::modify(self.oid, self.type_name, self.modifications)
    }

    /// The add/delete delta for `path`, reused when it is the latest one.
    fn open(&mut self, path: ItemPath) -> &mut ItemDelta {
        let reuse = self
            .modifications
            .last()
            .is_some_and(|d| !d.is_replace() && d.path().equivalent(&path));
        if !reuse {
            self.modifications.push(ItemDelta::new(path));
        }
        let last = self.modifications.len() - 1;
        &mut self.modifications[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::user_object;

    #[test]
    fn merges_adds_and_deletes_on_one_path() {
        let user = user_object("u1", "jack");
        let employee_type = ItemPath::from_names(&["employeeType"]);
        let delta = DeltaBuilder::for_object(&user)
            .add(employee_type.clone(), ["pirate"])
            .delete(employee_type.clone(), ["sailor"])
            .replace(ItemPath::from_names(&["description"]), ["x"])
            .add(employee_type.clone(), ["captain"])
            .build();
        assert_eq!(delta.oid(), Some("u1"));
        let mods = delta.modifications();
        assert_eq!(mods.len(), 3);
        assert_eq!(mods[0].values_to_add().len(), 1);
        assert_eq!(mods[0].values_to_delete().len(), 1);
        assert!(mods[1].is_replace());
        assert_eq!(mods[2].values_to_add(), &[PrismValue::from("captain")]);
    }
}
