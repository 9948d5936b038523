//! Rule-aware equivalence of values, items and objects.
//!
//! Structural `==` compares values verbatim. [`Equivalence`] compares
//! property values through the matching rule of their item, so `Jack` and
//! `JACK` in a `stringIgnoreCase` item are the same value.

use prism_schema::ItemDefinition;
use prism_util::unordered_eq;

use super::item::{Item, ItemValues};
use super::object::PrismObject;
use super::value::{ContainerValue, PrismValue, PropertyValue, ReferenceValue};
use crate::context::PrismContext;
use crate::error::Result;

#[derive(Clone, Copy)]
pub struct Equivalence<'a> {
    ctx: &'a PrismContext,
}

impl<'a> Equivalence<'a> {
    pub fn new(ctx: &'a PrismContext) -> Self {
        Self { ctx }
    }

    /// Property values under the item's rule. Raw values compare
    /// structurally. A value the rule cannot normalize is an error.
    pub fn property(
        &self,
        definition: Option<&ItemDefinition>,
        a: &PropertyValue,
        b: &PropertyValue,
    ) -> Result<bool> {
        match (a, b) {
            (PropertyValue::Primitive(x), PropertyValue::Primitive(y)) => {
                let rule = self.ctx.rule_for(definition)?;
                Ok(rule.matches(x, y)?)
            }
            _ => Ok(a == b),
        }
    }

    /// References are the same link when OID, target type and relation agree.
    pub fn reference(&self, a: &ReferenceValue, b: &ReferenceValue) -> bool {
        a == b
    }

    /// Container values as delta targets. Two values that both carry an id
    /// are the same value exactly when the ids agree; otherwise the
    /// contents decide.
    pub fn container(&self, a: &ContainerValue, b: &ContainerValue) -> bool {
        match (a.id(), b.id()) {
            (Some(x), Some(y)) => x == y,
            _ => self.container_content(a, b),
        }
    }

    /// Container values as data: ids, when both present, must agree, and
    /// the contents must match.
    pub fn container_equal(&self, a: &ContainerValue, b: &ContainerValue) -> bool {
        let ids_agree = match (a.id(), b.id()) {
            (Some(x), Some(y)) => x == y,
            _ => true,
        };
        ids_agree && self.container_content(a, b)
    }

    /// Container values compared by their items only.
    pub fn container_content(&self, a: &ContainerValue, b: &ContainerValue) -> bool {
        self.items(a.items(), b.items())
    }

    /// Any two values of one item.
    pub fn value(
        &self,
        definition: Option<&ItemDefinition>,
        a: &PrismValue,
        b: &PrismValue,
    ) -> Result<bool> {
        Ok(match (a, b) {
            (PrismValue::Property(x), PrismValue::Property(y)) => {
                self.property(definition, x, y)?
            }
            (PrismValue::Reference(x), PrismValue::Reference(y)) => self.reference(x, y),
            (PrismValue::Container(x), PrismValue::Container(y)) => self.container(x, y),
            _ => false,
        })
    }

    /// [`Equivalence::value`] with rule failures counted as "different".
    pub fn value_or_different(
        &self,
        definition: Option<&ItemDefinition>,
        a: &PrismValue,
        b: &PrismValue,
    ) -> bool {
        self.value(definition, a, b).unwrap_or(false)
    }

    /// [`Equivalence::value_or_different`], except that container values
    /// must also agree in content.
    pub fn value_equal(
        &self,
        definition: Option<&ItemDefinition>,
        a: &PrismValue,
        b: &PrismValue,
    ) -> bool {
        match (a, b) {
            (PrismValue::Container(x), PrismValue::Container(y)) => self.container_equal(x, y),
            _ => self.value_or_different(definition, a, b),
        }
    }

    /// True when the item's rule accepts `value`.
    pub fn normalizes(&self, definition: Option<&ItemDefinition>, value: &PrismValue) -> bool {
        match value {
            PrismValue::Property(PropertyValue::Primitive(p)) => self
                .ctx
                .rule_for(definition)
                .is_ok_and(|rule| rule.normalize(p).is_ok()),
            _ => true,
        }
    }

    /// Item value multisets under the item's rule.
    pub fn item_values(&self, definition: Option<&ItemDefinition>, a: &Item, b: &Item) -> bool {
        match (a.values(), b.values()) {
            (ItemValues::Property(x), ItemValues::Property(y)) => unordered_eq(x, y, |p, q| {
                self.property(definition, p, q).unwrap_or(false)
            }),
            (ItemValues::Reference(x), ItemValues::Reference(y)) => {
                unordered_eq(x, y, |p, q| self.reference(p, q))
            }
            (ItemValues::Container(x), ItemValues::Container(y)) => {
                unordered_eq(x, y, |p, q| self.container_equal(p, q))
            }
            _ => a.is_empty() && b.is_empty(),
        }
    }

    pub fn item(&self, a: &Item, b: &Item) -> bool {
        let definition = a.definition().or(b.definition()).map(|d| d.as_ref());
        a.name().matches(b.name()) && self.item_values(definition, a, b)
    }

    /// Item lists by name, ignoring order and empty items.
    pub fn items(&self, a: &[Item], b: &[Item]) -> bool {
        let a: Vec<&Item> = a.iter().filter(|i| !i.is_empty()).collect();
        let b: Vec<&Item> = b.iter().filter(|i| !i.is_empty()).collect();
        a.len() == b.len()
            && a.iter().all(|x| {
                b.iter()
                    .find(|y| y.name().matches(x.name()))
                    .is_some_and(|y| self.item(x, y))
            })
    }

    /// Objects: same type, same OID, equivalent content. Versions are
    /// ignored.
    pub fn object(&self, a: &PrismObject, b: &PrismObject) -> bool {
        a.type_name() == b.type_name()
            && a.oid() == b.oid()
            && self.container_content(a.root(), b.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{ctx, item_def, snapshot, user_object};
    use crate::value::{PolyString, PrimitiveValue};
    use prism_path::ItemPath;

    #[test]
    fn rule_aware_properties() {
        let ctx = ctx();
        let snap = snapshot();
        let eq = Equivalence::new(&ctx);
        let employee_type = item_def(&snap, "UserType", "employeeType");
        let description = item_def(&snap, "UserType", "description");
        let a = PropertyValue::from(PrimitiveValue::from("Admin"));
        let b = PropertyValue::from(PrimitiveValue::from("ADMIN"));
        assert!(eq.property(Some(&*employee_type), &a, &b).unwrap());
        assert!(!eq.property(Some(&*description), &a, &b).unwrap());
    }

    #[test]
    fn unnormalizable_value_is_an_error_or_different() {
        let ctx = ctx();
        let snap = snapshot();
        let eq = Equivalence::new(&ctx);
        let name = item_def(&snap, "UserType", "name");
        let a: PrismValue = PrimitiveValue::from("plain").into();
        let b: PrismValue = PrimitiveValue::from(PolyString::from_parts("plain", "plain")).into();
        assert!(eq.value(Some(&*name), &a, &b).is_err());
        assert!(!eq.value_or_different(Some(&*name), &a, &b));
    }

    #[test]
    fn objects_ignore_version() {
        let ctx = ctx();
        let a = user_object("u1", "jack");
        let mut b = a.clone();
        b.set_version(Some("7".into()));
        assert!(a.equivalent(&b, &ctx));
        assert_ne!(a, b);

        b.set_item_values(&ctx, &ItemPath::from_names(&["description"]), vec!["x".into()])
            .unwrap();
        assert!(!a.equivalent(&b, &ctx));
    }

    #[test]
    fn container_identity_and_equality() {
        let ctx = ctx();
        let eq = Equivalence::new(&ctx);
        assert!(eq.container(&ContainerValue::with_id(Some(1)), &ContainerValue::with_id(None)));
        assert!(!eq.container(
            &ContainerValue::with_id(Some(1)),
            &ContainerValue::with_id(Some(2))
        ));
        assert!(eq.container_equal(&ContainerValue::with_id(Some(1)), &ContainerValue::with_id(None)));
        assert!(!eq.container_equal(
            &ContainerValue::with_id(Some(1)),
            &ContainerValue::with_id(Some(2))
        ));
        assert!(eq.container_content(
            &ContainerValue::with_id(Some(1)),
            &ContainerValue::with_id(Some(2))
        ));

        let mut user = user_object("u1", "jack");
        let desc: ItemPath = "assignment/1/description".parse().unwrap();
        user.set_item_values(&ctx, &desc, vec!["crew".into()]).unwrap();
        let filled = user.find_item(&ItemPath::from_names(&["assignment"])).unwrap().container_values()[0].clone();
        let bare = ContainerValue::with_id(Some(1));
        assert!(eq.container(&filled, &bare));
        assert!(!eq.container_equal(&filled, &bare));
    }
}
