//! Applying deltas to objects.
//!
//! Application is atomic: a modify runs against a copy of the object, which
//! replaces the original only when every item delta succeeded.

use prism_path::{ItemPath, QName};
use prism_schema::{ItemDefinition, SchemaSnapshot};
use tracing::{debug, trace};

use super::item_delta::ItemDelta;
use super::object_delta::ObjectDelta;
use crate::context::PrismContext;
use crate::error::{value_trail, PrismError, Result};
use crate::model::{Equivalence, PrismObject, PrismValue, PropertyValue};

impl ObjectDelta {
    /// Applies an add or modify to `object` in place.
    ///
    /// An add overwrites `object` with the added one. A delete cannot be
    /// applied to an object value; use [`ObjectDelta::apply_to_slot`].
    pub fn apply_to(&self, ctx: &PrismContext, object: &mut PrismObject) -> Result<()> {
        match self {
            ObjectDelta::Add(added) => {
                *object = (**added).clone();
                Ok(())
            }
            ObjectDelta::Modify {
                oid,
                type_name,
                modifications,
            } => {
                check_target(oid, type_name, object)?;
                debug!(oid = %oid, modifications = modifications.len(), "applying modify delta");
                let snapshot = ctx.snapshot();
                let mut work = object.clone();
                for delta in modifications {
                    apply_item_delta(ctx, &snapshot, &mut work, delta)?;
                }
                *object = work;
                Ok(())
            }
            ObjectDelta::Delete { oid, .. } => Err(PrismError::illegal_delta(
                "",
                format!("delete of {oid} needs an object slot"),
            )),
        }
    }

    /// Applies the delta to an optional object, following the object
    /// lifecycle: add needs an empty slot, modify an occupied one, delete
    /// empties the slot.
    pub fn apply_to_slot(&self, ctx: &PrismContext, slot: &mut Option<PrismObject>) -> Result<()> {
        match self {
            ObjectDelta::Add(added) => {
                if let Some(existing) = slot.as_ref() {
                    return Err(PrismError::illegal_delta(
                        "",
                        format!("object {} already exists", existing.oid().unwrap_or_default()),
                    ));
                }
                *slot = Some((**added).clone());
                Ok(())
            }
            ObjectDelta::Modify { oid, .. } => match slot.as_mut() {
                Some(object) => self.apply_to(ctx, object),
                None => Err(PrismError::illegal_delta(
                    "",
                    format!("modify of missing object {oid}"),
                )),
            },
            ObjectDelta::Delete { oid, type_name } => {
                if let Some(object) = slot.as_ref() {
                    check_target(oid, type_name, object)?;
                    debug!(oid = %oid, "applying delete delta");
                }
                *slot = None;
                Ok(())
            }
        }
    }
}

fn check_target(oid: &str, type_name: &QName, object: &PrismObject) -> Result<()> {
    if let Some(actual) = object.oid() {
        if !oid.is_empty() && actual != oid {
            return Err(PrismError::illegal_delta(
                "",
                format!("delta for {oid} applied to {actual}"),
            ));
        }
    }
    if !object.definition().is_a(type_name) {
        return Err(PrismError::illegal_delta(
            "",
            format!("delta for {type_name} applied to {}", object.type_name()),
        ));
    }
    Ok(())
}

/// Applies one item delta to `object` in place.
///
/// Replace sets the values outright. Otherwise every value matching a delete
/// value under the item's rule is removed, then the add values are appended.
/// Missing parent containers are created for add and replace; a delete below
/// a missing parent changes nothing. Items left empty are removed.
pub fn apply_item_delta(
    ctx: &PrismContext,
    snapshot: &SchemaSnapshot,
    object: &mut PrismObject,
    delta: &ItemDelta,
) -> Result<()> {
    delta.validate()?;
    if delta.is_empty() {
        return Ok(());
    }
    trace!(path = %delta.path(), "applying item delta");
    let create = delta.is_replace() || !delta.values_to_add().is_empty();
    let undeclared = ctx.config().binding.raw_passthrough;
    let Some(slot) = object.slot_mut(snapshot, delta.path(), create, undeclared)? else {
        return Ok(());
    };
    let definition = slot.definition.clone();
    let def = definition.as_deref();
    let path = delta.path();

    let values = match delta.values_to_replace() {
        Some(replace) => replace.to_vec(),
        None => {
            let eq = Equivalence::new(ctx);
            let (to_add, to_delete) = (delta.values_to_add(), delta.values_to_delete());
            for a in to_add {
                for d in to_delete {
                    if eq.value(def, a, d)? {
                        return Err(PrismError::illegal_delta(
                            path,
                            "value both added and deleted",
                        ));
                    }
                }
            }
            let mut current = Vec::new();
            for value in slot.current_values() {
                if !matches_any(&eq, def, &value, to_delete)? {
                    current.push(value);
                }
            }
            if !to_add.is_empty() {
                if def.is_some_and(ItemDefinition::is_single_valued) && !current.is_empty() {
                    return Err(PrismError::violation(
                        path,
                        "add on a single-valued item that already has a value",
                    ));
                }
                current.extend(to_add.iter().cloned());
            }
            current
        }
    };
    check_values(def, &values, path)?;
    slot.replace(values)
}

fn matches_any(
    eq: &Equivalence<'_>,
    def: Option<&ItemDefinition>,
    value: &PrismValue,
    candidates: &[PrismValue],
) -> Result<bool> {
    for candidate in candidates {
        if eq.value(def, value, candidate)? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Primitive types must match the declaration; container ids must be unique.
fn check_values(
    def: Option<&ItemDefinition>,
    values: &[PrismValue],
    path: &ItemPath,
) -> Result<()> {
    let Some(def) = def else {
        return Ok(());
    };
    let mut ids = Vec::new();
    for (i, value) in values.iter().enumerate() {
        match value {
            PrismValue::Property(PropertyValue::Primitive(p)) => {
                if let Some(expected) = def.primitive() {
                    if p.primitive_type() != expected {
                        return Err(PrismError::mismatch(value_trail(path, i), expected, p));
                    }
                }
            }
            PrismValue::Property(PropertyValue::Raw(node)) => {
                if let Some(expected) = def.primitive() {
                    return Err(PrismError::mismatch(value_trail(path, i), expected, node.kind()));
                }
            }
            PrismValue::Container(cv) => {
                if let Some(id) = cv.id() {
                    if ids.contains(&id) {
                        return Err(PrismError::violation(
                            value_trail(path, i),
                            format!("duplicate container id {id}"),
                        ));
                    }
                    ids.push(id);
                }
            }
            PrismValue::Reference(_) => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{ctx, user_object};
    use crate::model::{ContainerValue, ReferenceValue};
    use crate::value::PrimitiveValue;


    fn path(text: &str) -> ItemPath {
        text.parse().unwrap()
    }

    fn modify(object: &PrismObject, deltas: Vec<ItemDelta>) -> ObjectDelta {
        ObjectDelta::modify(
            object.oid().unwrap_or_default(),
            object.type_name().clone(),
            deltas,
        )
    }

    fn strings(object: &PrismObject, p: &str) -> Vec<String> {
        object
            .find_item(&path(p))
            .map(|i| {
                i.property_values()
                    .iter()
                    .filter_map(|v| v.as_primitive())
                    .map(|v| v.to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    #[test]
    fn delete_is_rule_aware_and_removes_all_matches() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        modify(
            &user,
            vec![ItemDelta::add(
                path("employeeType"),
                vec!["Pirate".into(), "PIRATE".into(), "captain".into()],
            )],
        )
        .apply_to(&ctx, &mut user)
        .unwrap();
        modify(&user, vec![ItemDelta::delete(path("employeeType"), vec!["pirate".into()])])
            .apply_to(&ctx, &mut user)
            .unwrap();
        assert_eq!(strings(&user, "employeeType"), ["captain"]);
    }

    #[test]
    fn failed_modify_leaves_object_untouched() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        let before = user.clone();
        let delta = modify(
            &user,
            vec![
                ItemDelta::replace(path("description"), vec!["ok".into()]),
                ItemDelta::add(path("description"), vec!["second".into()]),
            ],
        );
        let err = delta.apply_to(&ctx, &mut user).unwrap_err();
        assert!(matches!(err, PrismError::SchemaViolation { .. }));
        assert_eq!(user, before);
    }

    #[test]
    fn replace_empty_removes_item() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        modify(&user, vec![ItemDelta::replace(path("name"), vec![])])
            .apply_to(&ctx, &mut user)
            .unwrap();
        assert!(user.find_item(&path("name")).is_none());
    }

    #[test]
    fn nested_paths_create_parents() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        modify(
            &user,
            vec![ItemDelta::add(path("assignment/5/description"), vec!["nested".into()])],
        )
        .apply_to(&ctx, &mut user)
        .unwrap();
        assert_eq!(strings(&user, "assignment/5/description"), ["nested"]);

        modify(
            &user,
            vec![ItemDelta::delete(path("assignment/9/description"), vec!["x".into()])],
        )
        .apply_to(&ctx, &mut user)
        .unwrap();
        assert!(user.find_container_value(&path("assignment/9")).is_none());
    }

    #[test]
    fn wrong_value_type_is_a_mismatch() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        let err = modify(
            &user,
            vec![ItemDelta::replace(path("assignment/1/order"), vec!["first".into()])],
        )
        .apply_to(&ctx, &mut user)
        .unwrap_err();
        assert_eq!(err.path(), Some("assignment/1/order[0]"));

        let err = modify(
            &user,
            vec![ItemDelta::add(path("linkRef"), vec![PrimitiveValue::from("s1").into()])],
        )
        .apply_to(&ctx, &mut user)
        .unwrap_err();
        assert!(matches!(err, PrismError::SchemaViolation { .. }));
    }

    #[test]
    fn duplicate_container_ids() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        let err = modify(
            &user,
            vec![ItemDelta::add(
                path("assignment"),
                vec![
                    ContainerValue::with_id(Some(1)).into(),
                    ContainerValue::with_id(Some(1)).into(),
                ],
            )],
        )
        .apply_to(&ctx, &mut user)
        .unwrap_err();
        assert!(matches!(err, PrismError::SchemaViolation { .. }));
    }

    #[test]
    fn lifecycle_through_slot() {
        let ctx = ctx();
        let user = user_object("u1", "jack");
        let ty = user.type_name().clone();
        let mut slot = None;

        ObjectDelta::modify("u1", ty.clone(), vec![])
            .apply_to_slot(&ctx, &mut slot)
            .unwrap_err();
        ObjectDelta::add(user.clone()).apply_to_slot(&ctx, &mut slot).unwrap();
        assert!(ObjectDelta::add(user).apply_to_slot(&ctx, &mut slot).is_err());

        ObjectDelta::modify(
            "u1",
            ty.clone(),
            vec![ItemDelta::add(path("linkRef"), vec![ReferenceValue::new("s1").into()])],
        )
        .apply_to_slot(&ctx, &mut slot)
        .unwrap();
        assert_eq!(slot.as_ref().unwrap().find_item(&path("linkRef")).unwrap().len(), 1);

        assert!(ObjectDelta::delete("u2", ty.clone())
            .apply_to_slot(&ctx, &mut slot)
            .is_err());
        ObjectDelta::delete("u1", ty.clone()).apply_to_slot(&ctx, &mut slot).unwrap();
        assert!(slot.is_none());
        ObjectDelta::delete("u1", ty).apply_to_slot(&ctx, &mut slot).unwrap();
    }

    #[test]
    fn delete_in_place_is_rejected() {
        let ctx = ctx();
        let mut user = user_object("u1", "jack");
        let err = ObjectDelta::delete("u1", user.type_name().clone())
            .apply_to(&ctx, &mut user)
            .unwrap_err();
        assert!(matches!(err, PrismError::IllegalDeltaState { .. }));
    }
}
