//! Computing the delta between two versions of an object.

use std::sync::Arc;

use prism_path::{ItemPath, QName};
use prism_schema::{ComplexTypeDefinition, ItemDefinition, SchemaSnapshot};
use prism_util::{unmatched, unordered_eq};
use tracing::debug;

use super::item_delta::ItemDelta;
use super::object_delta::ObjectDelta;
use crate::config::{DiffMode, DiffPolicy};
use crate::context::PrismContext;
use crate::error::{PrismError, Result};
use crate::model::{ContainerValue, Equivalence, Item, PrismObject, PrismValue};

/// The modify delta turning `old` into `new`.
///
/// Applying the result to `old` yields an object equivalent to `new`. Items
/// are compared under their matching rules, so values differing only in a
/// way the rule ignores produce no change. How changes are expressed follows
/// the context's [`DiffPolicy`].
pub fn diff(ctx: &PrismContext, old: &PrismObject, new: &PrismObject) -> Result<ObjectDelta> {
    if old.type_name() != new.type_name() {
        return Err(PrismError::IllegalArgument(format!(
            "cannot diff {} against {}",
            old.type_name(),
            new.type_name()
        )));
    }
    if let (Some(a), Some(b)) = (old.oid(), new.oid()) {
        if a != b {
            return Err(PrismError::IllegalArgument(format!(
                "cannot diff object {a} against object {b}"
            )));
        }
    }
    let snapshot = ctx.snapshot();
    let differ = Differ {
        eq: Equivalence::new(ctx),
        policy: ctx.config().diff,
        snapshot: &snapshot,
    };
    let mut modifications = Vec::new();
    differ.container(
        &ItemPath::empty(),
        old.definition(),
        old.root(),
        new.root(),
        &mut modifications,
    );
    debug!(
        oid = old.oid().or(new.oid()).unwrap_or_default(),
        modifications = modifications.len(),
        "computed diff"
    );
    Ok(ObjectDelta::modify(
        old.oid().or(new.oid()).unwrap_or_default(),
        old.type_name().clone(),
        modifications,
    ))
}

struct Differ<'a> {
    eq: Equivalence<'a>,
    policy: DiffPolicy,
    snapshot: &'a SchemaSnapshot,
}

impl Differ<'_> {
    fn container(
        &self,
        path: &ItemPath,
        owner: &Arc<ComplexTypeDefinition>,
        a: &ContainerValue,
        b: &ContainerValue,
        out: &mut Vec<ItemDelta>,
    ) {
        let mut names: Vec<&QName> = Vec::new();
        for item in a.items().iter().chain(b.items()) {
            if !item.is_empty() && !names.iter().any(|n| n.matches(item.name())) {
                names.push(item.name());
            }
        }
        for name in names {
            let ia = a.find_item(name).filter(|i| !i.is_empty());
            let ib = b.find_item(name).filter(|i| !i.is_empty());
            let def = ia
                .and_then(Item::definition)
                .or_else(|| ib.and_then(Item::definition))
                .or_else(|| owner.find_item(name))
                .cloned();
            self.item(&path.child(name.clone()), owner, def.as_ref(), ia, ib, out);
        }
    }

    fn item(
        &self,
        path: &ItemPath,
        owner: &Arc<ComplexTypeDefinition>,
        def: Option<&Arc<ItemDefinition>>,
        a: Option<&Item>,
        b: Option<&Item>,
        out: &mut Vec<ItemDelta>,
    ) {
        if let (Some(def), Some(a), Some(b)) = (def, a, b) {
            if def.is_container() && self.policy.recurse_containers {
                if let Some(child) = self.snapshot.container_type_for(owner, def) {
                    if self.container_item(path, &child, def, a, b, out) {
                        return;
                    }
                }
            }
        }
        let d = def.map(|d| d.as_ref());
        let old = a.map(Item::to_prism_values).unwrap_or_default();
        let new = b.map(Item::to_prism_values).unwrap_or_default();
        if self.same(d, &old, &new) {
            return;
        }
        let mode = if d.is_some_and(ItemDefinition::is_single_valued) {
            self.policy.single_valued
        } else {
            self.policy.multi_valued
        };
        match mode {
            DiffMode::Replace => out.push(ItemDelta::replace(path.clone(), new)),
            DiffMode::AddDelete => out.push(self.add_delete(path, d, old, new)),
        }
    }

    fn same(&self, d: Option<&ItemDefinition>, a: &[PrismValue], b: &[PrismValue]) -> bool {
        unordered_eq(a, b, |x, y| self.eq.value_equal(d, x, y))
    }

    /// Deletes for old-only values, adds for new-only ones.
    ///
    /// A delete removes every matching value (container values carrying an
    /// id match by id alone), and applying it needs every value
    /// normalizable. Where either would make the result differ from `new`,
    /// the change falls back to a replace.
    fn add_delete(
        &self,
        path: &ItemPath,
        d: Option<&ItemDefinition>,
        old: Vec<PrismValue>,
        new: Vec<PrismValue>,
    ) -> ItemDelta {
        if old.iter().chain(&new).any(|v| !self.eq.normalizes(d, v)) {
            return ItemDelta::replace(path.clone(), new);
        }
        let (only_old, only_new) = unmatched(&old, &new, |x, y| self.eq.value_equal(d, x, y));
        let deletes: Vec<PrismValue> = only_old.iter().map(|&i| old[i].clone()).collect();
        let adds: Vec<PrismValue> = only_new.iter().map(|&j| new[j].clone()).collect();
        let ambiguous = deletes
            .iter()
            .any(|x| new.iter().any(|y| self.eq.value_or_different(d, x, y)));
        if ambiguous {
            return ItemDelta::replace(path.clone(), new);
        }
        let mut delta = ItemDelta::delete(path.clone(), deletes);
        delta.add_values(adds);
        delta
    }

    /// Recurses into container values paired by id, then by equivalence.
    /// Returns false when the item has to be changed as a whole.
    fn container_item(
        &self,
        path: &ItemPath,
        child: &Arc<ComplexTypeDefinition>,
        def: &ItemDefinition,
        a: &Item,
        b: &Item,
        out: &mut Vec<ItemDelta>,
    ) -> bool {
        let (old, new) = (a.container_values(), b.container_values());
        if def.is_single_valued() {
            let (Some(x), Some(y)) = (old.first(), new.first()) else {
                return false;
            };
            if matches!((x.id(), y.id()), (Some(i), Some(j)) if i != j) {
                return false;
            }
            self.container(path, child, x, y, out);
            return true;
        }
        if self.policy.multi_valued == DiffMode::Replace {
            return false;
        }

        let mut nested = Vec::new();
        let mut paired = vec![false; old.len()];
        let mut pending = Vec::new();
        for y in new {
            let by_id = y
                .id()
                .and_then(|id| Some((id, old.iter().position(|x| x.id() == Some(id))?)));
            match by_id {
                Some((id, i)) => {
                    paired[i] = true;
                    self.container(&path.child(id), child, &old[i], y, &mut nested);
                }
                None => pending.push(y),
            }
        }
        let mut adds = Vec::new();
        for y in pending {
            match (0..old.len()).find(|&i| !paired[i] && self.eq.container(&old[i], y)) {
                Some(i) => paired[i] = true,
                None => adds.push(PrismValue::Container(y.clone())),
            }
        }
        let deletes: Vec<PrismValue> = old
            .iter()
            .zip(&paired)
            .filter(|(_, p)| !**p)
            .map(|(x, _)| PrismValue::Container(x.clone()))
            .collect();

        let clashes = deletes.iter().filter_map(PrismValue::as_container).any(|x| {
            new.iter().any(|y| self.eq.container(x, y))
                || old
                    .iter()
                    .zip(&paired)
                    .any(|(kept, p)| *p && self.eq.container(x, kept))
        });
        if clashes {
            return false;
        }
        out.extend(nested);
        if !deletes.is_empty() || !adds.is_empty() {
            let mut delta = ItemDelta::delete(path.clone(), deletes);
            delta.add_values(adds);
            out.push(delta);
        }
        true
    }
}
