//! Merging a sequence of deltas into one.

use std::sync::Arc;

use prism_schema::{ComplexTypeDefinition, ItemDefinition, SchemaSnapshot};
use tracing::debug;

use super::item_delta::ItemDelta;
use super::object_delta::ObjectDelta;
use super::resolve_item;
use crate::context::PrismContext;
use crate::error::{PrismError, Result};
use crate::model::{Equivalence, PrismValue};

/// Folds `deltas`, oldest first, into a single delta with the same effect.
///
/// | earlier | later  | result                         |
/// |---------|--------|--------------------------------|
/// | add     | modify | add of the modified object     |
/// | add     | delete | delete                         |
/// | modify  | modify | modify with merged item deltas |
/// | modify  | delete | delete                         |
///
/// Every other pairing, and deltas for different objects, is an
/// [`PrismError::IllegalDeltaState`].
pub fn summarize(ctx: &PrismContext, deltas: &[ObjectDelta]) -> Result<ObjectDelta> {
    let (first, rest) = deltas
        .split_first()
        .ok_or_else(|| PrismError::IllegalArgument("nothing to summarize".into()))?;
    let snapshot = ctx.snapshot();
    let mut acc = first.clone();
    for next in rest {
        check_same_target(&acc, next)?;
        acc = match (acc, next) {
            (ObjectDelta::Add(mut object), ObjectDelta::Modify { .. }) => {
                next.apply_to(ctx, &mut object)?;
                ObjectDelta::Add(object)
            }
            (ObjectDelta::Add(_) | ObjectDelta::Modify { .. }, ObjectDelta::Delete { .. }) => {
                next.clone()
            }
            (
                ObjectDelta::Modify {
                    oid,
                    type_name,
                    mut modifications,
                },
                ObjectDelta::Modify {
                    modifications: later,
                    ..
                },
            ) => {
                let merger = Merger {
                    eq: Equivalence::new(ctx),
                    snapshot: &snapshot,
                    object_type: snapshot.find_complex_type(&type_name).cloned(),
                };
                for delta in later {
                    merger.merge(&mut modifications, delta.clone());
                }
                ObjectDelta::Modify {
                    oid,
                    type_name,
                    modifications,
                }
            }
            (acc, next) => {
                return Err(PrismError::illegal_delta(
                    "",
                    format!(
                        "{} cannot follow {}",
                        next.change_type(),
                        acc.change_type()
                    ),
                ))
            }
        };
    }
    debug!(
        count = deltas.len(),
        change_type = acc.change_type(),
        "summarized deltas"
    );
    Ok(acc)
}

fn check_same_target(a: &ObjectDelta, b: &ObjectDelta) -> Result<()> {
    if let (Some(x), Some(y)) = (a.oid(), b.oid()) {
        if !x.is_empty() && !y.is_empty() && x != y {
            return Err(PrismError::illegal_delta(
                "",
                format!("deltas for {x} and {y} cannot be summarized"),
            ));
        }
    }
    if a.type_name() != b.type_name() {
        return Err(PrismError::illegal_delta(
            "",
            format!(
                "deltas for {} and {} cannot be summarized",
                a.type_name(),
                b.type_name()
            ),
        ));
    }
    Ok(())
}

struct Merger<'a> {
    eq: Equivalence<'a>,
    snapshot: &'a SchemaSnapshot,
    object_type: Option<Arc<ComplexTypeDefinition>>,
}

impl Merger<'_> {
    /// Appends `delta` to `list`, folding it into an earlier delta where
    /// that keeps the sequential outcome.
    fn merge(&self, list: &mut Vec<ItemDelta>, delta: ItemDelta) {
        if delta.is_replace() {
            // A replace overrides earlier changes at and below its path.
            let mut i = list.len();
            while i > 0 {
                i -= 1;
                let earlier = list[i].path();
                if earlier.starts_with(delta.path()) {
                    list.remove(i);
                } else if delta.path().starts_with(earlier) {
                    break;
                }
            }
            list.push(delta);
            return;
        }
        let target = list
            .iter_mut()
            .rev()
            .find(|d| d.path().overlaps(delta.path()));
        match target {
            Some(d) if self.can_fold(d, &delta) => {
                d.delete_values(delta.values_to_delete().iter().cloned());
                d.add_values(delta.values_to_add().iter().cloned());
            }
            _ => list.push(delta),
        }
    }

    fn can_fold(&self, earlier: &ItemDelta, later: &ItemDelta) -> bool {
        if earlier.is_replace() || !earlier.path().equivalent(later.path()) {
            return false;
        }
        let def = self.definition(later);
        let def = def.as_deref();
        !self.overlap(def, earlier.values_to_delete(), later.values_to_add())
            && !self.overlap(def, later.values_to_delete(), earlier.values_to_add())
    }

    /// Whether any value of `a` matches one of `b`. A rule failure counts as
    /// a match.
    fn overlap(&self, def: Option<&ItemDefinition>, a: &[PrismValue], b: &[PrismValue]) -> bool {
        a.iter()
            .any(|x| b.iter().any(|y| self.eq.value(def, x, y).unwrap_or(true)))
    }

    fn definition(&self, delta: &ItemDelta) -> Option<Arc<ItemDefinition>> {
        let object_type = self.object_type.as_ref()?;
        resolve_item(self.snapshot, object_type, delta.path()).map(|(_, def)| def)
    }
}
