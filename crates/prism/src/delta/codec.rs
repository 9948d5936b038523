//! Deltas as XNode documents.
//!
//! ```text
//! objectDelta:
//!   changeType: add | modify | delete
//!   oid: ...
//!   objectType: c:UserType
//!   objectToAdd: <object document>          (add)
//!   itemDelta:                              (modify)
//!     - path: c:assignment/3/c:description
//!       add: [...]
//!       delete: [...]
//!       replace: [...]
//! ```
//!
//! Values are written the way the binder writes item values, so any codec
//! that carries objects carries deltas too.

use std::sync::Arc;

use prism_path::{ItemPath, QName};
use prism_schema::{ComplexTypeDefinition, SchemaSnapshot};
use tracing::debug;

use super::item_delta::ItemDelta;
use super::object_delta::ObjectDelta;
use super::resolve_item;
use crate::context::PrismContext;
use crate::error::{PrismError, Result};
use crate::model::{Binder, PrismObject, PrismValue, PropertyValue};
use crate::xnode::{MapNode, XNode};

const OBJECT_DELTA: &str = "objectDelta";
const CHANGE_TYPE: &str = "changeType";
const OID: &str = "oid";
const OBJECT_TYPE: &str = "objectType";
const OBJECT_TO_ADD: &str = "objectToAdd";
const ITEM_DELTA: &str = "itemDelta";
const PATH: &str = "path";
const ADD: &str = "add";
const DELETE: &str = "delete";
const REPLACE: &str = "replace";

pub struct DeltaCodec<'a> {
    binder: Binder<'a>,
    snapshot: Arc<SchemaSnapshot>,
}

impl<'a> DeltaCodec<'a> {
    pub fn new(ctx: &'a PrismContext) -> Self {
        Self {
            binder: Binder::new(ctx),
            snapshot: ctx.snapshot(),
        }
    }

    // ── Encoding ───────────────────────────────────────────────────────────

    pub fn encode(&self, delta: &ObjectDelta) -> Result<XNode> {
        let prefixes = self.snapshot.prefixes();
        let mut map = MapNode::new().with(QName::local(CHANGE_TYPE), XNode::text(delta.change_type()));
        if let Some(oid) = delta.oid().filter(|o| !o.is_empty()) {
            map.put(QName::local(OID), XNode::text(oid));
        }
        map.put(
            QName::local(OBJECT_TYPE),
            XNode::text(delta.type_name().to_prefixed(prefixes)),
        );
        match delta {
            ObjectDelta::Add(object) => {
                map.put(QName::local(OBJECT_TO_ADD), self.binder.unbind(object)?);
            }
            ObjectDelta::Modify { modifications, .. } => {
                let object_type = self.object_type(delta.type_name())?;
                let items = modifications
                    .iter()
                    .map(|d| self.encode_item_delta(&object_type, d))
                    .collect::<Result<Vec<_>>>()?;
                map.put(QName::local(ITEM_DELTA), XNode::list(items));
            }
            ObjectDelta::Delete { .. } => {}
        }
        debug!(change_type = delta.change_type(), "encoded delta");
        Ok(XNode::root(QName::local(OBJECT_DELTA), map))
    }

    fn encode_item_delta(
        &self,
        object_type: &Arc<ComplexTypeDefinition>,
        delta: &ItemDelta,
    ) -> Result<XNode> {
        let path = delta.path();
        let mut map = MapNode::new().with(
            QName::local(PATH),
            XNode::text(path.to_prefixed(self.snapshot.prefixes())),
        );
        let sets = [
            (ADD, Some(delta.values_to_add())),
            (DELETE, Some(delta.values_to_delete())),
            (REPLACE, delta.values_to_replace()),
        ];
        for (key, values) in sets {
            let Some(values) = values else { continue };
            if values.is_empty() && key != REPLACE {
                continue;
            }
            let nodes = self.encode_values(object_type, path, values)?;
            map.put(QName::local(key), XNode::list(nodes));
        }
        Ok(XNode::Map(map))
    }

    fn encode_values(
        &self,
        object_type: &Arc<ComplexTypeDefinition>,
        path: &ItemPath,
        values: &[PrismValue],
    ) -> Result<Vec<XNode>> {
        if let Some((owner, def)) = resolve_item(&self.snapshot, object_type, path) {
            return self.binder.unbind_prism_values(&owner, &def, values);
        }
        values
            .iter()
            .map(|value| match value {
                PrismValue::Property(PropertyValue::Raw(node)) => Ok(node.clone()),
                other => Err(PrismError::violation(
                    path,
                    format!("undeclared item with a {} value", other.kind()),
                )),
            })
            .collect()
    }

    // ── Decoding ───────────────────────────────────────────────────────────

    pub fn decode(&self, node: &XNode) -> Result<ObjectDelta> {
        let map = match node.as_root() {
            Some((name, body)) if name.local_part() == OBJECT_DELTA => body.as_map(),
            Some((name, _)) => {
                return Err(PrismError::violation(
                    "",
                    format!("expected {OBJECT_DELTA}, found {name}"),
                ))
            }
            None => node.as_map(),
        }
        .ok_or_else(|| PrismError::violation(OBJECT_DELTA, "expected a map"))?;

        let change_type = text(map, CHANGE_TYPE)?
            .ok_or_else(|| PrismError::violation(OBJECT_DELTA, "missing changeType"))?;
        let type_text = text(map, OBJECT_TYPE)?
            .ok_or_else(|| PrismError::violation(OBJECT_DELTA, "missing objectType"))?;
        let type_name = QName::parse(type_text, self.snapshot.prefixes())?;
        let object_type = self.object_type(&type_name)?;
        let oid = text(map, OID)?.unwrap_or_default().to_string();

        let delta = match change_type {
            ADD => {
                let body = map
                    .get(&QName::local(OBJECT_TO_ADD))
                    .ok_or_else(|| PrismError::violation(OBJECT_TO_ADD, "missing object"))?;
                let mut object = self.decode_object(body, &object_type)?;
                if object.oid().is_none() && !oid.is_empty() {
                    object.set_oid(Some(oid));
                }
                ObjectDelta::add(object)
            }
            "modify" => {
                let mut modifications = Vec::new();
                if let Some(items) = map.get(&QName::local(ITEM_DELTA)) {
                    for item in items.as_values() {
                        modifications.push(self.decode_item_delta(&object_type, item)?);
                    }
                }
                ObjectDelta::modify(oid, type_name, modifications)
            }
            DELETE => ObjectDelta::delete(oid, type_name),
            other => {
                return Err(PrismError::violation(
                    CHANGE_TYPE,
                    format!("unknown change type {other}"),
                ))
            }
        };
        debug!(change_type = delta.change_type(), "decoded delta");
        Ok(delta)
    }

    /// Accepts a root node, a map wrapping the object under its element
    /// name, or a bare object body.
    fn decode_object(
        &self,
        node: &XNode,
        object_type: &Arc<ComplexTypeDefinition>,
    ) -> Result<PrismObject> {
        if node.as_root().is_some() {
            return self.binder.bind_as(node, object_type);
        }
        let map = node
            .as_map()
            .ok_or_else(|| PrismError::violation(OBJECT_TO_ADD, "expected a map"))?;
        if let Some((key, body)) = map.get_single_sub_entry(OBJECT_TO_ADD).ok().flatten() {
            if self.snapshot.find_object_definition_by_element(key).is_some() {
                return self
                    .binder
                    .bind_as(&XNode::root(key.clone(), body.clone()), object_type);
            }
        }
        self.binder.bind_as(node, object_type)
    }

    fn decode_item_delta(
        &self,
        object_type: &Arc<ComplexTypeDefinition>,
        node: &XNode,
    ) -> Result<ItemDelta> {
        let map = node
            .as_map()
            .ok_or_else(|| PrismError::violation(ITEM_DELTA, "expected a map"))?;
        let path_text = text(map, PATH)?
            .ok_or_else(|| PrismError::violation(ITEM_DELTA, "item delta without path"))?;
        let path = ItemPath::parse(path_text, self.snapshot.prefixes())?;
        if let Some(key) = map
            .keys()
            .find(|k| ![PATH, ADD, DELETE, REPLACE].contains(&k.local_part()))
        {
            return Err(PrismError::violation(
                &path,
                format!("unexpected key {key} in item delta"),
            ));
        }
        let resolved = resolve_item(&self.snapshot, object_type, &path);
        let values = |key: &str| -> Result<Option<Vec<PrismValue>>> {
            let Some(node) = map.get(&QName::local(key)) else {
                return Ok(None);
            };
            let values = match &resolved {
                Some((owner, def)) => self.binder.bind_values(owner, def, node, &path)?,
                None => node
                    .as_values()
                    .iter()
                    .map(|n| PropertyValue::Raw(n.clone()).into())
                    .collect(),
            };
            Ok(Some(values))
        };
        let mut delta = ItemDelta::new(path.clone());
        if let Some(replace) = values(REPLACE)? {
            delta.set_replace(replace);
        }
        if let Some(add) = values(ADD)? {
            delta.add_values(add);
        }
        if let Some(delete) = values(DELETE)? {
            delta.delete_values(delete);
        }
        delta.validate()?;
        Ok(delta)
    }

    fn object_type(&self, name: &QName) -> Result<Arc<ComplexTypeDefinition>> {
        self.snapshot
            .find_object_definition_by_type(name)
            .cloned()
            .ok_or_else(|| PrismError::unresolved(OBJECT_TYPE, name))
    }
}

fn text<'m>(map: &'m MapNode, key: &str) -> Result<Option<&'m str>> {
    match map.get(&QName::local(key)) {
        None => Ok(None),
        Some(node) => node
            .as_text()
            .map(Some)
            .ok_or_else(|| PrismError::mismatch(key, "text", node.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::test_support::{ctx, user_object};
    use crate::model::{ContainerValue, ReferenceValue};

    fn round_trip(ctx: &PrismContext, delta: &ObjectDelta) -> ObjectDelta {
        let codec = DeltaCodec::new(ctx);
        codec.decode(&codec.encode(delta).unwrap()).unwrap()
    }

    #[test]
    fn modify_round_trip() {
        let ctx = ctx();
        let user = user_object("u1", "jack");
        let delta = ObjectDelta::modify(
            "u1",
            user.type_name().clone(),
            vec![
                ItemDelta::replace(ItemPath::from_names(&["description"]), vec!["x".into()]),
                ItemDelta::add(
                    ItemPath::from_names(&["linkRef"]),
                    vec![ReferenceValue::new("s1").into()],
                ),
                ItemDelta::delete(
                    ItemPath::from_names(&["assignment"]),
                    vec![ContainerValue::with_id(Some(3)).into()],
                ),
                ItemDelta::replace(ItemPath::from_names(&["fullName"]), vec![]),
            ],
        );
        let decoded = round_trip(&ctx, &delta);
        assert_eq!(decoded.modifications().len(), 4);
        assert_eq!(
            decoded.modifications()[3].values_to_replace(),
            Some(&[][..])
        );
        let mut a = user.clone();
        let mut b = user;
        delta.apply_to(&ctx, &mut a).unwrap();
        decoded.apply_to(&ctx, &mut b).unwrap();
        assert!(a.equivalent(&b, &ctx));
    }

    #[test]
    fn add_and_delete_round_trip() {
        let ctx = ctx();
        let user = user_object("u1", "jack");
        let add = ObjectDelta::add(user.clone());
        let decoded = round_trip(&ctx, &add);
        let ObjectDelta::Add(object) = &decoded else {
            panic!("expected add");
        };
        assert!(object.equivalent(&user, &ctx));

        let delete = ObjectDelta::delete("u1", user.type_name().clone());
        assert_eq!(round_trip(&ctx, &delete), delete);
    }

    #[test]
    fn object_to_add_may_be_wrapped_in_a_map() {
        let ctx = ctx();
        let codec = DeltaCodec::new(&ctx);
        let user = user_object("u1", "jack");
        let XNode::Root(element, body) = codec.binder.unbind(&user).unwrap() else {
            panic!("expected root");
        };
        let node = XNode::root(
            QName::local(OBJECT_DELTA),
            MapNode::new()
                .with(QName::local(CHANGE_TYPE), XNode::text("add"))
                .with(QName::local(OBJECT_TYPE), XNode::text("c:UserType"))
                .with(
                    QName::local(OBJECT_TO_ADD),
                    XNode::Map(MapNode::new().with(element, *body)),
                ),
        );
        let decoded = codec.decode(&node).unwrap();
        assert_eq!(decoded.oid(), Some("u1"));
    }

    #[test]
    fn unknown_change_type_is_rejected() {
        let ctx = ctx();
        let node = XNode::root(
            QName::local(OBJECT_DELTA),
            MapNode::new()
                .with(QName::local(CHANGE_TYPE), XNode::text("rename"))
                .with(QName::local(OBJECT_TYPE), XNode::text("c:UserType")),
        );
        assert!(matches!(
            DeltaCodec::new(&ctx).decode(&node),
            Err(PrismError::SchemaViolation { .. })
        ));
    }
}
