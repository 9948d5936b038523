//! Binding between XNode trees and typed objects.
//!
//! An object document is a root node named by the object's element, wrapping
//! a map. `oid` and `version` sit beside the declared items; container values
//! carry their `id` the same way.
//!
//! ```text
//! ROOT user
//!   MAP
//!     oid: PRIM "c0c010c0-..."
//!     name: MAP { orig: "Jack", norm: "jack" }
//!     assignment: LIST [ MAP { id: 1, description: "..." } ]
//! ```

use std::sync::Arc;

use prism_path::{ItemPath, QName};
use prism_schema::{ComplexTypeDefinition, ItemDefinition, ItemKind, PrimitiveType, SchemaSnapshot};
use tracing::debug;

use super::item::Item;
use super::object::PrismObject;
use super::value::{ContainerValue, PrismValue, PropertyValue, ReferenceValue};
use crate::context::PrismContext;
use crate::error::{value_trail, PrismError, Result};
use crate::value::{PolyString, PrimitiveValue};
use crate::xnode::{MapNode, RawValue, XNode};

const OID: &str = "oid";
const VERSION: &str = "version";
const ID: &str = "id";
const REF_TYPE: &str = "type";
const REF_RELATION: &str = "relation";
const ORIG: &str = "orig";
const NORM: &str = "norm";

/// Binds documents against the schema snapshot current at construction.
pub struct Binder<'a> {
    ctx: &'a PrismContext,
    snapshot: Arc<SchemaSnapshot>,
}

impl<'a> Binder<'a> {
    pub fn new(ctx: &'a PrismContext) -> Self {
        Self {
            ctx,
            snapshot: ctx.snapshot(),
        }
    }

    pub fn snapshot(&self) -> &SchemaSnapshot {
        &self.snapshot
    }

    // ── XNode → object ─────────────────────────────────────────────────────

    /// Binds an object document; the root element selects the definition.
    pub fn bind(&self, node: &XNode) -> Result<PrismObject> {
        let (element, body) = node.as_root().ok_or_else(|| {
            PrismError::violation("", format!("expected a root node, found {}", node.kind()))
        })?;
        let (item, ty) = self
            .snapshot
            .find_object_definition_by_element(element)
            .ok_or_else(|| PrismError::unresolved("", element))?;
        self.bind_body(item.name.clone(), &ty, body)
    }

    /// Binds against a known object definition. The root wrapper is
    /// optional.
    pub fn bind_as(
        &self,
        node: &XNode,
        definition: &Arc<ComplexTypeDefinition>,
    ) -> Result<PrismObject> {
        match node.as_root() {
            Some((element, body)) => self.bind_body(element.clone(), definition, body),
            None => {
                let element = self
                    .snapshot
                    .element_for_type(&definition.name)
                    .map(|e| e.name.clone())
                    .ok_or_else(|| PrismError::unresolved("", &definition.name))?;
                self.bind_body(element, definition, node)
            }
        }
    }

    fn bind_body(
        &self,
        element: QName,
        ty: &Arc<ComplexTypeDefinition>,
        body: &XNode,
    ) -> Result<PrismObject> {
        debug!(element = %element, object_type = %ty.name, "binding object");
        let map = body.as_map().ok_or_else(|| {
            PrismError::violation(&element, format!("expected a map, found {}", body.kind()))
        })?;
        let mut object = PrismObject::new(element, Arc::clone(ty));
        if let Some(oid) = map.get(&QName::local(OID)) {
            object.set_oid(Some(scalar(oid, OID)?.to_string()));
        }
        if let Some(version) = map.get(&QName::local(VERSION)) {
            object.set_version(Some(scalar(version, VERSION)?.to_string()));
        }
        *object.root_mut() = self.bind_items(map, ty, &ItemPath::empty(), &[OID, VERSION])?;
        Ok(object)
    }

    /// Binds the values of one item, as found under its key.
    pub fn bind_values(
        &self,
        owner: &ComplexTypeDefinition,
        definition: &ItemDefinition,
        node: &XNode,
        path: &ItemPath,
    ) -> Result<Vec<PrismValue>> {
        let mut values = Vec::new();
        let nodes = node.as_values().iter().filter(|n| !is_null(n));
        for (i, n) in nodes.enumerate() {
            let trail = value_trail(path, i);
            let value: PrismValue = match &definition.kind {
                ItemKind::Property { primitive } => {
                    self.bind_property(*primitive, n, &trail)?.into()
                }
                ItemKind::Reference { .. } => self.bind_reference(n, &trail)?.into(),
                ItemKind::Container => {
                    let child = self
                        .snapshot
                        .container_type_for(owner, definition)
                        .ok_or_else(|| PrismError::unresolved(path, &definition.type_name))?;
                    self.bind_container_value(n, &child, path, &trail)?.into()
                }
            };
            values.push(value);
        }
        Ok(values)
    }

    fn bind_items(
        &self,
        map: &MapNode,
        ty: &ComplexTypeDefinition,
        path: &ItemPath,
        reserved: &[&str],
    ) -> Result<ContainerValue> {
        let mut value = ContainerValue::new();
        for (key, node) in map.entries() {
            if !key.is_qualified() && reserved.contains(&key.local_part()) {
                continue;
            }
            let item_path = path.child(key.clone());
            match ty.find_item(key) {
                Some(def) => {
                    let values = self.bind_values(ty, def, node, &item_path)?;
                    if !def.max_occurs.allows(values.len()) {
                        return Err(PrismError::violation(
                            value_trail(&item_path, values.len() - 1),
                            format!("{} values exceed maxOccurs {}", values.len(), def.max_occurs),
                        ));
                    }
                    if !values.is_empty() {
                        value.add_item(Item::with_values(def, values)?)?;
                    }
                }
                None if self.ctx.config().binding.raw_passthrough => {
                    let mut item = Item::undeclared(key.clone());
                    for n in node.as_values() {
                        item.push(PropertyValue::Raw(n.clone()).into())?;
                    }
                    value.add_item(item)?;
                }
                None => return Err(PrismError::violation(item_path, "unknown item")),
            }
        }
        if let Some(missing) = ty
            .items
            .iter()
            .find(|d| d.is_mandatory() && value.find_item(&d.name).is_none())
        {
            return Err(PrismError::violation(
                path.child(missing.name.clone()),
                format!("missing mandatory item (minOccurs {})", missing.min_occurs),
            ));
        }
        Ok(value)
    }

    fn bind_container_value(
        &self,
        node: &XNode,
        ty: &ComplexTypeDefinition,
        path: &ItemPath,
        trail: &str,
    ) -> Result<ContainerValue> {
        let map = node
            .as_map()
            .ok_or_else(|| PrismError::mismatch(trail, &ty.name, node.kind()))?;
        let id = match map.get(&QName::local(ID)) {
            Some(n) => {
                let text = scalar(n, trail)?;
                Some(
                    text.parse::<u64>()
                        .map_err(|_| PrismError::mismatch(trail, "container id", text))?,
                )
            }
            None => None,
        };
        let path = match id {
            Some(id) => path.child(id),
            None => path.clone(),
        };
        let mut value = self.bind_items(map, ty, &path, &[ID])?;
        value.set_id(id);
        Ok(value)
    }

    fn bind_property(&self, primitive: PrimitiveType, node: &XNode, trail: &str) -> Result<PropertyValue> {
        match node {
            XNode::Primitive(p) => PrimitiveValue::parse(
                &p.value,
                primitive,
                self.ctx.normalizer(),
                self.snapshot.prefixes(),
            )
            .map(PropertyValue::Primitive)
            .map_err(|raw| PrismError::mismatch(trail, primitive, raw)),
            XNode::Map(m) if primitive == PrimitiveType::PolyString => {
                let orig = m
                    .get(&QName::local(ORIG))
                    .and_then(XNode::as_text)
                    .ok_or_else(|| PrismError::mismatch(trail, primitive, "map without orig"))?;
                let value = match m.get(&QName::local(NORM)).and_then(XNode::as_text) {
                    Some(norm) => PolyString::from_parts(orig, norm),
                    None => self.ctx.poly_string(orig),
                };
                Ok(PropertyValue::Primitive(value.into()))
            }
            other => Err(PrismError::mismatch(trail, primitive, other.kind())),
        }
    }

    fn bind_reference(&self, node: &XNode, trail: &str) -> Result<ReferenceValue> {
        let map = match node {
            XNode::Primitive(_) => return Ok(ReferenceValue::new(scalar(node, trail)?)),
            XNode::Map(m) => m,
            other => return Err(PrismError::mismatch(trail, "reference", other.kind())),
        };
        if let Some(key) = map
            .keys()
            .find(|k| ![OID, REF_TYPE, REF_RELATION].contains(&k.local_part()))
        {
            return Err(PrismError::violation(
                trail,
                format!("unexpected key {key} in reference"),
            ));
        }
        let oid = map
            .get(&QName::local(OID))
            .ok_or_else(|| PrismError::violation(trail, "reference without oid"))?;
        let mut reference = ReferenceValue::new(scalar(oid, trail)?);
        if let Some(t) = map.get(&QName::local(REF_TYPE)) {
            reference = reference.with_target_type(self.qname(t, trail)?);
        }
        if let Some(r) = map.get(&QName::local(REF_RELATION)) {
            reference = reference.with_relation(self.qname(r, trail)?);
        }
        Ok(reference)
    }

    fn qname(&self, node: &XNode, trail: &str) -> Result<QName> {
        let text = scalar(node, trail)?;
        QName::parse(text, self.snapshot.prefixes())
            .map_err(|_| PrismError::mismatch(trail, PrimitiveType::QName, text))
    }

    // ── object → XNode ─────────────────────────────────────────────────────

    /// Serializes an object: `oid`, `version`, then items in declaration
    /// order, undeclared items last.
    pub fn unbind(&self, object: &PrismObject) -> Result<XNode> {
        debug!(
            element = %object.element_name(),
            oid = object.oid().unwrap_or_default(),
            "unbinding object"
        );
        let mut map = MapNode::new();
        if let Some(oid) = object.oid() {
            map.put(QName::local(OID), XNode::text(oid));
        }
        if let Some(version) = object.version() {
            map.put(QName::local(VERSION), XNode::text(version));
        }
        self.unbind_items(object.root(), object.definition(), &mut map)?;
        Ok(XNode::root(object.element_name().clone(), map))
    }

    fn unbind_items(
        &self,
        value: &ContainerValue,
        ty: &ComplexTypeDefinition,
        map: &mut MapNode,
    ) -> Result<()> {
        let mut items: Vec<&Item> = value.items().iter().filter(|i| !i.is_empty()).collect();
        items.sort_by_key(|i| ty.item_position(i.name()).unwrap_or(usize::MAX));
        for item in items {
            let mut nodes = self.unbind_values(ty, item)?;
            let node = if nodes.len() == 1 {
                nodes.remove(0)
            } else {
                XNode::List(nodes)
            };
            map.put(item.name().clone(), node);
        }
        Ok(())
    }

    /// One node per value of `item`.
    pub fn unbind_values(&self, owner: &ComplexTypeDefinition, item: &Item) -> Result<Vec<XNode>> {
        let values = item.to_prism_values();
        match item.definition() {
            Some(def) => self.unbind_prism_values(owner, def, &values),
            None => Ok(values
                .iter()
                .filter_map(PrismValue::as_property)
                .map(|v| self.unbind_property(v))
                .collect()),
        }
    }

    /// One node per value, for values of the item `definition` in `owner`.
    pub fn unbind_prism_values(
        &self,
        owner: &ComplexTypeDefinition,
        definition: &ItemDefinition,
        values: &[PrismValue],
    ) -> Result<Vec<XNode>> {
        values
            .iter()
            .map(|value| match value {
                PrismValue::Property(p) => Ok(self.unbind_property(p)),
                PrismValue::Reference(r) => Ok(self.unbind_reference(r)),
                PrismValue::Container(cv) => {
                    let child = self
                        .snapshot
                        .container_type_for(owner, definition)
                        .ok_or_else(|| {
                            PrismError::unresolved(&definition.name, &definition.type_name)
                        })?;
                    let mut map = MapNode::new();
                    if let Some(id) = cv.id() {
                        map.put(QName::local(ID), XNode::number(id));
                    }
                    self.unbind_items(cv, &child, &mut map)?;
                    Ok(XNode::Map(map))
                }
            })
            .collect()
    }

    fn unbind_property(&self, value: &PropertyValue) -> XNode {
        match value {
            PropertyValue::Raw(node) => node.clone(),
            PropertyValue::Primitive(PrimitiveValue::PolyString(p))
                if self.ctx.config().binding.emit_norm =>
            {
                XNode::Map(
                    MapNode::new()
                        .with(QName::local(ORIG), XNode::text(p.orig()))
                        .with(QName::local(NORM), XNode::text(p.norm())),
                )
            }
            PropertyValue::Primitive(PrimitiveValue::QName(q)) => {
                XNode::text(q.to_prefixed(self.snapshot.prefixes()))
            }
            PropertyValue::Primitive(v) => XNode::primitive(v.to_raw()),
        }
    }

    fn unbind_reference(&self, value: &ReferenceValue) -> XNode {
        let prefixes = self.snapshot.prefixes();
        let mut map = MapNode::new().with(QName::local(OID), XNode::text(value.oid()));
        if let Some(t) = value.target_type() {
            map.put(QName::local(REF_TYPE), XNode::text(t.to_prefixed(prefixes)));
        }
        if let Some(r) = value.relation() {
            map.put(QName::local(REF_RELATION), XNode::text(r.to_prefixed(prefixes)));
        }
        XNode::Map(map)
    }
}

/// Binds an object document. See [`Binder::bind`].
pub fn bind(ctx: &PrismContext, node: &XNode) -> Result<PrismObject> {
    Binder::new(ctx).bind(node)
}

/// Serializes an object. See [`Binder::unbind`].
pub fn unbind(ctx: &PrismContext, object: &PrismObject) -> Result<XNode> {
    Binder::new(ctx).unbind(object)
}

fn is_null(node: &XNode) -> bool {
    matches!(node, XNode::Primitive(p) if p.value == RawValue::Null)
}

fn scalar<'n>(node: &'n XNode, trail: &str) -> Result<&'n str> {
    match node {
        XNode::Primitive(p) => p
            .value
            .as_text()
            .ok_or_else(|| PrismError::mismatch(trail, "scalar", &p.value)),
        other => Err(PrismError::mismatch(trail, "scalar", other.kind())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrismConfig;
    use crate::model::test_support::{ctx, user_object};
    use prism_schema::constants::COMMON_NS;

    fn c(local: &str) -> QName {
        QName::new(COMMON_NS, local)
    }

    fn user_doc(body: MapNode) -> XNode {
        XNode::root(c("user"), body)
    }

    #[test]
    fn binds_and_unbinds_in_declared_order() {
        let ctx = ctx();
        let doc = user_doc(
            MapNode::new()
                .with(QName::local("description"), XNode::text("Captain"))
                .with(QName::local("name"), XNode::text("Jack"))
                .with(QName::local("version"), XNode::text("3"))
                .with(QName::local("oid"), XNode::text("u1")),
        );
        let user = bind(&ctx, &doc).unwrap();
        assert_eq!(user.oid(), Some("u1"));
        assert_eq!(user.version(), Some("3"));

        let out = unbind(&ctx, &user).unwrap();
        let (_, body) = out.as_root().unwrap();
        let keys: Vec<&str> = body.as_map().unwrap().keys().map(|k| k.local_part()).collect();
        assert_eq!(keys, ["oid", "version", "name", "description"]);
        assert_eq!(bind(&ctx, &out).unwrap(), user);
    }

    #[test]
    fn poly_string_forms() {
        let ctx = ctx();
        let doc = user_doc(MapNode::new().with(
            QName::local("name"),
            XNode::Map(
                MapNode::new()
                    .with(QName::local("orig"), XNode::text("Bar"))
                    .with(QName::local("norm"), XNode::text("barbar")),
            ),
        ));
        let user = bind(&ctx, &doc).unwrap();
        let name = user.find_item(&ItemPath::from_names(&["name"])).unwrap();
        let ps = name.property_values()[0].as_primitive().unwrap().as_poly_string().unwrap();
        assert_eq!((ps.orig(), ps.norm()), ("Bar", "barbar"));

        let mut config = PrismConfig::default();
        config.binding.emit_norm = false;
        let plain = unbind(&ctx.with_config(config), &user).unwrap();
        let (_, body) = plain.as_root().unwrap();
        assert_eq!(body.as_map().unwrap().get(&QName::local("name")).unwrap().as_text(), Some("Bar"));
    }

    #[test]
    fn references_accept_oid_shorthand() {
        let ctx = ctx();
        let doc = user_doc(MapNode::new().with(
            QName::local("linkRef"),
            XNode::list(vec![
                XNode::text("s1"),
                XNode::Map(
                    MapNode::new()
                        .with(QName::local("oid"), XNode::text("s2"))
                        .with(QName::local("type"), XNode::text("c:ShadowType")),
                ),
            ]),
        ));
        let user = bind(&ctx, &doc).unwrap();
        let refs = user
            .find_item(&ItemPath::from_names(&["linkRef"]))
            .unwrap()
            .reference_values()
            .to_vec();
        assert_eq!(refs[0], ReferenceValue::new("s1"));
        assert_eq!(refs[1].target_type(), Some(&c("ShadowType")));
    }

    #[test]
    fn container_ids_and_trails() {
        let ctx = ctx();
        let doc = user_doc(MapNode::new().with(
            QName::local("assignment"),
            XNode::list(vec![
                XNode::Map(MapNode::new().with(QName::local("id"), XNode::number(1))),
                XNode::Map(
                    MapNode::new()
                        .with(QName::local("id"), XNode::number(2))
                        .with(QName::local("order"), XNode::text("first")),
                ),
            ]),
        ));
        let err = bind(&ctx, &doc).unwrap_err();
        match err {
            PrismError::TypeMismatch { path, expected, raw } => {
                assert_eq!(path, "assignment/2/order[0]");
                assert_eq!(expected, "integer");
                assert_eq!(raw, "\"first\"");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn cardinality_and_unknown_keys() {
        let ctx = ctx();
        let two_names = user_doc(MapNode::new().with(
            QName::local("description"),
            XNode::list(vec![XNode::text("a"), XNode::text("b")]),
        ));
        assert!(matches!(
            bind(&ctx, &two_names),
            Err(PrismError::SchemaViolation { .. })
        ));

        let unknown = user_doc(MapNode::new().with(QName::local("shoeSize"), XNode::number(9)));
        let err = bind(&ctx, &unknown).unwrap_err();
        assert_eq!(err.path(), Some("shoeSize"));

        let mut config = PrismConfig::default();
        config.binding.raw_passthrough = true;
        let lenient = ctx.with_config(config);
        let user = bind(&lenient, &unknown).unwrap();
        let out = unbind(&lenient, &user).unwrap();
        assert_eq!(out, unknown);
    }

    #[test]
    fn unknown_root_element() {
        let ctx = ctx();
        let doc = XNode::root(QName::local("spaceship"), MapNode::new());
        assert!(matches!(
            bind(&ctx, &doc),
            Err(PrismError::UnresolvedReference { .. })
        ));
    }

    #[test]
    fn object_round_trip_helper() {
        let ctx = ctx();
        let user = user_object("u1", "jack");
        let node = unbind(&ctx, &user).unwrap();
        assert!(bind(&ctx, &node).unwrap().equivalent(&user, &ctx));
    }
}
