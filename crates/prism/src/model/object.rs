//! Prism objects and path navigation.

use std::sync::Arc;

use prism_path::{ItemPath, PathSegment, QName};
use prism_schema::{ComplexTypeDefinition, ItemDefinition, SchemaSnapshot};
use prism_util::{CloneStrategy, Cloneable};

use super::item::Item;
use super::value::{ContainerValue, PrismValue};
use crate::context::PrismContext;
use crate::error::{PrismError, Result};

/// A persisted entity: an OID, a version and a root container value typed by
/// an object definition.
#[derive(Debug, Clone)]
pub struct PrismObject {
    element_name: QName,
    definition: Arc<ComplexTypeDefinition>,
    oid: Option<String>,
    version: Option<String>,
    root: ContainerValue,
}

impl PrismObject {
    pub fn new(element_name: QName, definition: Arc<ComplexTypeDefinition>) -> Self {
        Self {
            element_name,
            definition,
            oid: None,
            version: None,
            root: ContainerValue::new(),
        }
    }

    /// An empty object for a root element name such as `user`.
    pub fn instantiate(snapshot: &SchemaSnapshot, element: &QName) -> Result<Self> {
        let (item, ty) = snapshot
            .find_object_definition_by_element(element)
            .ok_or_else(|| PrismError::unresolved("", element))?;
        Ok(Self::new(item.name.clone(), ty))
    }

    pub fn element_name(&self) -> &QName {
        &self.element_name
    }

    pub fn definition(&self) -> &Arc<ComplexTypeDefinition> {
        &self.definition
    }

    pub fn type_name(&self) -> &QName {
        &self.definition.name
    }

    pub fn oid(&self) -> Option<&str> {
        self.oid.as_deref()
    }

    pub fn set_oid(&mut self, oid: Option<String>) {
        self.oid = oid;
    }

    pub fn with_oid(mut self, oid: impl Into<String>) -> Self {
        self.oid = Some(oid.into());
        self
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn set_version(&mut self, version: Option<String>) {
        self.version = version;
    }

    pub fn root(&self) -> &ContainerValue {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ContainerValue {
        &mut self.root
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    /// The item at `path`. Id segments select container values; a name
    /// directly following another name descends into a single-valued
    /// container.
    pub fn find_item(&self, path: &ItemPath) -> Option<&Item> {
        let name = path.last().and_then(PathSegment::as_name)?;
        let parent = self.find_container_value(&path.parent())?;
        parent.find_item(name)
    }

    pub fn find_item_mut(&mut self, path: &ItemPath) -> Option<&mut Item> {
        let name = path.last().and_then(PathSegment::as_name)?.clone();
        let mut current = &mut self.root;
        for step in steps(&path.parent()).ok()? {
            current = current
                .find_item_mut(step.name)?
                .find_container_value_mut(step.id)?;
        }
        current.find_item_mut(&name)
    }

    /// The container value at `path`; the empty path is the root.
    pub fn find_container_value(&self, path: &ItemPath) -> Option<&ContainerValue> {
        let mut current = &self.root;
        for step in steps(path).ok()? {
            current = current.find_item(step.name)?.find_container_value(step.id)?;
        }
        Some(current)
    }

    /// Replaces the values of the item at `path`, creating missing parent
    /// containers. An empty `values` removes the item. On error the object
    /// is left as it was.
    pub fn set_item_values(
        &mut self,
        ctx: &PrismContext,
        path: &ItemPath,
        values: Vec<PrismValue>,
    ) -> Result<()> {
        let snapshot = ctx.snapshot();
        let undeclared = ctx.config().binding.raw_passthrough;
        let mut root = self.root.clone();
        if let Some(slot) = slot_in(&mut root, &self.definition, &snapshot, path, true, undeclared)? {
            slot.replace(values)?;
        }
        self.root = root;
        Ok(())
    }

    /// Resolves the parent container value of the item at `path`.
    ///
    /// With `create`, missing container items and values along the way are
    /// created from their definitions. Without it, a missing parent yields
    /// `None`. The final item must be declared, or already present, unless
    /// `undeclared` allows raw items.
    pub(crate) fn slot_mut(
        &mut self,
        snapshot: &SchemaSnapshot,
        path: &ItemPath,
        create: bool,
        undeclared: bool,
    ) -> Result<Option<Slot<'_>>> {
        slot_in(&mut self.root, &self.definition, snapshot, path, create, undeclared)
    }

    /// Equality that ignores the version and applies matching rules.
    pub fn equivalent(&self, other: &PrismObject, ctx: &PrismContext) -> bool {
        super::equivalence::Equivalence::new(ctx).object(self, other)
    }
}

/// Structural equality, version included.
impl PartialEq for PrismObject {
    fn eq(&self, other: &Self) -> bool {
        self.definition.name == other.definition.name
            && self.oid == other.oid
            && self.version == other.version
            && self.root == other.root
    }
}

impl Cloneable for PrismObject {
    fn strategy(&self) -> CloneStrategy {
        CloneStrategy::SelfCloning
    }

    fn self_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}

/// Where an item lands: its parent container value and its definition.
pub(crate) struct Slot<'a> {
    pub path: ItemPath,
    pub name: QName,
    pub definition: Option<Arc<ItemDefinition>>,
    pub container: &'a mut ContainerValue,
}

impl Slot<'_> {
    pub fn item(&self) -> Option<&Item> {
        self.container.find_item(&self.name)
    }

    pub fn current_values(&self) -> Vec<PrismValue> {
        self.item().map(Item::to_prism_values).unwrap_or_default()
    }

    /// Stores `values` as the item's values, dropping the item when empty.
    pub fn replace(self, values: Vec<PrismValue>) -> Result<()> {
        if values.is_empty() {
            self.container.remove_item(&self.name);
            return Ok(());
        }
        let mut item = match (self.container.find_item(&self.name), &self.definition) {
            (Some(existing), _) => existing.clone(),
            (None, Some(def)) => Item::new(def),
            (None, None) => Item::undeclared(self.name.clone()),
        };
        item.set_values(values).map_err(|e| match e {
            PrismError::SchemaViolation { message, .. } => PrismError::violation(&self.path, message),
            other => other,
        })?;
        match self.container.find_item_mut(&self.name) {
            Some(slot) => *slot = item,
            None => self.container.add_item(item)?,
        }
        Ok(())
    }
}

/// [`PrismObject::slot_mut`] over a root value typed by `definition`.
fn slot_in<'a>(
    root: &'a mut ContainerValue,
    definition: &Arc<ComplexTypeDefinition>,
    snapshot: &SchemaSnapshot,
    path: &ItemPath,
    create: bool,
    undeclared: bool,
) -> Result<Option<Slot<'a>>> {
    let Some(PathSegment::Name(name)) = path.last() else {
        return Err(PrismError::IllegalArgument(format!(
            "path '{path}' does not end with an item name"
        )));
    };
    let name = name.clone();
    let mut owner = Arc::clone(definition);
    let mut current = root;
    let mut walked = ItemPath::empty();
    for step in steps(&path.parent())? {
        walked.push(step.name.clone());
        let def = owner
            .find_item(step.name)
            .cloned()
            .ok_or_else(|| PrismError::violation(&walked, "unknown item"))?;
        let child_type = snapshot
            .container_type_for(&owner, &def)
            .ok_or_else(|| PrismError::violation(&walked, "not a container"))?;
        if let Some(id) = step.id {
            walked.push(id);
        }
        if current.find_item(step.name).is_none() {
            if !create {
                return Ok(None);
            }
            current.add_item(Item::new(&def))?;
        }
        let item = current
            .find_item_mut(step.name)
            .ok_or_else(|| PrismError::violation(&walked, "unknown item"))?;
        if item.find_container_value(step.id).is_none() {
            if !create {
                return Ok(None);
            }
            if step.id.is_none() && !item.is_empty() {
                return Err(PrismError::violation(
                    &walked,
                    "multi-valued container addressed without an id",
                ));
            }
            if !def.max_occurs.allows(item.len() + 1) {
                return Err(PrismError::violation(
                    &walked,
                    format!("{} values exceed maxOccurs {}", item.len() + 1, def.max_occurs),
                ));
            }
            item.push(ContainerValue::with_id(step.id).into())?;
        }
        current = item
            .find_container_value_mut(step.id)
            .ok_or_else(|| PrismError::violation(&walked, "missing container value"))?;
        owner = child_type;
    }
    let definition = owner.find_item(&name).cloned();
    if definition.is_none() && !undeclared && current.find_item(&name).is_none() {
        return Err(PrismError::violation(path, "unknown item"));
    }
    Ok(Some(Slot {
        path: path.clone(),
        name,
        definition,
        container: current,
    }))
}

struct Step<'p> {
    name: &'p QName,
    id: Option<u64>,
}

/// Splits a container path into name steps, each with an optional id.
fn steps(path: &ItemPath) -> Result<Vec<Step<'_>>> {
    let mut out: Vec<Step<'_>> = Vec::new();
    for seg in path.segments() {
        match seg {
            PathSegment::Name(name) => out.push(Step { name, id: None }),
            PathSegment::Id(id) => match out.last_mut() {
                Some(step) if step.id.is_none() => step.id = Some(*id),
                _ => {
                    return Err(PrismError::IllegalArgument(format!(
                        "id {id} does not follow an item name in '{path}'"
                    )))
                }
            },
        }
    }
    Ok(out)
}
