//! Schema registry with atomic snapshot publication.
//!
//! # Lifecycle
//!
//! 1. Bootstrap: built-in sources are registered in fixed order
//!    (structural types, query types, common object types), then deployment
//!    extension sources. See [`SchemaRegistry::bootstrap`].
//! 2. Serving: the registry is sealed and read-mostly. Reads load the current
//!    [`SchemaSnapshot`] without locking. A later [`SchemaRegistry::register`]
//!    builds a new snapshot from a copy of the current one and swaps it in, so
//!    readers observe either the old or the new state, never a mix.
//!
//! Within one source, base types and container item types must be declared
//! before they are used. Forward references inside a batch are rejected with
//! [`SchemaError::UnresolvedType`] / [`SchemaError::UnresolvedBase`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use prism_path::{PrefixMap, QName};
use tracing::{debug, info};

use crate::builtin::builtin_sources;
use crate::constants::{default_prefixes, extension_type};
use crate::definition::{
    ComplexTypeDefinition, Definition, ItemDefinition, ItemKind, Occurs, PrimitiveType,
    SimpleTypeDefinition,
};
use crate::source::{ComplexTypeSource, ItemSource, MaxOccursSource, SchemaSource};
use crate::SchemaError;

// ── Snapshot ──────────────────────────────────────────────────────────────

/// Immutable view of every definition registered so far.
#[derive(Debug, Clone, Default)]
pub struct SchemaSnapshot {
    types: IndexMap<QName, Definition>,
    elements: IndexMap<QName, Arc<ItemDefinition>>,
    /// Object type name -> merged extension container type.
    extensions: IndexMap<QName, Arc<ComplexTypeDefinition>>,
    namespaces: Vec<String>,
    prefixes: PrefixMap,
}

impl SchemaSnapshot {
    /// Exact lookup; an unqualified name matches the first type with that
    /// local part.
    pub fn find_type_definition(&self, name: &QName) -> Option<&Definition> {
        self.types.get(name).or_else(|| {
            if name.is_qualified() {
                None
            } else {
                self.types.values().find(|d| d.name().matches(name))
            }
        })
    }

    pub fn find_complex_type(&self, name: &QName) -> Option<&Arc<ComplexTypeDefinition>> {
        self.find_type_definition(name).and_then(Definition::as_complex)
    }

    /// Global element declaration by element name.
    pub fn find_property_definition_by_element_name(
        &self,
        name: &QName,
    ) -> Option<&Arc<ItemDefinition>> {
        self.elements.get(name).or_else(|| {
            if name.is_qualified() {
                None
            } else {
                self.elements.values().find(|d| d.name.matches(name))
            }
        })
    }

    /// Element and object type for a root element name.
    pub fn find_object_definition_by_element(
        &self,
        element: &QName,
    ) -> Option<(Arc<ItemDefinition>, Arc<ComplexTypeDefinition>)> {
        let item = self.find_property_definition_by_element_name(element)?;
        let ty = self.find_complex_type(&item.type_name)?;
        ty.object.then(|| (Arc::clone(item), Arc::clone(ty)))
    }

    pub fn find_object_definition_by_type(
        &self,
        type_name: &QName,
    ) -> Option<&Arc<ComplexTypeDefinition>> {
        self.find_complex_type(type_name).filter(|t| t.object)
    }

    /// The first global element declared with the given type.
    pub fn element_for_type(&self, type_name: &QName) -> Option<&Arc<ItemDefinition>> {
        self.elements.values().find(|e| e.type_name == *type_name)
    }

    /// Merged extension definition for an object type or its nearest
    /// ancestor that has one.
    pub fn extension_definition(
        &self,
        object_type: &ComplexTypeDefinition,
    ) -> Option<&Arc<ComplexTypeDefinition>> {
        std::iter::once(&object_type.name)
            .chain(object_type.ancestors.iter())
            .find_map(|n| self.extensions.get(n))
    }

    /// Type of the values of container item `item` declared in `owner`.
    ///
    /// The generic `extension` container resolves to the merged extension
    /// definition of the owning object type, when one is registered.
    pub fn container_type_for(
        &self,
        owner: &ComplexTypeDefinition,
        item: &ItemDefinition,
    ) -> Option<Arc<ComplexTypeDefinition>> {
        if !item.is_container() {
            return None;
        }
        if item.type_name == extension_type() {
            if let Some(ext) = self.extension_definition(owner) {
                return Some(Arc::clone(ext));
            }
        }
        self.find_complex_type(&item.type_name).cloned()
    }

    /// Target namespaces in registration order.
    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }

    /// All prefixes declared by registered sources, built-ins first.
    pub fn prefixes(&self) -> &PrefixMap {
        &self.prefixes
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> impl Iterator<Item = &Definition> {
        self.types.values()
    }
}

// ── Registry ──────────────────────────────────────────────────────────────

/// Process-wide catalog of type and element definitions.
#[derive(Debug)]
pub struct SchemaRegistry {
    snapshot: ArcSwap<SchemaSnapshot>,
    writer: Mutex<()>,
    sealed: AtomicBool,
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaRegistry {
    /// An empty, unsealed registry.
    pub fn new() -> Self {
        let snapshot = SchemaSnapshot {
            prefixes: default_prefixes(),
            ..SchemaSnapshot::default()
        };
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(()),
            sealed: AtomicBool::new(false),
        }
    }

    /// Registers the built-in sources, then `extensions` in the given order,
    /// and seals the registry.
    pub fn bootstrap<I>(extensions: I) -> Result<Self, SchemaError>
    where
        I: IntoIterator<Item = SchemaSource>,
    {
        let registry = Self::new();
        for source in builtin_sources()? {
            registry.register(&source)?;
        }
        for source in extensions {
            registry.register(&source)?;
        }
        registry.seal();
        Ok(registry)
    }

    /// Ingests one source. On error the registry is left unchanged.
    pub fn register(&self, source: &SchemaSource) -> Result<(), SchemaError> {
        let _guard = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        let current = self.snapshot.load_full();
        let mut next = (*current).clone();
        Registration::new(&mut next, source).run()?;

        if self.is_sealed() {
            info!(namespace = %source.namespace, "registering schema after bootstrap");
        }
        debug!(
            namespace = %source.namespace,
            complex_types = source.complex_types.len(),
            simple_types = source.simple_types.len(),
            elements = source.elements.len(),
            total_types = next.type_count(),
            "schema registered"
        );
        self.snapshot.store(Arc::new(next));
        Ok(())
    }

    /// Ends the bootstrap phase. Registration stays possible afterwards.
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }

    /// The current snapshot. Hold it to get a consistent view across several
    /// lookups.
    pub fn snapshot(&self) -> Arc<SchemaSnapshot> {
        self.snapshot.load_full()
    }

    pub fn find_type_definition(&self, name: &QName) -> Option<Definition> {
        self.snapshot.load().find_type_definition(name).cloned()
    }

    pub fn find_property_definition_by_element_name(
        &self,
        name: &QName,
    ) -> Option<Arc<ItemDefinition>> {
        self.snapshot
            .load()
            .find_property_definition_by_element_name(name)
            .cloned()
    }
}

// ── Registration ──────────────────────────────────────────────────────────

struct Registration<'a> {
    snap: &'a mut SchemaSnapshot,
    source: &'a SchemaSource,
    prefixes: PrefixMap,
}

impl<'a> Registration<'a> {
    fn new(snap: &'a mut SchemaSnapshot, source: &'a SchemaSource) -> Self {
        let mut prefixes = source.prefixes.clone();
        prefixes.extend(&default_prefixes());
        Self {
            snap,
            source,
            prefixes,
        }
    }

    fn run(mut self) -> Result<(), SchemaError> {
        let source = self.source;
        if source.namespace.is_empty() {
            return Err(SchemaError::MissingNamespace);
        }
        for simple in &source.simple_types {
            let name = self.resolve(&simple.name)?;
            self.ensure_new_type(&name)?;
            let kind = match (simple.primitive, simple.reference) {
                (Some(primitive), false) => ItemKind::Property { primitive },
                (None, true) => ItemKind::Reference { target_type: None },
                _ => return Err(SchemaError::InvalidSimpleType(name)),
            };
            let matching_rule = simple
                .matching_rule
                .as_deref()
                .map(|r| self.resolve(r))
                .transpose()?;
            let def = SimpleTypeDefinition {
                name: name.clone(),
                kind,
                matching_rule,
            };
            self.snap.types.insert(name, Definition::Simple(Arc::new(def)));
        }

        for complex in &source.complex_types {
            self.register_complex(complex)?;
        }

        for element in &source.elements {
            let name = self.resolve(&element.name)?;
            if self.snap.elements.contains_key(&name) {
                return Err(SchemaError::DuplicateElement(name));
            }
            let type_name = self.resolve(&element.type_name)?;
            let (kind, matching_rule) = self.resolve_kind(&type_name, None, None, &name)?;
            let def = ItemDefinition {
                name: name.clone(),
                type_name,
                kind,
                min_occurs: 1,
                max_occurs: Occurs::Bounded(1),
                matching_rule,
            };
            self.snap.elements.insert(name, Arc::new(def));
        }

        if !self.snap.namespaces.contains(&source.namespace) {
            self.snap.namespaces.push(source.namespace.clone());
        }
        self.snap.prefixes.extend(&source.prefixes);
        Ok(())
    }

    fn register_complex(&mut self, complex: &ComplexTypeSource) -> Result<(), SchemaError> {
        let name = self.resolve(&complex.name)?;
        self.ensure_new_type(&name)?;

        let mut items: Vec<Arc<ItemDefinition>> = Vec::new();
        let mut ancestors = Vec::new();
        let mut object = complex.object;
        let base = match &complex.base {
            Some(text) => {
                let base = self.resolve(text)?;
                let base_def = self.snap.find_complex_type(&base).ok_or_else(|| {
                    SchemaError::UnresolvedBase {
                        type_name: name.clone(),
                        base: base.clone(),
                    }
                })?;
                items.extend(base_def.items.iter().cloned());
                ancestors.push(base_def.name.clone());
                ancestors.extend(base_def.ancestors.iter().cloned());
                object |= base_def.object;
                Some(base_def.name.clone())
            }
            None => None,
        };

        for item in &complex.items {
            let def = self.item_definition(item, &name)?;
            if items.iter().any(|d| d.name == def.name) {
                return Err(SchemaError::DuplicateItem {
                    type_name: name.clone(),
                    item: def.name,
                });
            }
            items.push(Arc::new(def));
        }

        let extension_of = complex
            .extension_of
            .as_deref()
            .map(|t| self.resolve(t))
            .transpose()?;

        let def = Arc::new(ComplexTypeDefinition {
            name: name.clone(),
            base,
            ancestors,
            object,
            extension_of: extension_of.clone(),
            items,
        });

        if let Some(target) = extension_of {
            self.attach_extension(&target, &def)?;
        }
        self.snap.types.insert(name, Definition::Complex(def));
        Ok(())
    }

    fn attach_extension(
        &mut self,
        target: &QName,
        def: &Arc<ComplexTypeDefinition>,
    ) -> Result<(), SchemaError> {
        let target_def = self
            .snap
            .find_object_definition_by_type(target)
            .ok_or_else(|| SchemaError::UnresolvedExtensionTarget(target.clone()))?;
        let key = target_def.name.clone();
        let merged = match self.snap.extensions.get(&key) {
            Some(existing) => {
                let mut merged = (**existing).clone();
                for item in &def.items {
                    if merged.items.iter().any(|d| d.name == item.name) {
                        return Err(SchemaError::DuplicateItem {
                            type_name: key.clone(),
                            item: item.name.clone(),
                        });
                    }
                    merged.items.push(Arc::clone(item));
                }
                Arc::new(merged)
            }
            None => Arc::clone(def),
        };
        debug!(object_type = %key, items = merged.items.len(), "extension attached");
        self.snap.extensions.insert(key, merged);
        Ok(())
    }

    fn item_definition(
        &self,
        item: &ItemSource,
        owner: &QName,
    ) -> Result<ItemDefinition, SchemaError> {
        let name = self.resolve(&item.name)?;
        let type_name = self.resolve(&item.type_name)?;
        let target_type = item
            .target_type
            .as_deref()
            .map(|t| self.resolve(t))
            .transpose()?;
        let explicit_rule = item
            .matching_rule
            .as_deref()
            .map(|r| self.resolve(r))
            .transpose()?;
        let (kind, default_rule) = self.resolve_kind(&type_name, target_type, Some(owner), &name)?;
        let max_occurs = match &item.max_occurs {
            MaxOccursSource::Count(0) => {
                return Err(SchemaError::InvalidOccurs {
                    item: name,
                    value: "0".into(),
                })
            }
            MaxOccursSource::Count(n) => Occurs::Bounded(*n),
            MaxOccursSource::Keyword(k) if k == "unbounded" => Occurs::Unbounded,
            MaxOccursSource::Keyword(k) => {
                return Err(SchemaError::InvalidOccurs {
                    item: name,
                    value: k.clone(),
                })
            }
        };
        if let Occurs::Bounded(max) = max_occurs {
            if item.min_occurs > max {
                return Err(SchemaError::InvalidOccurs {
                    item: name,
                    value: format!("minOccurs {} > maxOccurs {max}", item.min_occurs),
                });
            }
        }
        Ok(ItemDefinition {
            name,
            type_name,
            kind,
            min_occurs: item.min_occurs,
            max_occurs,
            matching_rule: explicit_rule.or(default_rule),
        })
    }

    /// Resolves what kind of item a type name produces, plus the type's
    /// default matching rule.
    fn resolve_kind(
        &self,
        type_name: &QName,
        target_type: Option<QName>,
        owner: Option<&QName>,
        context: &QName,
    ) -> Result<(ItemKind, Option<QName>), SchemaError> {
        if let Some(primitive) = PrimitiveType::from_xsd(type_name) {
            return Ok((ItemKind::Property { primitive }, None));
        }
        match self.snap.find_type_definition(type_name) {
            Some(Definition::Simple(simple)) => {
                let kind = match &simple.kind {
                    ItemKind::Reference { .. } => ItemKind::Reference { target_type },
                    other => other.clone(),
                };
                Ok((kind, simple.matching_rule.clone()))
            }
            Some(Definition::Complex(_)) => Ok((ItemKind::Container, None)),
            None if owner == Some(type_name) => Ok((ItemKind::Container, None)),
            None => Err(SchemaError::UnresolvedType {
                context: context.clone(),
                type_name: type_name.clone(),
            }),
        }
    }

    fn ensure_new_type(&self, name: &QName) -> Result<(), SchemaError> {
        if self.snap.types.contains_key(name) {
            return Err(SchemaError::DuplicateType(name.clone()));
        }
        Ok(())
    }

    /// Parses a name from the source, placing unprefixed names in the
    /// source's target namespace.
    fn resolve(&self, text: &str) -> Result<QName, SchemaError> {
        Ok(QName::parse(text, &self.prefixes)?.qualify(&self.source.namespace))
    }
}
