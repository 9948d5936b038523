//! Ordered map nodes.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use prism_path::QName;
use prism_util::unordered_eq;

use super::XNode;
use crate::error::{PrismError, Result};

/// An ordered list of `(key, value)` entries.
///
/// Key lookup is namespace-aware ([`QName::matches`]). Insertion order is
/// preserved. Equality ignores order; the hash is a commutative fold over
/// entries keyed by local part only, so it agrees with wildcard-namespace
/// key matching.
#[derive(Debug, Clone, Default)]
pub struct MapNode {
    entries: Vec<(QName, XNode)>,
}

impl MapNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`MapNode::put`].
    pub fn with(mut self, key: QName, value: impl Into<XNode>) -> Self {
        self.put(key, value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, key: &QName) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k.matches(key))
    }

    /// First entry whose key matches.
    pub fn get(&self, key: &QName) -> Option<&XNode> {
        self.entries
            .iter()
            .find(|(k, _)| k.matches(key))
            .map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &QName) -> Option<&mut XNode> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k.matches(key))
            .map(|(_, v)| v)
    }

    /// Lookup by local part only.
    pub fn get_local(&self, local: &str) -> Option<&XNode> {
        self.get(&QName::local(local))
    }

    pub fn contains_key(&self, key: &QName) -> bool {
        self.position(key).is_some()
    }

    /// Replaces the value of a matching entry in place, or appends a new
    /// entry. Returns the replaced value.
    pub fn put(&mut self, key: QName, value: XNode) -> Option<XNode> {
        match self.position(&key) {
            Some(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Accumulates repeated keys.
    ///
    /// An absent key is inserted; a present List gets `value` appended; any
    /// other present value becomes the List `[old, value]`.
    ///
    /// ```
    /// use prism::xnode::{MapNode, XNode};
    /// use prism_path::QName;
    ///
    /// let mut map = MapNode::new();
    /// map.merge(QName::local("mail"), XNode::text("a@x"));
    /// map.merge(QName::local("mail"), XNode::text("b@x"));
    /// assert_eq!(
    ///     map.get_local("mail"),
    ///     Some(&XNode::list(vec![XNode::text("a@x"), XNode::text("b@x")]))
    /// );
    /// ```
    pub fn merge(&mut self, key: QName, value: XNode) {
        match self.position(&key) {
            None => self.entries.push((key, value)),
            Some(i) => {
                let slot = &mut self.entries[i].1;
                match slot {
                    XNode::List(items) => items.push(value),
                    _ => {
                        let old = std::mem::replace(slot, XNode::List(Vec::new()));
                        *slot = XNode::List(vec![old, value]);
                    }
                }
            }
        }
    }

    /// Removes and returns the first matching entry.
    pub fn remove(&mut self, key: &QName) -> Option<(QName, XNode)> {
        self.position(key).map(|i| self.entries.remove(i))
    }

    /// Read-only view of the entries. Mutation goes through
    /// [`MapNode::put`], [`MapNode::merge`] and [`MapNode::remove`].
    pub fn entries(&self) -> Entries<'_> {
        Entries {
            entries: &self.entries,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &QName> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub(crate) fn values_mut(&mut self) -> impl Iterator<Item = (&QName, &mut XNode)> {
        self.entries.iter_mut().map(|(k, v)| (&*k, v))
    }

    pub fn into_entries(self) -> Vec<(QName, XNode)> {
        self.entries
    }

    /// The only entry of the map.
    ///
    /// `Ok(None)` when the map is empty, a schema violation mentioning
    /// `context` when there is more than one entry.
    pub fn get_single_sub_entry(&self, context: &str) -> Result<Option<(&QName, &XNode)>> {
        match self.entries.as_slice() {
            [] => Ok(None),
            [(k, v)] => Ok(Some((k, v))),
            _ => Err(PrismError::violation(
                context,
                format!("expected a single entry, found {}", self.entries.len()),
            )),
        }
    }

    /// The only entry whose key matches none of `excluded`.
    pub fn get_single_entry_excluding(
        &self,
        excluded: &[QName],
    ) -> Result<Option<(&QName, &XNode)>> {
        let mut found = None;
        for (k, v) in &self.entries {
            if excluded.iter().any(|e| e.matches(k)) {
                continue;
            }
            if found.is_some() {
                let keys: Vec<String> = self.keys().map(|k| k.to_string()).collect();
                return Err(PrismError::violation(
                    keys.join(","),
                    "expected a single entry besides the excluded keys",
                ));
            }
            found = Some((k, v));
        }
        Ok(found)
    }
}

impl PartialEq for MapNode {
    fn eq(&self, other: &Self) -> bool {
        unordered_eq(&self.entries, &other.entries, |(ka, va), (kb, vb)| {
            ka.matches(kb) && va == vb
        })
    }
}

impl Hash for MapNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let fold = self.entries.iter().fold(0u64, |acc, (k, v)| {
            let mut h = DefaultHasher::new();
            k.local_part().hash(&mut h);
            v.hash(&mut h);
            acc ^ h.finish()
        });
        self.entries.len().hash(state);
        fold.hash(state);
    }
}

impl FromIterator<(QName, XNode)> for MapNode {
    /// Collects with [`MapNode::merge`] semantics.
    fn from_iter<I: IntoIterator<Item = (QName, XNode)>>(iter: I) -> Self {
        let mut map = MapNode::new();
        for (k, v) in iter {
            map.merge(k, v);
        }
        map
    }
}

/// Borrowed, read-only view of a map's entries.
#[derive(Debug, Clone, Copy)]
pub struct Entries<'a> {
    entries: &'a [(QName, XNode)],
}

impl<'a> Entries<'a> {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<(&'a QName, &'a XNode)> {
        self.entries.get(index).map(|(k, v)| (k, v))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'a QName, &'a XNode)> + 'a {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl<'a> IntoIterator for Entries<'a> {
    type Item = (&'a QName, &'a XNode);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (QName, XNode)>,
        fn(&'a (QName, XNode)) -> (&'a QName, &'a XNode),
    >;

    fn into_iter(self) -> Self::IntoIter {
        fn split<'b>(e: &'b (QName, XNode)) -> (&'b QName, &'b XNode) {
            (&e.0, &e.1)
        }
        self.entries.iter().map(split as fn(&'a (QName, XNode)) -> (&'a QName, &'a XNode))
    }
}
