//! XNode: the encoding-agnostic pivot tree.
//!
//! Codecs parse bytes into XNode trees; the binder turns them into typed
//! objects and back. A tree is built from four node kinds:
//!
//! - [`XNode::Primitive`] a raw scalar with an optional type hint,
//! - [`XNode::Map`] an ordered, namespace-aware [`MapNode`],
//! - [`XNode::List`] an ordered sequence,
//! - [`XNode::Root`] a named document wrapper around a single child.
//!
//! Equality is structural. Map nodes compare as unordered multisets of
//! entries, so two encodings that differ only in key order are equal.

mod map;
mod mask;

use std::fmt::Write as _;
use std::hash::{Hash, Hasher};

use prism_path::QName;
use prism_util::{CloneStrategy, Cloneable, Visitable, Visitor};

pub use map::{Entries, MapNode};

/// An unparsed scalar, as a codec saw it.
///
/// Numbers keep their textual form so no precision is lost before the
/// binder knows the target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawValue {
    Text(String),
    Number(String),
    Boolean(bool),
    Null,
}

impl RawValue {
    /// The value as text, for parsers that accept any scalar spelling.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) | RawValue::Number(s) => Some(s),
            RawValue::Boolean(true) => Some("true"),
            RawValue::Boolean(false) => Some("false"),
            RawValue::Null => None,
        }
    }
}

impl std::fmt::Display for RawValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawValue::Text(s) => write!(f, "{s:?}"),
            RawValue::Number(n) => f.write_str(n),
            RawValue::Boolean(b) => write!(f, "{b}"),
            RawValue::Null => f.write_str("null"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveNode {
    pub value: RawValue,
    /// Declared type, when the encoding carried one.
    pub type_hint: Option<QName>,
}

#[derive(Debug, Clone)]
pub enum XNode {
    Primitive(PrimitiveNode),
    Map(MapNode),
    List(Vec<XNode>),
    Root(QName, Box<XNode>),
}

impl XNode {
    pub fn primitive(value: RawValue) -> Self {
        XNode::Primitive(PrimitiveNode {
            value,
            type_hint: None,
        })
    }

    pub fn typed(value: RawValue, type_hint: QName) -> Self {
        XNode::Primitive(PrimitiveNode {
            value,
            type_hint: Some(type_hint),
        })
    }

    pub fn text(s: impl Into<String>) -> Self {
        Self::primitive(RawValue::Text(s.into()))
    }

    pub fn number(n: impl ToString) -> Self {
        Self::primitive(RawValue::Number(n.to_string()))
    }

    pub fn boolean(b: bool) -> Self {
        Self::primitive(RawValue::Boolean(b))
    }

    pub fn null() -> Self {
        Self::primitive(RawValue::Null)
    }

    pub fn list(items: Vec<XNode>) -> Self {
        XNode::List(items)
    }

    pub fn root(name: QName, child: impl Into<XNode>) -> Self {
        XNode::Root(name, Box::new(child.into()))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            XNode::Primitive(_) => "primitive",
            XNode::Map(_) => "map",
            XNode::List(_) => "list",
            XNode::Root(..) => "root",
        }
    }

    pub fn as_primitive(&self) -> Option<&PrimitiveNode> {
        match self {
            XNode::Primitive(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapNode> {
        match self {
            XNode::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut MapNode> {
        match self {
            XNode::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[XNode]> {
        match self {
            XNode::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_root(&self) -> Option<(&QName, &XNode)> {
        match self {
            XNode::Root(name, child) => Some((name, child)),
            _ => None,
        }
    }

    /// Text of a `Text` primitive.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XNode::Primitive(PrimitiveNode {
                value: RawValue::Text(s),
                ..
            }) => Some(s),
            _ => None,
        }
    }

    /// True for empty maps and lists and for null primitives.
    pub fn is_empty(&self) -> bool {
        match self {
            XNode::Primitive(p) => p.value == RawValue::Null,
            XNode::Map(m) => m.is_empty(),
            XNode::List(items) => items.is_empty(),
            XNode::Root(_, child) => child.is_empty(),
        }
    }

    /// Number of direct children. Primitives count as zero.
    pub fn len(&self) -> usize {
        match self {
            XNode::Primitive(_) => 0,
            XNode::Map(m) => m.len(),
            XNode::List(items) => items.len(),
            XNode::Root(..) => 1,
        }
    }

    /// The node's members as a slice: a List's items, or the node itself.
    pub fn as_values(&self) -> &[XNode] {
        match self {
            XNode::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    /// Pre-order mutable traversal.
    pub fn accept_mut(&mut self, visitor: &mut dyn FnMut(&mut XNode)) {
        visitor(self);
        match self {
            XNode::Primitive(_) => {}
            XNode::Map(m) => {
                for (_, v) in m.values_mut() {
                    v.accept_mut(visitor);
                }
            }
            XNode::List(items) => {
                for item in items {
                    item.accept_mut(visitor);
                }
            }
            XNode::Root(_, child) => child.accept_mut(visitor),
        }
    }

    /// Indented, human-readable rendering for diagnostics.
    ///
    /// ```
    /// use prism::xnode::{MapNode, XNode};
    /// use prism_path::QName;
    ///
    /// let doc = XNode::root(
    ///     QName::local("user"),
    ///     XNode::Map(MapNode::new().with(QName::local("name"), XNode::text("jack"))),
    /// );
    /// assert_eq!(doc.debug_dump(), "ROOT user\n  MAP\n    name:\n      PRIM \"jack\"\n");
    /// ```
    pub fn debug_dump(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, indent: usize) -> std::fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            XNode::Primitive(p) => match &p.type_hint {
                Some(t) => writeln!(out, "{pad}PRIM {} ({t})", p.value),
                None => writeln!(out, "{pad}PRIM {}", p.value),
            },
            XNode::Map(m) => {
                writeln!(out, "{pad}MAP")?;
                for (k, v) in m.entries() {
                    writeln!(out, "{pad}  {k}:")?;
                    v.dump_into(out, indent + 2)?;
                }
                Ok(())
            }
            XNode::List(items) => {
                writeln!(out, "{pad}LIST ({})", items.len())?;
                for item in items {
                    item.dump_into(out, indent + 1)?;
                }
                Ok(())
            }
            XNode::Root(name, child) => {
                writeln!(out, "{pad}ROOT {name}")?;
                child.dump_into(out, indent + 1)
            }
        }
    }
}

impl PartialEq for XNode {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (XNode::Primitive(a), XNode::Primitive(b)) => a == b,
            (XNode::Map(a), XNode::Map(b)) => a == b,
            (XNode::List(a), XNode::List(b)) => a == b,
            (XNode::Root(na, a), XNode::Root(nb, b)) => na.matches(nb) && a == b,
            _ => false,
        }
    }
}

impl Hash for XNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            XNode::Primitive(p) => p.hash(state),
            XNode::Map(m) => m.hash(state),
            XNode::List(items) => items.hash(state),
            XNode::Root(name, child) => {
                name.local_part().hash(state);
                child.hash(state);
            }
        }
    }
}

impl From<MapNode> for XNode {
    fn from(m: MapNode) -> Self {
        XNode::Map(m)
    }
}

impl From<RawValue> for XNode {
    fn from(v: RawValue) -> Self {
        XNode::primitive(v)
    }
}

impl<'a> Visitable<'a> for XNode {
    type Node = &'a XNode;

    fn accept(&'a self, visitor: &mut dyn Visitor<&'a XNode>) {
        visitor.visit(self);
        match self {
            XNode::Primitive(_) => {}
            XNode::Map(m) => {
                for (_, v) in m.entries() {
                    v.accept(visitor);
                }
            }
            XNode::List(items) => {
                for item in items {
                    item.accept(visitor);
                }
            }
            XNode::Root(_, child) => child.accept(visitor),
        }
    }
}

impl Cloneable for XNode {
    fn strategy(&self) -> CloneStrategy {
        CloneStrategy::Structural
    }

    fn structural_copy(&self) -> Option<Self> {
        Some(self.clone())
    }
}
