//! Redaction of primitive values.

use prism_path::QName;

use super::{PrimitiveNode, RawValue, XNode};

impl XNode {
    /// Replaces every primitive for which `predicate` holds with
    /// `replacement`, returning how many were replaced.
    ///
    /// The predicate sees the nearest enclosing key (list items inherit the
    /// key of their list, a root's child sees the root name).
    ///
    /// ```
    /// use prism::xnode::{MapNode, RawValue, XNode};
    /// use prism_path::QName;
    ///
    /// let mut doc = XNode::Map(
    ///     MapNode::new()
    ///         .with(QName::local("name"), XNode::text("jack"))
    ///         .with(QName::local("password"), XNode::text("s3cr3t")),
    /// );
    /// let masked = doc.mask_primitives(
    ///     |key, _| key.is_some_and(|k| k.local_part() == "password"),
    ///     &RawValue::Text("***".into()),
    /// );
    /// assert_eq!(masked, 1);
    /// assert_eq!(doc.as_map().unwrap().get_local("password"), Some(&XNode::text("***")));
    /// ```
    pub fn mask_primitives<F>(&mut self, mut predicate: F, replacement: &RawValue) -> usize
    where
        F: FnMut(Option<&QName>, &PrimitiveNode) -> bool,
    {
        mask(self, None, &mut predicate, replacement)
    }
}

fn mask<F>(node: &mut XNode, key: Option<&QName>, predicate: &mut F, replacement: &RawValue) -> usize
where
    F: FnMut(Option<&QName>, &PrimitiveNode) -> bool,
{
    match node {
        XNode::Primitive(p) => {
            if predicate(key, p) {
                p.value = replacement.clone();
                1
            } else {
                0
            }
        }
        XNode::Map(m) => m
            .values_mut()
            .map(|(k, v)| mask(v, Some(k), predicate, replacement))
            .sum(),
        XNode::List(items) => items
            .iter_mut()
            .map(|v| mask(v, key, predicate, replacement))
            .sum(),
        XNode::Root(name, child) => mask(child, Some(name), predicate, replacement),
    }
}
