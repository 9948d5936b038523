//! Pre-order traversal contract shared by tree-shaped values.
//!
//! A [`Visitable`] value calls its visitor on itself first and then on each
//! child in order, depth-first, so a child's whole subtree is visited before
//! its next sibling.

/// Receives nodes during a traversal.
///
/// Any `FnMut(N)` closure is a visitor.
pub trait Visitor<N> {
    fn visit(&mut self, node: N);
}

impl<N, F> Visitor<N> for F
where
    F: FnMut(N),
{
    fn visit(&mut self, node: N) {
        self(node)
    }
}

/// A tree that can be walked with a [`Visitor`].
pub trait Visitable<'a> {
    /// What the visitor sees for each node, usually a borrowed view.
    type Node;

    fn accept(&'a self, visitor: &mut dyn Visitor<Self::Node>);
}

/// Collects every node produced by a traversal, in visiting order.
pub fn collect<'a, T>(tree: &'a T) -> Vec<T::Node>
where
    T: Visitable<'a> + ?Sized,
{
    let mut out = Vec::new();
    let mut push = |node: T::Node| out.push(node);
    tree.accept(&mut push);
    out
}
