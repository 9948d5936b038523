//! Order-independent comparison of sequences under a caller-supplied
//! equivalence.
//!
//! Used wherever two collections are "the same" regardless of the order their
//! members arrived in: map entries of a tree node, values of a multi-valued
//! item.

/// Returns true when `a` and `b` contain the same members, each matched at
/// most once, ignoring order.
///
/// `eq` need not be transitive: members are paired by maximum bipartite
/// matching, so a member that fits several partners never blocks another.
///
/// # Examples
///
/// ```
/// use prism_util::multiset::unordered_eq;
///
/// assert!(unordered_eq(&[1, 2, 2], &[2, 1, 2], |x, y| x == y));
/// assert!(!unordered_eq(&[1, 1, 2], &[1, 2, 2], |x, y| x == y));
/// ```
pub fn unordered_eq<A, B, F>(a: &[A], b: &[B], eq: F) -> bool
where
    F: FnMut(&A, &B) -> bool,
{
    a.len() == b.len() && pair(a, b, eq).iter().all(Option::is_some)
}

/// Splits two sequences into the members left unmatched on each side.
///
/// Members are paired by maximum matching under `eq`, so as few as possible
/// stay unpaired. The returned vectors hold indices of unpaired members, in
/// their original order.
///
/// # Examples
///
/// ```
/// use prism_util::multiset::unmatched;
///
/// let (only_a, only_b) = unmatched(&["x", "y", "y"], &["y", "z"], |p, q| p == q);
/// assert_eq!(only_a, vec![0, 2]);
/// assert_eq!(only_b, vec![1]);
/// ```
pub fn unmatched<A, B, F>(a: &[A], b: &[B], eq: F) -> (Vec<usize>, Vec<usize>)
where
    F: FnMut(&A, &B) -> bool,
{
    let owners = pair(a, b, eq);
    let mut paired = vec![false; a.len()];
    let mut only_b = Vec::new();
    for (j, owner) in owners.iter().enumerate() {
        match owner {
            Some(i) => paired[*i] = true,
            None => only_b.push(j),
        }
    }
    let only_a = (0..a.len()).filter(|&i| !paired[i]).collect();
    (only_a, only_b)
}

/// For each member of `b`, the index of the member of `a` it is paired
/// with.
fn pair<A, B, F>(a: &[A], b: &[B], mut eq: F) -> Vec<Option<usize>>
where
    F: FnMut(&A, &B) -> bool,
{
    let mut edges = Vec::with_capacity(a.len());
    for x in a {
        let mut fits = Vec::new();
        for (j, y) in b.iter().enumerate() {
            if eq(x, y) {
                fits.push(j);
            }
        }
        edges.push(fits);
    }
    let mut owners = vec![None; b.len()];
    for i in 0..a.len() {
        let mut seen = vec![false; b.len()];
        augment(i, &edges, &mut owners, &mut seen);
    }
    owners
}

fn augment(i: usize, edges: &[Vec<usize>], owners: &mut [Option<usize>], seen: &mut [bool]) -> bool {
    for &j in &edges[i] {
        if seen[j] {
            continue;
        }
        seen[j] = true;
        if owners[j].map_or(true, |k| augment(k, edges, owners, seen)) {
            owners[j] = Some(i);
            return true;
        }
    }
    false
}

/// Returns true when any member of `items` is equivalent to `needle`.
pub fn contains_by<T, P, F>(items: &[T], needle: &P, mut eq: F) -> bool
where
    F: FnMut(&T, &P) -> bool,
{
    items.iter().any(|item| eq(item, needle))
}
