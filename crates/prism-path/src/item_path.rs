//! Item paths: ordered name/id segments addressing a nested item.
//!
//! Textual form is a `/`-separated segment list (`assignment/3/description`).
//! Text without any `/` may use `.` instead (`assignment.3.description`).
//! Purely numeric segments are container value ids.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::qname::{NamespaceResolver, NoPrefixes, QName};
use crate::validate::validate_segments;
use crate::NameError;

/// One step of an [`ItemPath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Name(QName),
    Id(u64),
}

impl PathSegment {
    pub fn as_name(&self) -> Option<&QName> {
        match self {
            PathSegment::Name(q) => Some(q),
            PathSegment::Id(_) => None,
        }
    }

    pub fn as_id(&self) -> Option<u64> {
        match self {
            PathSegment::Id(id) => Some(*id),
            PathSegment::Name(_) => None,
        }
    }

    /// Namespace-aware segment equality.
    pub fn matches(&self, other: &PathSegment) -> bool {
        match (self, other) {
            (PathSegment::Name(a), PathSegment::Name(b)) => a.matches(b),
            (PathSegment::Id(a), PathSegment::Id(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Name(q) => write!(f, "{q}"),
            PathSegment::Id(id) => write!(f, "{id}"),
        }
    }
}

impl From<QName> for PathSegment {
    fn from(q: QName) -> Self {
        PathSegment::Name(q)
    }
}

impl From<u64> for PathSegment {
    fn from(id: u64) -> Self {
        PathSegment::Id(id)
    }
}

/// An ordered sequence of [`PathSegment`]s. The empty path addresses the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ItemPath {
    segments: Vec<PathSegment>,
}

impl ItemPath {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }

    /// A path of unqualified names.
    ///
    /// ```
    /// use prism_path::ItemPath;
    ///
    /// let p = ItemPath::from_names(&["assignment", "description"]);
    /// assert_eq!(p.to_string(), "assignment/description");
    /// ```
    pub fn from_names(names: &[&str]) -> Self {
        Self {
            segments: names
                .iter()
                .map(|n| PathSegment::Name(QName::local(*n)))
                .collect(),
        }
    }

    /// Parses the textual form, resolving `prefix:local` names through
    /// `resolver`.
    pub fn parse(text: &str, resolver: &dyn NamespaceResolver) -> Result<Self, NameError> {
        let raw = split_segments(text)?;
        let segments = raw
            .into_iter()
            .map(|s| {
                if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) {
                    s.parse::<u64>()
                        .map(PathSegment::Id)
                        .map_err(|_| NameError::Malformed(s.to_string()))
                } else {
                    QName::parse(s, resolver).map(PathSegment::Name)
                }
            })
            .collect::<Result<Vec<_>, _>>()?;
        validate_segments(&segments)?;
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn first(&self) -> Option<&PathSegment> {
        self.segments.first()
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }

    /// Everything after the first segment.
    pub fn rest(&self) -> ItemPath {
        Self {
            segments: self.segments.iter().skip(1).cloned().collect(),
        }
    }

    /// Everything before the last segment.
    pub fn parent(&self) -> ItemPath {
        let n = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..n].to_vec(),
        }
    }

    /// The last name segment, skipping a trailing id.
    pub fn last_name(&self) -> Option<&QName> {
        self.segments.iter().rev().find_map(PathSegment::as_name)
    }

    pub fn push(&mut self, segment: impl Into<PathSegment>) {
        self.segments.push(segment.into());
    }

    /// A new path with `segment` appended.
    pub fn child(&self, segment: impl Into<PathSegment>) -> ItemPath {
        let mut out = self.clone();
        out.push(segment);
        out
    }

    pub fn append(&self, other: &ItemPath) -> ItemPath {
        let mut out = self.clone();
        out.segments.extend(other.segments.iter().cloned());
        out
    }

    /// The path with all id segments removed.
    pub fn names_only(&self) -> ItemPath {
        Self {
            segments: self
                .segments
                .iter()
                .filter(|s| matches!(s, PathSegment::Name(_)))
                .cloned()
                .collect(),
        }
    }

    /// Namespace-aware segment-wise equality.
    pub fn equivalent(&self, other: &ItemPath) -> bool {
        self.len() == other.len()
            && self
                .segments
                .iter()
                .zip(&other.segments)
                .all(|(a, b)| a.matches(b))
    }

    /// True if `prefix` addresses this path or one of its ancestors.
    pub fn starts_with(&self, prefix: &ItemPath) -> bool {
        prefix.len() <= self.len()
            && prefix
                .segments
                .iter()
                .zip(&self.segments)
                .all(|(a, b)| a.matches(b))
    }

    /// True if one path is an ancestor of (or equal to) the other.
    pub fn overlaps(&self, other: &ItemPath) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }

    /// Textual form with names written as `prefix:local` where `resolver`
    /// knows the namespace.
    pub fn to_prefixed(&self, resolver: &dyn NamespaceResolver) -> String {
        self.segments
            .iter()
            .map(|s| match s {
                PathSegment::Name(q) => q.to_prefixed(resolver),
                PathSegment::Id(id) => id.to_string(),
            })
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for ItemPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{seg}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ItemPath {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ItemPath::parse(s, &NoPrefixes)
    }
}

impl From<QName> for ItemPath {
    fn from(q: QName) -> Self {
        Self {
            segments: vec![PathSegment::Name(q)],
        }
    }
}

impl FromIterator<PathSegment> for ItemPath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl Serialize for ItemPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

/// Splits path text into raw segments, keeping `{namespace}` blocks intact.
fn split_segments(text: &str) -> Result<Vec<&str>, NameError> {
    let text = text.trim();
    if text.is_empty() || text == "/" {
        return Ok(Vec::new());
    }
    let body = text.strip_prefix('/').unwrap_or(text);
    let separator = if contains_outside_braces(body, '/') { '/' } else { '.' };

    let mut out = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in body.char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| NameError::Malformed(text.to_string()))?;
            }
            c if c == separator && depth == 0 => {
                out.push(&body[start..i]);
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(NameError::Malformed(text.to_string()));
    }
    out.push(&body[start..]);
    if out.iter().any(|s| s.is_empty()) {
        return Err(NameError::EmptySegment(text.to_string()));
    }
    Ok(out)
}

fn contains_outside_braces(text: &str, needle: char) -> bool {
    let mut depth = 0i32;
    for c in text.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            c if c == needle && depth == 0 => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qname::PrefixMap;

    #[test]
    fn parse_slash_form() {
        let p: ItemPath = "assignment/3/description".parse().unwrap();
        assert_eq!(
            p.segments(),
            &[
                PathSegment::Name(QName::local("assignment")),
                PathSegment::Id(3),
                PathSegment::Name(QName::local("description")),
            ]
        );
    }

    #[test]
    fn parse_dot_form() {
        let p: ItemPath = "assignment.3.description".parse().unwrap();
        assert_eq!(p, "assignment/3/description".parse().unwrap());
    }

    #[test]
    fn dotted_local_names_survive_in_slash_form() {
        let p: ItemPath = "extension/ship.name".parse().unwrap();
        assert_eq!(p.last_name(), Some(&QName::local("ship.name")));
    }

    #[test]
    fn leading_slash_is_optional() {
        assert_eq!(
            "/name".parse::<ItemPath>().unwrap(),
            "name".parse::<ItemPath>().unwrap()
        );
    }

    #[test]
    fn namespaces_with_slashes() {
        let p: ItemPath = "{http://a/b}extension/{http://a/b}ship".parse().unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p.last_name(), Some(&QName::new("http://a/b", "ship")));
        assert_eq!(p.to_string(), "{http://a/b}extension/{http://a/b}ship");
    }

    #[test]
    fn prefixed_names() {
        let map = PrefixMap::new().with("c", "urn:c");
        let p = ItemPath::parse("c:assignment/1", &map).unwrap();
        assert_eq!(p.first(), Some(&PathSegment::Name(QName::new("urn:c", "assignment"))));
        assert_eq!(p.last(), Some(&PathSegment::Id(1)));
    }

    #[test]
    fn empty_text_is_root() {
        assert!("".parse::<ItemPath>().unwrap().is_empty());
        assert!("/".parse::<ItemPath>().unwrap().is_empty());
    }

    #[test]
    fn empty_segments_are_rejected() {
        assert!(matches!(
            "a//b".parse::<ItemPath>(),
            Err(NameError::EmptySegment(_))
        ));
    }

    #[test]
    fn unbalanced_braces_are_rejected() {
        assert!("{urn:a/b".parse::<ItemPath>().is_err());
    }

    #[test]
    fn starts_with_is_namespace_aware() {
        let full = ItemPath::new(vec![
            PathSegment::Name(QName::new("urn:c", "assignment")),
            PathSegment::Id(2),
        ]);
        let prefix = ItemPath::from_names(&["assignment"]);
        assert!(full.starts_with(&prefix));
        assert!(!prefix.starts_with(&full));
        assert!(full.overlaps(&prefix));
        assert!(!full.overlaps(&ItemPath::from_names(&["name"])));
    }

    #[test]
    fn parent_rest_and_names_only() {
        let p: ItemPath = "a/1/b".parse().unwrap();
        assert_eq!(p.parent().to_string(), "a/1");
        assert_eq!(p.rest().to_string(), "1/b");
        assert_eq!(p.names_only().to_string(), "a/b");
        assert!(ItemPath::empty().parent().is_empty());
    }

    #[test]
    fn child_and_append() {
        let p = ItemPath::from_names(&["a"]).child(4u64).child(QName::local("b"));
        assert_eq!(p.to_string(), "a/4/b");
        assert_eq!(
            p.append(&ItemPath::from_names(&["c"])).to_string(),
            "a/4/b/c"
        );
    }
}
