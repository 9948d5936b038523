//! Qualified names.
//!
//! Textual forms: `{namespace}local`, `prefix:local` (prefix resolved through a
//! [`NamespaceResolver`]) or a bare `local`.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use indexmap::IndexMap;
use prism_util::{CloneStrategy, Cloneable};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::NameError;

fn ncname() -> &'static Regex {
    static NCNAME: OnceLock<Regex> = OnceLock::new();
    NCNAME.get_or_init(|| {
        Regex::new(r"^[\p{L}_][\p{L}\p{N}_.\-]*$").expect("NCName pattern is valid")
    })
}

/// Returns true if `s` is usable as a local part or prefix.
pub fn is_ncname(s: &str) -> bool {
    ncname().is_match(s)
}

/// A namespace-qualified name.
///
/// Derived `==`/`Hash` are strict: both parts must agree. Use
/// [`QName::matches`] for the namespace-aware comparison where a missing
/// namespace on either side acts as a wildcard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace: Option<String>,
    local_part: String,
}

impl QName {
    pub fn new(namespace: impl Into<String>, local_part: impl Into<String>) -> Self {
        let namespace = namespace.into();
        Self {
            namespace: (!namespace.is_empty()).then_some(namespace),
            local_part: local_part.into(),
        }
    }

    /// A name without namespace.
    pub fn local(local_part: impl Into<String>) -> Self {
        Self {
            namespace: None,
            local_part: local_part.into(),
        }
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn is_qualified(&self) -> bool {
        self.namespace.is_some()
    }

    /// Namespace-aware equality: local parts must be equal, namespaces must be
    /// equal unless one of them is absent.
    ///
    /// ```
    /// use prism_path::QName;
    ///
    /// let full = QName::new("urn:x", "name");
    /// assert!(full.matches(&QName::local("name")));
    /// assert!(!full.matches(&QName::new("urn:y", "name")));
    /// ```
    pub fn matches(&self, other: &QName) -> bool {
        if self.local_part != other.local_part {
            return false;
        }
        match (&self.namespace, &other.namespace) {
            (Some(a), Some(b)) => a == b,
            _ => true,
        }
    }

    /// The same local part in another namespace.
    pub fn in_namespace(&self, namespace: &str) -> QName {
        QName::new(namespace, self.local_part.clone())
    }

    /// Fills in `namespace` if this name has none.
    pub fn qualify(self, namespace: &str) -> QName {
        if self.namespace.is_some() {
            self
        } else {
            self.in_namespace(namespace)
        }
    }

    /// Parses `{ns}local`, `prefix:local` or `local`.
    pub fn parse(text: &str, resolver: &dyn NamespaceResolver) -> Result<QName, NameError> {
        let text = text.trim();
        if let Some(rest) = text.strip_prefix('{') {
            let close = rest
                .find('}')
                .ok_or_else(|| NameError::Malformed(text.to_string()))?;
            let (ns, local) = (&rest[..close], &rest[close + 1..]);
            if !is_ncname(local) {
                return Err(NameError::Malformed(text.to_string()));
            }
            return Ok(QName::new(ns, local));
        }
        match text.split_once(':') {
            Some((prefix, local)) => {
                if !is_ncname(prefix) || !is_ncname(local) {
                    return Err(NameError::Malformed(text.to_string()));
                }
                let ns = resolver
                    .namespace_for(prefix)
                    .ok_or_else(|| NameError::UnknownPrefix(prefix.to_string()))?;
                Ok(QName::new(ns, local))
            }
            None => {
                if !is_ncname(text) {
                    return Err(NameError::Malformed(text.to_string()));
                }
                Ok(QName::local(text))
            }
        }
    }

    /// Formats as `prefix:local` when the resolver knows the namespace, as
    /// `{ns}local` otherwise.
    pub fn to_prefixed(&self, resolver: &dyn NamespaceResolver) -> String {
        match &self.namespace {
            None => self.local_part.clone(),
            Some(ns) => match resolver.prefix_for(ns) {
                Some(prefix) => format!("{prefix}:{}", self.local_part),
                None => self.to_string(),
            },
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{ns}}}{}", self.local_part),
            None => f.write_str(&self.local_part),
        }
    }
}

impl FromStr for QName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QName::parse(s, &NoPrefixes)
    }
}

impl Serialize for QName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for QName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

impl Cloneable for QName {
    fn strategy(&self) -> CloneStrategy {
        CloneStrategy::Immutable
    }

    fn self_clone(&self) -> Option<Self> {
        Some(self.clone())
    }
}

// ── Namespace resolution ──────────────────────────────────────────────────

/// Maps prefixes to namespaces and back.
pub trait NamespaceResolver {
    fn namespace_for(&self, prefix: &str) -> Option<&str>;
    fn prefix_for(&self, namespace: &str) -> Option<&str>;
}

/// A resolver that knows no prefixes.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrefixes;

impl NamespaceResolver for NoPrefixes {
    fn namespace_for(&self, _prefix: &str) -> Option<&str> {
        None
    }

    fn prefix_for(&self, _namespace: &str) -> Option<&str> {
        None
    }
}

/// Ordered prefix → namespace table.
///
/// When several prefixes map to one namespace, the first declared wins for
/// formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrefixMap {
    prefixes: IndexMap<String, String>,
}

impl PrefixMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, prefix: impl Into<String>, namespace: impl Into<String>) -> Self {
        self.insert(prefix, namespace);
        self
    }

    pub fn insert(&mut self, prefix: impl Into<String>, namespace: impl Into<String>) {
        self.prefixes.insert(prefix.into(), namespace.into());
    }

    pub fn extend(&mut self, other: &PrefixMap) {
        for (p, ns) in &other.prefixes {
            self.prefixes.entry(p.clone()).or_insert_with(|| ns.clone());
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.prefixes.iter().map(|(p, ns)| (p.as_str(), ns.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }
}

impl NamespaceResolver for PrefixMap {
    fn namespace_for(&self, prefix: &str) -> Option<&str> {
        self.prefixes.get(prefix).map(String::as_str)
    }

    fn prefix_for(&self, namespace: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .find(|(_, ns)| ns.as_str() == namespace)
            .map(|(p, _)| p.as_str())
    }
}
