//! JSON encoding of XNode trees.
//!
//! Maps become objects, lists arrays, scalars JSON scalars. Keys are
//! written as `prefix:local` when the prefix table knows the namespace,
//! bare in the default namespace, and as `{namespace}local` otherwise.
//!
//! Keys starting with `@` are reserved for the codec; a key whose text
//! starts with `@` is written with one more `@` in front.
//!
//! - A primitive carrying a type hint becomes `{"@type": ..., "@value": ...}`.
//! - A number whose text JSON would not reproduce verbatim becomes
//!   `{"@number": "<text>"}`.
//! - A document root is a single-key object whose key names the element; a
//!   root nested below it is wrapped as `{"@root": {<element>: ...}}`.
//!
//! Repeated keys accumulate like [`MapNode::merge`], so `a` and `c:a` in one
//! object both keep their values.
//!
//! ```
//! use prism::codec::JsonCodec;
//! use prism::xnode::{MapNode, XNode};
//! use prism_path::{PrefixMap, QName};
//!
//! let codec = JsonCodec::new(PrefixMap::new().with("c", "urn:c"), None);
//! let doc = XNode::root(
//!     QName::new("urn:c", "user"),
//!     MapNode::new().with(QName::new("urn:c", "name"), XNode::text("jack")),
//! );
//! let text = codec.write_document(&doc).unwrap();
//! assert_eq!(text, r#"{"c:user":{"c:name":"jack"}}"#);
//! assert_eq!(codec.read_document(&text).unwrap(), doc);
//! ```

use std::str::FromStr;

use prism_path::{PrefixMap, QName};
use serde_json::{Map, Number, Value};

use crate::context::PrismContext;
use crate::error::{PrismError, Result};
use crate::xnode::{MapNode, RawValue, XNode};

const TYPE_KEY: &str = "@type";
const VALUE_KEY: &str = "@value";
const NUMBER_KEY: &str = "@number";
const ROOT_KEY: &str = "@root";

#[derive(Debug, Clone, Default)]
pub struct JsonCodec {
    prefixes: PrefixMap,
    default_namespace: Option<String>,
    pretty: bool,
}

impl JsonCodec {
    pub fn new(prefixes: PrefixMap, default_namespace: Option<String>) -> Self {
        Self {
            prefixes,
            default_namespace,
            pretty: false,
        }
    }

    /// A codec using the context's codec settings, with the schema's
    /// prefixes filling in any the configuration does not declare.
    pub fn from_context(ctx: &PrismContext) -> Self {
        let codec = &ctx.config().codec;
        let mut prefixes = codec.prefixes.clone();
        prefixes.extend(ctx.snapshot().prefixes());
        Self {
            prefixes,
            default_namespace: codec.default_namespace.clone(),
            pretty: codec.pretty,
        }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    // ── Encoding ───────────────────────────────────────────────────────────

    pub fn encode(&self, node: &XNode) -> Value {
        match node {
            XNode::Primitive(p) => {
                let value = raw_to_json(&p.value);
                match &p.type_hint {
                    Some(hint) => {
                        let mut map = Map::new();
                        map.insert(TYPE_KEY.into(), Value::String(hint.to_prefixed(&self.prefixes)));
                        map.insert(VALUE_KEY.into(), value);
                        Value::Object(map)
                    }
                    None => value,
                }
            }
            XNode::Map(m) => {
                let mut map = Map::new();
                for (key, value) in m.entries() {
                    map.insert(self.key(key), self.encode(value));
                }
                Value::Object(map)
            }
            XNode::List(items) => Value::Array(items.iter().map(|n| self.encode(n)).collect()),
            XNode::Root(name, child) => {
                single(ROOT_KEY, single(self.key(name), self.encode(child)))
            }
        }
    }

    /// Like [`encode`](Self::encode), but a root node becomes the bare
    /// single-key wrapper.
    pub fn encode_document(&self, node: &XNode) -> Value {
        match node {
            XNode::Root(name, child) => single(self.key(name), self.encode(child)),
            other => self.encode(other),
        }
    }

    fn key(&self, name: &QName) -> String {
        let text = match name.namespace() {
            Some(ns) if self.default_namespace.as_deref() == Some(ns) => {
                name.local_part().to_string()
            }
            _ => name.to_prefixed(&self.prefixes),
        };
        if text.starts_with('@') {
            format!("@{text}")
        } else {
            text
        }
    }

    // ── Decoding ───────────────────────────────────────────────────────────

    pub fn decode(&self, value: &Value) -> Result<XNode> {
        Ok(match value {
            Value::Object(map) => {
                if let Some(inner) = map.get(VALUE_KEY) {
                    return self.decode_typed(map, inner);
                }
                if let Some(raw) = tagged_number(value) {
                    return Ok(XNode::primitive(raw));
                }
                if let Some(inner) = map.get(ROOT_KEY) {
                    return self.decode_nested_root(map, inner);
                }
                let mut node = MapNode::new();
                for (key, value) in map {
                    let key = self.parse_key(key)?;
                    match self.decode(value)? {
                        XNode::List(items) if node.contains_key(&key) => {
                            for item in items {
                                node.merge(key.clone(), item);
                            }
                        }
                        value => node.merge(key, value),
                    }
                }
                XNode::Map(node)
            }
            Value::Array(items) => XNode::List(
                items
                    .iter()
                    .map(|v| self.decode(v))
                    .collect::<Result<Vec<_>>>()?,
            ),
            scalar => XNode::primitive(json_to_raw(scalar)),
        })
    }

    /// A document: a single-key object is the root element wrapper.
    pub fn decode_document(&self, value: &Value) -> Result<XNode> {
        match value {
            Value::Object(map) if map.len() == 1 && !is_reserved(map) => {
                let Some((key, body)) = map.iter().next() else {
                    return self.decode(value);
                };
                Ok(XNode::root(self.parse_key(key)?, self.decode(body)?))
            }
            other => self.decode(other),
        }
    }

    fn decode_typed(&self, map: &Map<String, Value>, inner: &Value) -> Result<XNode> {
        if let Some(key) = map.keys().find(|k| *k != TYPE_KEY && *k != VALUE_KEY) {
            return Err(PrismError::violation(
                key,
                format!("unexpected key next to {VALUE_KEY}"),
            ));
        }
        let raw = match inner {
            Value::Object(_) => tagged_number(inner)
                .ok_or_else(|| PrismError::mismatch(VALUE_KEY, "scalar", inner))?,
            Value::Array(_) => return Err(PrismError::mismatch(VALUE_KEY, "scalar", inner)),
            scalar => json_to_raw(scalar),
        };
        match map.get(TYPE_KEY) {
            Some(Value::String(hint)) => Ok(XNode::typed(raw, QName::parse(hint, &self.prefixes)?)),
            Some(other) => Err(PrismError::mismatch(TYPE_KEY, "type name", other)),
            None => Ok(XNode::primitive(raw)),
        }
    }

    fn decode_nested_root(&self, map: &Map<String, Value>, inner: &Value) -> Result<XNode> {
        if let Some(key) = map.keys().find(|k| *k != ROOT_KEY) {
            return Err(PrismError::violation(
                key,
                format!("unexpected key next to {ROOT_KEY}"),
            ));
        }
        match inner.as_object().filter(|m| m.len() == 1).and_then(|m| m.iter().next()) {
            Some((key, body)) => Ok(XNode::root(self.parse_key(key)?, self.decode(body)?)),
            None => Err(PrismError::mismatch(ROOT_KEY, "single-key object", inner)),
        }
    }

    /// Bare keys stay unqualified; lookups match them in any namespace.
    fn parse_key(&self, key: &str) -> Result<QName> {
        match key.strip_prefix('@') {
            Some(escaped) if escaped.starts_with('@') => Ok(QName::local(escaped)),
            Some(_) => Err(PrismError::violation(key, "unknown reserved key")),
            None => Ok(QName::parse(key, &self.prefixes)?),
        }
    }

    // ── Text ───────────────────────────────────────────────────────────────

    pub fn write_document(&self, node: &XNode) -> Result<String> {
        let value = self.encode_document(node);
        Ok(if self.pretty {
            serde_json::to_string_pretty(&value)?
        } else {
            serde_json::to_string(&value)?
        })
    }

    pub fn read_document(&self, text: &str) -> Result<XNode> {
        let value: Value = serde_json::from_str(text)?;
        self.decode_document(&value)
    }
}

fn single(key: impl Into<String>, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(key.into(), value);
    Value::Object(map)
}

fn is_reserved(map: &Map<String, Value>) -> bool {
    map.keys().any(|k| k.starts_with('@') && !k.starts_with("@@"))
}

fn tagged_number(value: &Value) -> Option<RawValue> {
    let map = value.as_object().filter(|m| m.len() == 1)?;
    map.get(NUMBER_KEY)?
        .as_str()
        .map(|text| RawValue::Number(text.to_string()))
}

fn raw_to_json(raw: &RawValue) -> Value {
    match raw {
        RawValue::Text(s) => Value::String(s.clone()),
        RawValue::Number(n) => match Number::from_str(n) {
            Ok(number) if number.to_string() == *n => Value::Number(number),
            _ => single(NUMBER_KEY, Value::String(n.clone())),
        },
        RawValue::Boolean(b) => Value::Bool(*b),
        RawValue::Null => Value::Null,
    }
}

fn json_to_raw(value: &Value) -> RawValue {
    match value {
        Value::String(s) => RawValue::Text(s.clone()),
        Value::Number(n) => RawValue::Number(n.to_string()),
        Value::Bool(b) => RawValue::Boolean(*b),
        _ => RawValue::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn codec() -> JsonCodec {
        JsonCodec::new(
            PrefixMap::new().with("c", "urn:c").with("x", "urn:x"),
            Some("urn:c".into()),
        )
    }

    #[test]
    fn keys_by_namespace() {
        let codec = codec();
        let node = XNode::Map(
            MapNode::new()
                .with(QName::new("urn:c", "name"), XNode::text("a"))
                .with(QName::new("urn:x", "shoe"), XNode::number(9))
                .with(QName::new("urn:other", "hat"), XNode::boolean(true))
                .with(QName::local("oid"), XNode::text("1")),
        );
        assert_eq!(
            codec.encode(&node),
            json!({"name": "a", "x:shoe": 9, "{urn:other}hat": true, "oid": "1"})
        );
    }

    #[test]
    fn typed_primitives() {
        let codec = codec();
        let node = XNode::typed(RawValue::Text("2024-01-01T00:00:00Z".into()), QName::new("urn:x", "dateTime"));
        let value = codec.encode(&node);
        assert_eq!(value, json!({"@type": "x:dateTime", "@value": "2024-01-01T00:00:00Z"}));
        assert_eq!(codec.decode(&value).unwrap(), node);
        assert!(codec.decode(&json!({"@value": [1]})).is_err());
    }

    #[test]
    fn numbers_keep_their_text() {
        let codec = codec();
        let node = codec.decode(&json!([1, 2.5, -7])).unwrap();
        let texts: Vec<&str> = node
            .as_values()
            .iter()
            .filter_map(|n| n.as_primitive()?.value.as_text())
            .collect();
        assert_eq!(texts, ["1", "2.5", "-7"]);

        for text in ["1E5", "0.50", "12x"] {
            let value = codec.encode(&XNode::number(text));
            assert_eq!(value, json!({"@number": text}));
            assert_eq!(codec.decode(&value).unwrap(), XNode::number(text));
        }
        let typed = XNode::typed(RawValue::Number("1e3".into()), QName::new("urn:x", "double"));
        assert_eq!(codec.decode(&codec.encode(&typed)).unwrap(), typed);
    }

    #[test]
    fn namespace_equal_keys_accumulate() {
        let codec = codec();
        let node = codec
            .decode(&json!({"mail": "a", "c:mail": ["b", "c"], "x:mail": "d"}))
            .unwrap();
        let map = node.as_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(
            map.get(&QName::new("urn:c", "mail")),
            Some(&XNode::list(vec![XNode::text("a"), XNode::text("b"), XNode::text("c")]))
        );
        assert_eq!(map.get(&QName::new("urn:x", "mail")), Some(&XNode::text("d")));
    }

    #[test]
    fn nested_roots_and_reserved_keys() {
        let codec = codec();
        let node = XNode::Map(
            MapNode::new()
                .with(QName::local("x"), XNode::root(QName::local("y"), XNode::text("t")))
                .with(QName::local("@value"), XNode::text("v"))
                .with(QName::local("k"), XNode::text("w")),
        );
        let value = codec.encode(&node);
        assert_eq!(
            value,
            json!({"x": {"@root": {"y": "t"}}, "@@value": "v", "k": "w"})
        );
        assert_eq!(codec.decode(&value).unwrap(), node);

        let doc = XNode::root(QName::local("user"), node);
        let text = codec.write_document(&doc).unwrap();
        assert_eq!(codec.read_document(&text).unwrap(), doc);

        assert!(codec.decode(&json!({"@bogus": 1})).is_err());
        assert!(codec.decode(&json!({"@root": {"a": 1, "b": 2}})).is_err());
    }

    #[test]
    fn documents_and_unknown_prefixes() {
        let codec = codec();
        let doc = codec.read_document(r#"{"user": {"name": "jack", "c:fullName": "Jack"}}"#).unwrap();
        let (name, body) = doc.as_root().unwrap();
        assert_eq!(name.local_part(), "user");
        assert_eq!(body.as_map().unwrap().len(), 2);
        assert!(matches!(
            codec.read_document(r#"{"user": {"zz:name": "jack"}}"#),
            Err(PrismError::Name(_))
        ));
    }
}
