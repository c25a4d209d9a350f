//! Generic document tree produced by the loader.
//!
//! Every check downstream of parsing walks a [`StructuralNode`] through the
//! `Option`-returning accessors below, so "field present and of the expected
//! shape" is always an ordinary conditional.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::{self, Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};

/// A scalar leaf value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A parsed document value: mapping, sequence or scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum StructuralNode {
    Mapping(BTreeMap<String, StructuralNode>),
    Sequence(Vec<StructuralNode>),
    Scalar(Scalar),
}

/// Shape name of a node, used in diagnostics ("expected sequence, found string").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Mapping,
    Sequence,
    String,
    Number,
    Bool,
    Null,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Mapping => "mapping",
            NodeKind::Sequence => "sequence",
            NodeKind::String => "string",
            NodeKind::Number => "number",
            NodeKind::Bool => "boolean",
            NodeKind::Null => "null",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StructuralNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            StructuralNode::Mapping(_) => NodeKind::Mapping,
            StructuralNode::Sequence(_) => NodeKind::Sequence,
            StructuralNode::Scalar(Scalar::Null) => NodeKind::Null,
            StructuralNode::Scalar(Scalar::Bool(_)) => NodeKind::Bool,
            StructuralNode::Scalar(Scalar::Int(_) | Scalar::Float(_)) => NodeKind::Number,
            StructuralNode::Scalar(Scalar::String(_)) => NodeKind::String,
        }
    }

    pub fn as_mapping(&self) -> Option<&BTreeMap<String, StructuralNode>> {
        match self {
            StructuralNode::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[StructuralNode]> {
        match self {
            StructuralNode::Sequence(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StructuralNode::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            StructuralNode::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StructuralNode::Scalar(Scalar::Int(i)) => Some(*i as f64),
            StructuralNode::Scalar(Scalar::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StructuralNode::Scalar(Scalar::Null))
    }

    /// Look up a key. Returns `None` for missing keys and for non-mappings.
    pub fn get(&self, key: &str) -> Option<&StructuralNode> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Follow a chain of mapping keys.
    pub fn get_path(&self, keys: &[&str]) -> Option<&StructuralNode> {
        keys.iter().try_fold(self, |node, key| node.get(key))
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(StructuralNode::as_str)
    }

    pub fn get_mapping(&self, key: &str) -> Option<&BTreeMap<String, StructuralNode>> {
        self.get(key).and_then(StructuralNode::as_mapping)
    }

    pub fn get_sequence(&self, key: &str) -> Option<&[StructuralNode]> {
        self.get(key).and_then(StructuralNode::as_sequence)
    }

    /// Visit every string scalar in the subtree together with its relative path.
    pub fn walk_strings<'a, F>(&'a self, path: &str, visit: &mut F)
    where
        F: FnMut(&str, &'a str),
    {
        match self {
            StructuralNode::Scalar(Scalar::String(s)) => visit(path, s),
            StructuralNode::Scalar(_) => {}
            StructuralNode::Sequence(items) => {
                for (idx, item) in items.iter().enumerate() {
                    item.walk_strings(&format!("{}[{}]", path, idx), visit);
                }
            }
            StructuralNode::Mapping(map) => {
                for (key, value) in map {
                    value.walk_strings(&join_path(path, key), visit);
                }
            }
        }
    }
}

/// Join a dotted document path with a child key.
pub fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

impl From<&str> for StructuralNode {
    fn from(value: &str) -> Self {
        StructuralNode::Scalar(Scalar::String(value.to_string()))
    }
}

impl<'de> Deserialize<'de> for StructuralNode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(NodeVisitor)
    }
}

struct NodeVisitor;

impl<'de> Visitor<'de> for NodeVisitor {
    type Value = StructuralNode;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a mapping, sequence or scalar")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::Int(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(match i64::try_from(v) {
            Ok(i) => StructuralNode::Scalar(Scalar::Int(i)),
            Err(_) => StructuralNode::Scalar(Scalar::Float(v as f64)),
        })
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::Float(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(StructuralNode::Scalar(Scalar::Null))
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Self::Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        StructuralNode::deserialize(deserializer)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<StructuralNode>()? {
            items.push(item);
        }
        Ok(StructuralNode::Sequence(items))
    }

    fn visit_map<A>(self, mut access: A) -> Result<Self::Value, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut map = BTreeMap::new();
        while let Some(MapKey(key)) = access.next_key::<MapKey>()? {
            let value = access.next_value::<StructuralNode>()?;
            if map.insert(key.clone(), value).is_some() {
                return Err(de::Error::custom(format!("duplicate key `{}`", key)));
            }
        }
        Ok(StructuralNode::Mapping(map))
    }
}

/// Mapping key; scalar keys of any type are stringified.
struct MapKey(String);

impl<'de> Deserialize<'de> for MapKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(MapKeyVisitor)
    }
}

struct MapKeyVisitor;

impl<'de> Visitor<'de> for MapKeyVisitor {
    type Value = MapKey;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar mapping key")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(MapKey(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(MapKey(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(MapKey("null".to_string()))
    }
}
