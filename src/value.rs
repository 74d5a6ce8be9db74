//! Nested translation document values.
//!
//! Translation files are plain JSON, but the editor only ever cares about four
//! shapes: nothing, a scalar, a list kept as-is, and a keyed mapping. Modelling
//! them as a closed enum lets the flattener match exhaustively.

use indexmap::IndexMap;
use serde::de::{
    self,
    Deserializer,
};
use serde::{
    Deserialize,
    Serialize,
    Serializer,
};
use serde_json::{
    Map,
    Number,
    Value,
};
use thiserror::Error;

/// A single non-structured JSON value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    Text(String),
}

/// A nested JSON value as found in an uploaded translation file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Null,
    Scalar(Scalar),
    /// Arrays are kept whole; the flattener never descends into them.
    Sequence(Vec<Node>),
    Mapping(IndexMap<String, Node>),
}

/// A value stored under a flat key.
///
/// Mappings are what the flattener turns into dotted paths, so the only
/// mapping a leaf can hold is an empty one: it has no paths of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    Null,
    Scalar(Scalar),
    Sequence(Vec<Node>),
    /// `{}` in the uploaded file.
    EmptyMapping,
}

/// Returned when a non-empty JSON object is offered where a flat value is expected.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("a flat translation value cannot be a non-empty JSON object")]
pub struct ObjectLeafError;

impl Node {
    /// Returns the mapping if this node is one.
    #[must_use]
    pub const fn as_mapping(&self) -> Option<&IndexMap<String, Self>> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Scalar(Scalar::Bool(_)) => "bool",
            Self::Scalar(Scalar::Number(_)) => "number",
            Self::Scalar(Scalar::Text(_)) => "string",
            Self::Sequence(_) => "array",
            Self::Mapping(_) => "object",
        }
    }
}

impl Leaf {
    /// A text leaf, the only kind produced by edits.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Scalar(Scalar::Text(value.into()))
    }

    /// The empty text leaf used to backfill missing keys.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Scalar(Scalar::Text(String::new()))
    }

    /// Editable string form of the value.
    ///
    /// Text is returned verbatim and `null` becomes the empty string. Every
    /// other leaf renders as its compact JSON literal.
    #[must_use]
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Scalar(Scalar::Text(text)) => text.clone(),
            Self::Scalar(Scalar::Bool(flag)) => flag.to_string(),
            Self::Scalar(Scalar::Number(number)) => number.to_string(),
            Self::Sequence(items) => {
                Value::Array(items.iter().cloned().map(Value::from).collect()).to_string()
            }
            Self::EmptyMapping => "{}".to_string(),
        }
    }

    /// True when the leaf holds no translation.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Scalar(Scalar::Text(text)) => text.is_empty(),
            Self::Scalar(_) | Self::Sequence(_) | Self::EmptyMapping => false,
        }
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Scalar(Scalar::Bool(flag)),
            Value::Number(number) => Self::Scalar(Scalar::Number(number)),
            Value::String(text) => Self::Scalar(Scalar::Text(text)),
            Value::Array(items) => Self::Sequence(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Mapping(map.into_iter().map(|(key, value)| (key, Self::from(value))).collect())
            }
        }
    }
}

impl From<Scalar> for Value {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Bool(flag) => Self::Bool(flag),
            Scalar::Number(number) => Self::Number(number),
            Scalar::Text(text) => Self::String(text),
        }
    }
}

impl From<Node> for Value {
    fn from(node: Node) -> Self {
        match node {
            Node::Null => Self::Null,
            Node::Scalar(scalar) => scalar.into(),
            Node::Sequence(items) => Self::Array(items.into_iter().map(Self::from).collect()),
            Node::Mapping(map) => Self::Object(
                map.into_iter().map(|(key, value)| (key, Self::from(value))).collect::<Map<_, _>>(),
            ),
        }
    }
}

impl From<Leaf> for Node {
    fn from(leaf: Leaf) -> Self {
        match leaf {
            Leaf::Null => Self::Null,
            Leaf::Scalar(scalar) => Self::Scalar(scalar),
            Leaf::Sequence(items) => Self::Sequence(items),
            Leaf::EmptyMapping => Self::Mapping(IndexMap::new()),
        }
    }
}

impl TryFrom<Node> for Leaf {
    type Error = ObjectLeafError;

    fn try_from(node: Node) -> Result<Self, Self::Error> {
        match node {
            Node::Null => Ok(Self::Null),
            Node::Scalar(scalar) => Ok(Self::Scalar(scalar)),
            Node::Sequence(items) => Ok(Self::Sequence(items)),
            Node::Mapping(map) if map.is_empty() => Ok(Self::EmptyMapping),
            Node::Mapping(_) => Err(ObjectLeafError),
        }
    }
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bool(flag) => serializer.serialize_bool(*flag),
            Self::Number(number) => number.serialize(serializer),
            Self::Text(text) => serializer.serialize_str(text),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from)
    }
}

impl Serialize for Leaf {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Scalar(scalar) => scalar.serialize(serializer),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::EmptyMapping => serializer.collect_map(IndexMap::<String, Node>::new()),
        }
    }
}

impl<'de> Deserialize<'de> for Leaf {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let node = Node::deserialize(deserializer)?;
        Self::try_from(node).map_err(de::Error::custom)
    }
}
