//! Resolved view values.
//!
//! Arrays and objects are reference counted and updated copy-on-write, so an
//! untouched subtree of a new result is literally the same allocation as in
//! the previous result. [`ResolvedValue::ptr_eq`] observes that.

use crate::binding::PathSegment;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// Persistent JSON-like value produced by the resolver
#[derive(Debug, Clone)]
pub enum ResolvedValue {
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Number
    Number(Number),
    /// String
    String(String),
    /// Shared array
    Array(Rc<Vec<ResolvedValue>>),
    /// Shared object
    Object(Rc<BTreeMap<String, ResolvedValue>>),
}

impl ResolvedValue {
    /// An empty object
    pub fn empty_object() -> Self {
        ResolvedValue::Object(Rc::new(BTreeMap::new()))
    }

    /// Build from a vector of values
    pub fn array(items: Vec<ResolvedValue>) -> Self {
        ResolvedValue::Array(Rc::new(items))
    }

    /// Convert from plain JSON
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => ResolvedValue::Null,
            Value::Bool(b) => ResolvedValue::Bool(*b),
            Value::Number(n) => ResolvedValue::Number(n.clone()),
            Value::String(s) => ResolvedValue::String(s.clone()),
            Value::Array(items) => {
                ResolvedValue::array(items.iter().map(ResolvedValue::from_json).collect())
            }
            Value::Object(map) => ResolvedValue::Object(Rc::new(
                map.iter()
                    .map(|(k, v)| (k.clone(), ResolvedValue::from_json(v)))
                    .collect(),
            )),
        }
    }

    /// Convert to plain JSON
    pub fn to_json(&self) -> Value {
        match self {
            ResolvedValue::Null => Value::Null,
            ResolvedValue::Bool(b) => Value::Bool(*b),
            ResolvedValue::Number(n) => Value::Number(n.clone()),
            ResolvedValue::String(s) => Value::String(s.clone()),
            ResolvedValue::Array(items) => {
                Value::Array(items.iter().map(ResolvedValue::to_json).collect())
            }
            ResolvedValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Identity comparison: containers must share an allocation, scalars must be equal
    pub fn ptr_eq(&self, other: &ResolvedValue) -> bool {
        match (self, other) {
            (ResolvedValue::Array(a), ResolvedValue::Array(b)) => Rc::ptr_eq(a, b),
            (ResolvedValue::Object(a), ResolvedValue::Object(b)) => Rc::ptr_eq(a, b),
            (ResolvedValue::Array(_), _) | (ResolvedValue::Object(_), _) => false,
            _ => self == other,
        }
    }

    /// Whether this is `null`
    pub fn is_null(&self) -> bool {
        matches!(self, ResolvedValue::Null)
    }

    /// String content
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ResolvedValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ResolvedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Array content
    pub fn as_array(&self) -> Option<&[ResolvedValue]> {
        match self {
            ResolvedValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Object content
    pub fn as_object(&self) -> Option<&BTreeMap<String, ResolvedValue>> {
        match self {
            ResolvedValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Property of an object
    pub fn get(&self, key: &str) -> Option<&ResolvedValue> {
        self.as_object()?.get(key)
    }

    /// Value at `path`
    pub fn get_in(&self, path: &[PathSegment]) -> Option<&ResolvedValue> {
        let mut current = self;
        for segment in path {
            current = match (segment, current) {
                (PathSegment::Key(key), ResolvedValue::Object(map)) => map.get(key)?,
                (PathSegment::Index(index), ResolvedValue::Object(map)) => {
                    map.get(&index.to_string())?
                }
                (PathSegment::Index(index), ResolvedValue::Array(items)) => items.get(*index)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Copy of this value with `value` written at `path`.
    ///
    /// Only the containers along `path` are copied; every other subtree is
    /// shared with `self`.
    pub fn set_in(&self, path: &[PathSegment], value: ResolvedValue) -> ResolvedValue {
        let Some((head, rest)) = path.split_first() else {
            return value;
        };

        match (head, self) {
            (PathSegment::Key(key), ResolvedValue::Object(map)) => {
                let mut next = (**map).clone();
                let current = map.get(key).cloned().unwrap_or(ResolvedValue::Null);
                next.insert(key.clone(), current.set_in(rest, value));
                ResolvedValue::Object(Rc::new(next))
            }
            (PathSegment::Index(index), ResolvedValue::Object(map)) => {
                let key = index.to_string();
                let mut next = (**map).clone();
                let current = map.get(&key).cloned().unwrap_or(ResolvedValue::Null);
                next.insert(key, current.set_in(rest, value));
                ResolvedValue::Object(Rc::new(next))
            }
            (PathSegment::Index(index), ResolvedValue::Array(items)) => {
                let mut next = (**items).clone();
                if next.len() <= *index {
                    next.resize(*index + 1, ResolvedValue::Null);
                }
                next[*index] = next[*index].set_in(rest, value);
                ResolvedValue::array(next)
            }
            (PathSegment::Key(_), _) => ResolvedValue::empty_object().set_in(path, value),
            (PathSegment::Index(_), _) => ResolvedValue::array(Vec::new()).set_in(path, value),
        }
    }

    /// Copy of this value with `items` appended to the array at `path`.
    ///
    /// A missing or non-array target starts from an empty array; a non-array
    /// `items` is appended as a single element.
    pub fn append_in(&self, path: &[PathSegment], items: &ResolvedValue) -> ResolvedValue {
        let mut merged: Vec<ResolvedValue> = self
            .get_in(path)
            .and_then(ResolvedValue::as_array)
            .map(|existing| existing.to_vec())
            .unwrap_or_default();

        match items {
            ResolvedValue::Array(values) => merged.extend(values.iter().cloned()),
            other => merged.push(other.clone()),
        }

        self.set_in(path, ResolvedValue::array(merged))
    }
}

impl PartialEq for ResolvedValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ResolvedValue::Null, ResolvedValue::Null) => true,
            (ResolvedValue::Bool(a), ResolvedValue::Bool(b)) => a == b,
            (ResolvedValue::Number(a), ResolvedValue::Number(b)) => a == b,
            (ResolvedValue::String(a), ResolvedValue::String(b)) => a == b,
            (ResolvedValue::Array(a), ResolvedValue::Array(b)) => Rc::ptr_eq(a, b) || a == b,
            (ResolvedValue::Object(a), ResolvedValue::Object(b)) => Rc::ptr_eq(a, b) || a == b,
            _ => false,
        }
    }
}

impl From<&Value> for ResolvedValue {
    fn from(value: &Value) -> Self {
        ResolvedValue::from_json(value)
    }
}

impl From<Value> for ResolvedValue {
    fn from(value: Value) -> Self {
        ResolvedValue::from_json(&value)
    }
}

impl From<&str> for ResolvedValue {
    fn from(value: &str) -> Self {
        ResolvedValue::String(value.to_string())
    }
}

impl fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

impl Serialize for ResolvedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ResolvedValue::Null => serializer.serialize_unit(),
            ResolvedValue::Bool(b) => serializer.serialize_bool(*b),
            ResolvedValue::Number(n) => n.serialize(serializer),
            ResolvedValue::String(s) => serializer.serialize_str(s),
            ResolvedValue::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ResolvedValue::Object(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    out.serialize_entry(key, value)?;
                }
                out.end()
            }
        }
    }
}

/// Deep equality of optional resolved values; two absent values are equal
pub fn values_equal(a: Option<&ResolvedValue>, b: Option<&ResolvedValue>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
