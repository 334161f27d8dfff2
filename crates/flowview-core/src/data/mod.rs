//! Data model collaborators: the model trait, an in-memory model and the
//! dependency-tracking decorator the resolver wraps around it.

mod dependency;
mod local;

pub use dependency::{DependencyModel, DependencyScope, ScopeGuard};
pub use local::LocalModel;

use crate::binding::{Binding, PathSegment};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fmt::Debug;

/// A single change applied by [`DataModel::set`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Where the change happened
    pub binding: Binding,
    /// Value before the write (`null` when absent)
    pub old_value: Value,
    /// Value after the write
    pub new_value: Value,
}

/// Reads and writes against application data.
///
/// Missing paths read as `Value::Null`. Models use interior mutability so a
/// shared model can be wrapped by several trackers within one update.
pub trait DataModel: Debug {
    /// Read the value at `binding`
    fn get(&self, binding: &Binding) -> Value;

    /// Apply a transaction of writes, returning the updates that changed data
    fn set(&self, transaction: Vec<(Binding, Value)>) -> Vec<Update>;
}

/// Collect the bindings touched by a batch of updates
pub fn changed_bindings(updates: &[Update]) -> HashSet<Binding> {
    updates.iter().map(|update| update.binding.clone()).collect()
}

/// Read a path out of a JSON value
pub(crate) fn json_get_in<'a>(value: &'a Value, path: &[PathSegment]) -> Option<&'a Value> {
    let mut current = value;
    for segment in path {
        current = match (segment, current) {
            (PathSegment::Key(key), Value::Object(map)) => map.get(key)?,
            (PathSegment::Index(index), Value::Array(items)) => items.get(*index)?,
            (PathSegment::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
            (PathSegment::Key(key), Value::Array(items)) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `new_value` at `path`, creating objects (or arrays for index
/// segments) along the way
pub(crate) fn json_set_in(target: &mut Value, path: &[PathSegment], new_value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *target = new_value;
        return;
    };

    match head {
        PathSegment::Key(_) if !target.is_object() => {
            *target = Value::Object(serde_json::Map::new());
        }
        PathSegment::Index(_) if !target.is_object() && !target.is_array() => {
            *target = Value::Array(Vec::new());
        }
        _ => {}
    }

    let slot = match (head, target) {
        (PathSegment::Key(key), Value::Object(map)) => map.entry(key.clone()).or_insert(Value::Null),
        (PathSegment::Index(index), Value::Object(map)) => {
            map.entry(index.to_string()).or_insert(Value::Null)
        }
        (PathSegment::Index(index), Value::Array(items)) => {
            if items.len() <= *index {
                items.resize(*index + 1, Value::Null);
            }
            &mut items[*index]
        }
        _ => return,
    };

    json_set_in(slot, rest, new_value);
}
