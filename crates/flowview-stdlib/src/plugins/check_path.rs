//! Queries over the position of assets in the resolved view.
//!
//! The plugin records every node result the resolver reports through
//! `after_node_update`, keyed by the original node, so asset lookups always
//! reflect the last update. Nodes removed by applicability have no id entry.

use flowview_core::binding::PathSegment;
use flowview_core::view::{Node, NodeType};
use flowview_core::{NodeArena, NodeId, ResolvedNode, ResolvedValue, Resolver, ViewPlugin};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Matches the resolved value of an asset or view
#[derive(Clone)]
pub enum Query {
    /// The `type` property equals this string
    Type(String),
    /// Every key of this object matches, recursively
    Partial(Value),
    /// Custom predicate
    Predicate(Rc<dyn Fn(&Value) -> bool>),
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Type(asset_type) => f.debug_tuple("Type").field(asset_type).finish(),
            Query::Partial(pattern) => f.debug_tuple("Partial").field(pattern).finish(),
            Query::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Query {
    /// Query from a closure
    pub fn predicate(matcher: impl Fn(&Value) -> bool + 'static) -> Self {
        Query::Predicate(Rc::new(matcher))
    }

    /// Whether `value` satisfies the query
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Query::Type(asset_type) => value.get("type").and_then(Value::as_str) == Some(asset_type),
            Query::Partial(pattern) => partial_match(pattern, value),
            Query::Predicate(matcher) => matcher(value),
        }
    }
}

impl From<&str> for Query {
    fn from(asset_type: &str) -> Self {
        Query::Type(asset_type.to_string())
    }
}

impl From<Value> for Query {
    fn from(value: Value) -> Self {
        match value {
            Value::String(asset_type) => Query::Type(asset_type),
            pattern => Query::Partial(pattern),
        }
    }
}

fn partial_match(pattern: &Value, value: &Value) -> bool {
    match (pattern, value) {
        (Value::Object(expected), Value::Object(actual)) => expected.iter().all(|(key, expected)| {
            actual
                .get(key)
                .map(|actual| partial_match(expected, actual))
                .unwrap_or(false)
        }),
        _ => pattern == value,
    }
}

#[derive(Debug, Clone)]
struct Entry {
    resolved: ResolvedNode,
    parent: Option<NodeId>,
}

#[derive(Debug, Default)]
struct ViewInfo {
    arena: Option<Rc<NodeArena>>,
    entries: HashMap<NodeId, Entry>,
    sources: HashMap<NodeId, NodeId>,
    asset_ids: HashMap<String, NodeId>,
}

impl ViewInfo {
    fn clear(&mut self) {
        self.entries.clear();
        self.sources.clear();
        self.asset_ids.clear();
    }

    fn record(&mut self, original: NodeId, parent: Option<NodeId>, resolved: &ResolvedNode) {
        if let (Some(node), Some(value)) = (self.resolved_node(resolved.node), &resolved.value) {
            if matches!(node.node_type(), NodeType::Asset | NodeType::View) {
                if let Some(id) = value.get("id").and_then(ResolvedValue::as_str) {
                    self.asset_ids.insert(id.to_string(), original);
                }
            }
        }

        self.sources.insert(resolved.node, original);
        self.entries.insert(
            original,
            Entry {
                resolved: resolved.clone(),
                parent,
            },
        );
    }

    fn resolved_node(&self, id: NodeId) -> Option<Rc<Node>> {
        self.arena.as_ref()?.get(id)
    }

    fn node_type(&self, original: NodeId) -> Option<NodeType> {
        let entry = self.entries.get(&original)?;
        Some(self.resolved_node(entry.resolved.node)?.node_type())
    }

    fn is_asset(&self, original: NodeId) -> bool {
        matches!(
            self.node_type(original),
            Some(NodeType::Asset) | Some(NodeType::View)
        )
    }

    fn value(&self, original: NodeId) -> Option<Value> {
        self.entries
            .get(&original)?
            .resolved
            .value
            .as_ref()
            .map(ResolvedValue::to_json)
    }

    fn value_of_resolved(&self, resolved: NodeId) -> Option<Value> {
        self.value(*self.sources.get(&resolved)?)
            .filter(|value| !value.is_null())
    }

    fn parent(&self, original: NodeId) -> Option<NodeId> {
        self.entries.get(&original)?.parent
    }

    /// Closest asset or view above `original`
    fn parent_asset(&self, original: NodeId) -> Option<NodeId> {
        let mut working = self.parent(original)?;
        while !self.is_asset(working) {
            working = self.parent(working)?;
        }
        Some(working)
    }

    /// Segments placing `child` inside `parent`'s resolved value
    fn child_path(&self, parent: NodeId, child: NodeId) -> Vec<PathSegment> {
        let (Some(parent_entry), Some(child_entry)) =
            (self.entries.get(&parent), self.entries.get(&child))
        else {
            return Vec::new();
        };
        let Some(parent_node) = self.resolved_node(parent_entry.resolved.node) else {
            return Vec::new();
        };
        let working = child_entry.resolved.node;

        match &*parent_node {
            Node::MultiNode { values, .. } => {
                let Some(index) = values.iter().position(|value| *value == working) else {
                    return Vec::new();
                };
                let skipped = values[..index]
                    .iter()
                    .filter(|value| self.value_of_resolved(**value).is_none())
                    .count();
                vec![PathSegment::Index(index - skipped)]
            }
            node => node
                .children()
                .iter()
                .find(|entry| entry.value == working)
                .map(|entry| entry.path.clone())
                .unwrap_or_default(),
        }
    }

    fn find_child_path(&self, resolved: NodeId, queries: &[Query], include_self: bool) -> bool {
        if queries.is_empty() {
            return true;
        }
        let Some(node) = self.resolved_node(resolved) else {
            return false;
        };

        match &*node {
            Node::MultiNode { values, .. } => values
                .iter()
                .any(|value| self.find_child_path(*value, queries, true)),
            Node::Asset { children, .. } | Node::View { children, .. } => {
                let includes_self = include_self
                    && self
                        .value_of_resolved(resolved)
                        .map(|value| queries[0].matches(&value))
                        .unwrap_or(false);
                let remaining = if includes_self { &queries[1..] } else { queries };
                if remaining.is_empty() {
                    return true;
                }
                children
                    .iter()
                    .any(|child| self.find_child_path(child.value, remaining, true))
            }
            node => node
                .children()
                .iter()
                .any(|child| self.find_child_path(child.value, queries, true)),
        }
    }
}

/// Answers where an asset sits in the current view: its parents, the
/// property it lives on, and its path from the view root.
///
/// Keep an `Rc` to the plugin to query it after each update.
#[derive(Debug, Default)]
pub struct CheckPathPlugin {
    info: Rc<RefCell<ViewInfo>>,
}

impl CheckPathPlugin {
    /// Create the plugin
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved value of the asset or view with `id`
    pub fn get_asset(&self, id: &str) -> Option<ResolvedValue> {
        let info = self.info.borrow();
        let original = *info.asset_ids.get(id)?;
        info.entries.get(&original)?.resolved.value.clone()
    }

    /// Walk up from the asset `id` and return the ancestor matching the
    /// last of `queries`, each query matching a further ancestor. With no
    /// queries this is the closest asset or view above `id`.
    pub fn get_parent(&self, id: &str, queries: &[Query]) -> Option<ResolvedValue> {
        let info = self.info.borrow();
        let original = *info.asset_ids.get(id)?;
        let mut candidate = info.parent_asset(original);

        let mut pending = queries.iter();
        let Some(mut query) = pending.next() else {
            let parent = candidate?;
            return info.entries.get(&parent)?.resolved.value.clone();
        };

        while let Some(current) = candidate {
            let value = info.value(current);
            if value.map(|value| query.matches(&value)).unwrap_or(false) {
                match pending.next() {
                    Some(next) => query = next,
                    None => return info.entries.get(&current)?.resolved.value.clone(),
                }
            }
            candidate = info.parent_asset(current);
        }

        None
    }

    /// Property of the closest asset or view that contains the asset `id`
    pub fn get_parent_prop(&self, id: &str) -> Option<PathSegment> {
        let info = self.info.borrow();
        let mut working = *info.asset_ids.get(id)?;
        let mut parent = info.parent(working)?;

        while !info.is_asset(parent) {
            working = parent;
            parent = info.parent(working)?;
        }

        info.child_path(parent, working).into_iter().next()
    }

    /// Path from the view root to the asset `id`.
    ///
    /// With queries the path starts below the ancestor matching the last
    /// query instead; `None` when the queries cannot all be matched. Array
    /// indices count only entries that resolved to something.
    pub fn get_path(&self, id: &str, queries: &[Query]) -> Option<Vec<PathSegment>> {
        let info = self.info.borrow();
        let mut working = *info.asset_ids.get(id)?;
        let mut path: Vec<PathSegment> = Vec::new();
        let mut pending = queries.iter();
        let mut query = pending.next();

        while let Some(parent) = info.parent(working) {
            let mut segment = info.child_path(parent, working);
            segment.extend(path);
            path = segment;

            if let Some(current) = query {
                let matched = info
                    .value(parent)
                    .map(|value| current.matches(&value))
                    .unwrap_or(false);
                if matched {
                    query = pending.next();
                    if query.is_none() {
                        return Some(path);
                    }
                }
            }

            working = parent;
        }

        query.is_none().then_some(path)
    }

    /// Whether the ancestors of the asset `id` satisfy `queries` in order
    pub fn has_parent_context(&self, id: &str, queries: &[Query]) -> bool {
        self.get_parent(id, queries).is_some()
    }

    /// Whether the descendants of the asset `id` satisfy `queries` in order
    pub fn has_child_context(&self, id: &str, queries: &[Query]) -> bool {
        let info = self.info.borrow();
        let Some(entry) = info
            .asset_ids
            .get(id)
            .and_then(|original| info.entries.get(original))
        else {
            return false;
        };

        info.find_child_path(entry.resolved.node, queries, false)
    }
}

impl ViewPlugin for CheckPathPlugin {
    fn name(&self) -> &str {
        "check-path"
    }

    fn apply_resolver(&self, resolver: &Rc<Resolver>) {
        {
            let mut info = self.info.borrow_mut();
            info.clear();
            info.arena = Some(Rc::clone(resolver.arena()));
        }

        let info = Rc::clone(&self.info);
        resolver
            .hooks
            .before_update
            .tap(self.name(), move |_| info.borrow_mut().clear());

        let info = Rc::clone(&self.info);
        resolver
            .hooks
            .after_node_update
            .tap(self.name(), move |original, parent, resolved| {
                info.borrow_mut().record(*original, *parent, resolved);
            });
    }
}
