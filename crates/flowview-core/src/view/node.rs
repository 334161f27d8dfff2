//! View AST nodes and the arena that owns them.
//!
//! Nodes never point at each other directly. Children are stored as
//! [`NodeId`] handles and parent links live in a side table of the
//! [`NodeArena`], so the tree can be shared between the parser, the resolver
//! and plugins without reference cycles.

use crate::binding::{Binding, PathSegment};
use crate::error::CoreError;
use crate::expression::Expression;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Handle to a node stored in a [`NodeArena`]. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Discriminant of a [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    /// A standalone asset
    Asset,
    /// The root of a view
    View,
    /// Conditional wrapper
    Applicability,
    /// Array built from a data binding
    Template,
    /// First matching case out of a list
    Switch,
    /// Plain value with optional children
    Value,
    /// Ordered list of nodes merged into an array
    MultiNode,
    /// Resolves to nothing
    Empty,
    /// Something the parser did not recognise
    Unknown,
}

/// A child of a node, placed at `path` inside the parent's value
#[derive(Debug, Clone, PartialEq)]
pub struct Child {
    /// Location of the child's value in the parent's value
    pub path: Vec<PathSegment>,
    /// The child node
    pub value: NodeId,
}

impl Child {
    /// Create a child entry
    pub fn new(path: Vec<PathSegment>, value: NodeId) -> Self {
        Self { path, value }
    }
}

/// One branch of a [`Node::Switch`]
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    /// Condition, the branch is taken when it evaluates truthy
    pub case: Expression,
    /// Node used when the branch is taken
    pub value: NodeId,
}

/// A node of the view AST
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Plain value; objects that are not assets still carry children
    Value {
        /// Raw scalar content of this node, `None` when it only has children
        value: Option<Value>,
        /// Nested nodes
        children: Vec<Child>,
    },
    /// An asset (`{ id, type, ... }`)
    Asset {
        /// Raw asset properties without nested nodes
        value: Option<Value>,
        /// Nested nodes
        children: Vec<Child>,
    },
    /// The root of a view
    View {
        /// Raw view properties without nested nodes
        value: Option<Value>,
        /// Nested nodes
        children: Vec<Child>,
    },
    /// A node that is only present when `expression` evaluates to something other than `false`
    Applicability {
        /// The condition
        expression: Expression,
        /// The wrapped node
        value: NodeId,
    },
    /// One copy of `template` per element of the array at `data`
    Template {
        /// Binding of the source array
        data: Binding,
        /// Raw template content
        template: Value,
        /// Nesting depth, used for `_index_` placeholders
        depth: usize,
        /// Expand while resolving instead of while parsing
        dynamic: bool,
    },
    /// Replaced by the value of its first truthy case
    Switch {
        /// Pick the case while resolving instead of while parsing
        dynamic: bool,
        /// Cases in source order
        cases: Vec<SwitchCase>,
    },
    /// Ordered node list resolved into an array
    MultiNode {
        /// Entries in source order
        values: Vec<NodeId>,
        /// Replace whatever the parent has at this path instead of appending to it
        override_existing: bool,
    },
    /// Resolves to nothing
    Empty,
    /// Unrecognised content
    Unknown,
}

impl Node {
    /// Create a value node with no children
    pub fn value(value: Value) -> Node {
        Node::Value {
            value: Some(value),
            children: Vec::new(),
        }
    }

    /// Build the node of `node_type` that owns `value` and `children`
    pub fn with_type(node_type: NodeType, value: Option<Value>, children: Vec<Child>) -> Node {
        match node_type {
            NodeType::Asset => Node::Asset { value, children },
            NodeType::View => Node::View { value, children },
            _ => Node::Value { value, children },
        }
    }

    /// The node's discriminant
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Value { .. } => NodeType::Value,
            Node::Asset { .. } => NodeType::Asset,
            Node::View { .. } => NodeType::View,
            Node::Applicability { .. } => NodeType::Applicability,
            Node::Template { .. } => NodeType::Template,
            Node::Switch { .. } => NodeType::Switch,
            Node::MultiNode { .. } => NodeType::MultiNode,
            Node::Empty => NodeType::Empty,
            Node::Unknown => NodeType::Unknown,
        }
    }

    /// Raw value of value-carrying nodes
    pub fn raw_value(&self) -> Option<&Value> {
        match self {
            Node::Value { value, .. } | Node::Asset { value, .. } | Node::View { value, .. } => {
                value.as_ref()
            }
            _ => None,
        }
    }

    /// The `id` property of an asset, view or value node
    pub fn id(&self) -> Option<&str> {
        self.raw_value()?.get("id")?.as_str()
    }

    /// Whether this node has a children list
    pub fn has_children(&self) -> bool {
        matches!(
            self,
            Node::Value { .. } | Node::Asset { .. } | Node::View { .. }
        )
    }

    /// Children entries, empty for nodes without children
    pub fn children(&self) -> &[Child] {
        match self {
            Node::Value { children, .. }
            | Node::Asset { children, .. }
            | Node::View { children, .. } => children,
            _ => &[],
        }
    }

    /// Mutable children entries for nodes that have them
    pub fn children_mut(&mut self) -> Option<&mut Vec<Child>> {
        match self {
            Node::Value { children, .. }
            | Node::Asset { children, .. }
            | Node::View { children, .. } => Some(children),
            _ => None,
        }
    }

    /// Nodes the resolver descends into: children entries or multi-node values
    pub fn resolved_descendants(&self) -> Vec<NodeId> {
        match self {
            Node::MultiNode { values, .. } => values.clone(),
            _ => self.children().iter().map(|child| child.value).collect(),
        }
    }

    /// Every node directly referenced by this one, including wrapped nodes
    pub fn referenced_nodes(&self) -> Vec<NodeId> {
        match self {
            Node::Applicability { value, .. } => vec![*value],
            Node::Switch { cases, .. } => cases.iter().map(|case| case.value).collect(),
            _ => self.resolved_descendants(),
        }
    }
}

#[derive(Debug, Default)]
struct ArenaInner {
    next_id: u64,
    nodes: HashMap<NodeId, Rc<Node>>,
    parents: HashMap<NodeId, NodeId>,
}

/// Storage for view nodes with a child-to-parent side table.
///
/// All methods take `&self` and hold the internal borrow only for the
/// duration of the call, so taps running in the middle of a resolve can
/// allocate freely.
#[derive(Debug, Default)]
pub struct NodeArena {
    inner: RefCell<ArenaInner>,
}

impl NodeArena {
    /// Create an empty arena
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a node and return its handle
    pub fn alloc(&self, node: Node) -> NodeId {
        let mut inner = self.inner.borrow_mut();
        inner.next_id += 1;
        let id = NodeId(inner.next_id);
        inner.nodes.insert(id, Rc::new(node));
        id
    }

    /// Look a node up
    pub fn get(&self, id: NodeId) -> Option<Rc<Node>> {
        self.inner.borrow().nodes.get(&id).cloned()
    }

    /// Look a node up, failing with [`CoreError::UnknownNode`]
    pub fn node(&self, id: NodeId) -> Result<Rc<Node>, CoreError> {
        self.get(id)
            .ok_or_else(|| CoreError::UnknownNode(id.to_string()))
    }

    /// Whether `id` is still stored
    pub fn contains(&self, id: NodeId) -> bool {
        self.inner.borrow().nodes.contains_key(&id)
    }

    /// Overwrite the node stored under `id`
    pub fn replace(&self, id: NodeId, node: Node) {
        self.inner.borrow_mut().nodes.insert(id, Rc::new(node));
    }

    /// Parent of `id`, if one was recorded
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.inner.borrow().parents.get(&id).copied()
    }

    /// Record (or clear) the parent of `id`
    pub fn set_parent(&self, id: NodeId, parent: Option<NodeId>) {
        let mut inner = self.inner.borrow_mut();
        match parent {
            Some(parent) => {
                inner.parents.insert(id, parent);
            }
            None => {
                inner.parents.remove(&id);
            }
        }
    }

    /// Number of stored nodes
    pub fn len(&self) -> usize {
        self.inner.borrow().nodes.len()
    }

    /// Whether the arena is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every node not in `live`, returning how many were removed
    pub fn retain(&self, live: &HashSet<NodeId>) -> usize {
        let mut inner = self.inner.borrow_mut();
        let before = inner.nodes.len();
        inner.nodes.retain(|id, _| live.contains(id));
        inner
            .parents
            .retain(|id, parent| live.contains(id) && live.contains(parent));
        before - inner.nodes.len()
    }
}
