//! Turns raw view JSON into arena nodes.

use super::node::{Child, Node, NodeArena, NodeId, NodeType, SwitchCase};
use crate::binding::{Binding, PathSegment};
use crate::data::json_set_in;
use crate::error::CoreError;
use crate::expression::Expression;
use crate::hooks::{FallibleWaterfallHook, SyncWaterfallHook};
use serde_json::{Map, Value};
use std::fmt;
use std::rc::Rc;
use tracing::{debug, warn};

/// Options threaded through nested [`Parser::parse_object`] calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseObjectOptions {
    /// How many templates deep the object being parsed is
    pub template_depth: usize,
}

/// Tap signature of [`ParserHooks::on_parse_object`]
pub type OnParseObject = dyn Fn(Value, &NodeType) -> Value;

/// Tap signature of [`ParserHooks::on_create_ast_node`]
pub type OnCreateAstNode =
    dyn Fn(Option<Node>, &Value, &Parser) -> Result<Option<Node>, CoreError>;

/// Interception points of the [`Parser`]
#[derive(Debug, Default)]
pub struct ParserHooks {
    /// Rewrite an object before it is parsed. Returning `null` skips it.
    pub on_parse_object: SyncWaterfallHook<OnParseObject>,

    /// Replace or drop a node right after it is built, before it is stored.
    ///
    /// Taps receive the raw object the node came from and the parser itself,
    /// so they can parse further content (template expansion does this).
    pub on_create_ast_node: FallibleWaterfallHook<OnCreateAstNode>,
}

#[derive(Debug, Default)]
struct NestedObject {
    value: Option<Value>,
    children: Vec<Child>,
}

/// View parser writing into a shared [`NodeArena`]
pub struct Parser {
    arena: Rc<NodeArena>,
    /// Parser hooks
    pub hooks: ParserHooks,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("nodes", &self.arena.len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Parser {
    /// Create a parser storing its nodes in `arena`
    pub fn new(arena: Rc<NodeArena>) -> Self {
        Self {
            arena,
            hooks: ParserHooks::default(),
        }
    }

    /// The arena nodes are written to
    pub fn arena(&self) -> &Rc<NodeArena> {
        &self.arena
    }

    /// Parse the root of a view
    pub fn parse_view(&self, value: &Value) -> Result<NodeId, CoreError> {
        self.parse_object(value, NodeType::View, ParseObjectOptions::default())?
            .ok_or_else(|| CoreError::Other("Unable to parse object into a view".to_string()))
    }

    /// Parse `obj` into a node of `node_type`.
    ///
    /// Returns `None` when the object carries nothing to resolve or a hook
    /// dropped the node.
    pub fn parse_object(
        &self,
        obj: &Value,
        node_type: NodeType,
        options: ParseObjectOptions,
    ) -> Result<Option<NodeId>, CoreError> {
        if obj.get("applicability").is_some() {
            return self.parse_applicability(obj, node_type, options);
        }
        if is_switch(obj) {
            return self.parse_switch(obj, options);
        }

        let NestedObject { value, children } =
            self.parse_local_object(None, obj, &[], node_type, options)?;

        let base = if value.is_none() && children.is_empty() {
            None
        } else {
            Some(Node::with_type(node_type, value, children))
        };

        self.create_ast_node(base, obj)
    }

    /// Run `node` through `on_create_ast_node` and store the result
    pub fn create_ast_node(&self, node: Option<Node>, raw: &Value) -> Result<Option<NodeId>, CoreError> {
        let created = self.hooks.on_create_ast_node.call(node, raw, self)?;
        Ok(created.map(|node| self.store(node)))
    }

    fn store(&self, node: Node) -> NodeId {
        let referenced = node.referenced_nodes();
        let id = self.arena.alloc(node);
        for child in referenced {
            self.arena.set_parent(child, Some(id));
        }
        id
    }

    fn parse_applicability(
        &self,
        obj: &Value,
        node_type: NodeType,
        options: ParseObjectOptions,
    ) -> Result<Option<NodeId>, CoreError> {
        let mut rest = obj.as_object().cloned().unwrap_or_default();
        let condition = rest.shift_remove("applicability").unwrap_or(Value::Null);

        let expression = condition_expression(&condition, "applicability")?;

        let Some(wrapped) = self.parse_object(&Value::Object(rest), node_type, options)? else {
            return Ok(None);
        };

        self.create_ast_node(
            Some(Node::Applicability {
                expression,
                value: wrapped,
            }),
            obj,
        )
    }

    fn parse_switch(&self, obj: &Value, options: ParseObjectOptions) -> Result<Option<NodeId>, CoreError> {
        let (dynamic, content) = match (obj.get("dynamicSwitch"), obj.get("staticSwitch")) {
            (Some(content), _) => (true, content),
            (None, Some(content)) => (false, content),
            (None, None) => return Ok(None),
        };

        let mut cases = Vec::new();
        for switch_case in content.as_array().map(Vec::as_slice).unwrap_or(&[]) {
            let mut body = switch_case.as_object().cloned().unwrap_or_default();
            let condition = body.shift_remove("case").unwrap_or(Value::Null);
            let case = condition_expression(&condition, "switch case")?;

            if let Some(value) = self.parse_object(&Value::Object(body), NodeType::Value, options)? {
                cases.push(SwitchCase { case, value });
            }
        }

        self.create_ast_node(Some(Node::Switch { dynamic, cases }), obj)
    }

    /// Children for a switch found under `key_path`. A switch that became a
    /// plain wrapper around a single child is flattened into that child.
    fn switch_children(&self, id: NodeId, key_path: Vec<PathSegment>) -> Result<Vec<Child>, CoreError> {
        if let Node::Value { value: None, children } = &*self.arena.node(id)? {
            if let [only] = children.as_slice() {
                let mut path = key_path;
                path.extend(only.path.iter().cloned());
                return Ok(vec![Child::new(path, only.value)]);
            }
        }
        Ok(vec![Child::new(key_path, id)])
    }

    fn parse_templates(
        &self,
        templates: &[Value],
        path: &[PathSegment],
        options: ParseObjectOptions,
    ) -> Result<Vec<Child>, CoreError> {
        let mut children = Vec::new();

        for template in templates {
            let (Some(data), Some(output)) = (
                template.get("data").and_then(Value::as_str),
                template.get("output").and_then(Value::as_str),
            ) else {
                warn!("Skipping template without 'data' and 'output': {}", template);
                continue;
            };

            let node = Node::Template {
                data: Binding::parse(data)?,
                template: template.get("value").cloned().unwrap_or(Value::Null),
                depth: options.template_depth,
                dynamic: template
                    .get("dynamic")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            };

            if let Some(id) = self.create_ast_node(Some(node), template)? {
                children.push(Child::new(with_segment(path, output.into()), id));
            }
        }

        Ok(children)
    }

    fn parse_local_object(
        &self,
        current: Option<Value>,
        obj: &Value,
        path: &[PathSegment],
        node_type: NodeType,
        options: ParseObjectOptions,
    ) -> Result<NestedObject, CoreError> {
        if !obj.is_object() && !obj.is_array() {
            return Ok(NestedObject {
                value: Some(obj.clone()),
                children: Vec::new(),
            });
        }

        let local = self.hooks.on_parse_object.call(obj.clone(), &node_type);
        if local.is_null() {
            debug!("Parsing of object at {:?} skipped by hook", path);
            return Ok(NestedObject {
                value: current,
                children: Vec::new(),
            });
        }

        let entries: Vec<(PathSegment, &Value)> = match &local {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (PathSegment::Index(i), v))
                .collect(),
            Value::Object(map) => map
                .iter()
                .map(|(k, v)| (PathSegment::Key(k.clone()), v))
                .collect(),
            _ => Vec::new(),
        };

        let mut acc = NestedObject {
            value: current,
            children: Vec::new(),
        };

        for (key, local_value) in entries {
            let key_path = with_segment(path, key.clone());
            let key_name = key.as_key();

            if key_name == "asset" && local_value.is_object() {
                if let Some(asset) = self.parse_object(local_value, NodeType::Asset, options)? {
                    acc.children.push(Child::new(key_path, asset));
                }
            } else if key_name == "template" && local_value.is_array() {
                let templates = local_value.as_array().map(Vec::as_slice).unwrap_or(&[]);
                acc.children
                    .extend(self.parse_templates(templates, path, options)?);
            } else if let Value::Array(items) = local_value {
                let mut values = Vec::new();
                for item in items {
                    if let Some(id) = self.parse_object(item, NodeType::Value, options)? {
                        values.push(id);
                    }
                }

                if !values.is_empty() {
                    let multi = Node::MultiNode {
                        values,
                        override_existing: !has_template_values(&local, &key_name),
                    };
                    if let Some(id) = self.create_ast_node(Some(multi), local_value)? {
                        acc.children.push(Child::new(key_path, id));
                    }
                }
            } else if is_switch(local_value) {
                if let Some(id) = self.parse_switch(local_value, options)? {
                    acc.children.extend(self.switch_children(id, key_path)?);
                }
            } else if local_value.is_object() {
                if local_value.get("applicability").is_some() {
                    if let Some(id) =
                        self.parse_applicability(local_value, NodeType::Value, options)?
                    {
                        acc.children.push(Child::new(key_path, id));
                    }
                } else {
                    let nested =
                        self.parse_local_object(acc.value.take(), local_value, &key_path, node_type, options)?;
                    acc.value = nested.value;
                    acc.children.extend(nested.children);
                }
            } else {
                let mut value = acc.value.take().unwrap_or(Value::Object(Map::new()));
                json_set_in(&mut value, &key_path, local_value.clone());
                acc.value = Some(value);
            }
        }

        Ok(acc)
    }
}

fn with_segment(path: &[PathSegment], segment: PathSegment) -> Vec<PathSegment> {
    let mut next = path.to_vec();
    next.push(segment);
    next
}

fn is_switch(obj: &Value) -> bool {
    obj.get("staticSwitch").is_some() || obj.get("dynamicSwitch").is_some()
}

fn condition_expression(condition: &Value, kind: &str) -> Result<Expression, CoreError> {
    match condition {
        Value::Bool(b) => Ok(Expression::Single(b.to_string())),
        other => Expression::from_value(other).ok_or_else(|| {
            CoreError::ExpressionError(format!("Invalid {} expression: {}", kind, other))
        }),
    }
}

fn has_template_values(obj: &Value, key: &str) -> bool {
    obj.get("template")
        .and_then(Value::as_array)
        .map(|templates| {
            templates
                .iter()
                .any(|t| t.get("output").and_then(Value::as_str) == Some(key))
        })
        .unwrap_or(false)
}
