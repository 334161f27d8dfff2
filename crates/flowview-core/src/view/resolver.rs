//! Incremental resolution of a view AST into [`ResolvedValue`]s.
//!
//! Every update walks the tree from the root. A node whose recorded
//! dependencies do not overlap the changed bindings reuses its previous
//! result, subtree included, so untouched parts of the output keep their
//! identity. Results are cached under the original (pre-transform) node and
//! the cache is rebuilt from scratch on each update.

use super::node::{Node, NodeArena, NodeId, NodeType};
use super::parser::{ParseObjectOptions, Parser};
use super::value::{values_equal, ResolvedValue};
use crate::binding::Binding;
use crate::data::{DataModel, DependencyModel, DependencyScope};
use crate::error::CoreError;
use crate::expression::{Expression, ExpressionEvaluator};
use crate::hooks::{FallibleWaterfallHook, SyncHook, SyncWaterfallHook};
use crate::logger::{Logger, TracingLogger};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Function turning a raw binding string into a [`Binding`]
pub type BindingParser = fn(&str) -> Result<Binding, CoreError>;

/// Collaborators a [`Resolver`] works with
#[derive(Clone)]
pub struct ResolverOptions {
    /// Data the view reads from
    pub model: Rc<dyn DataModel>,
    /// Evaluator for expressions found in the view
    pub evaluator: Rc<dyn ExpressionEvaluator>,
    /// Diagnostics sink, `tracing` when unset
    pub logger: Option<Rc<dyn Logger>>,
    /// Parser for content created while resolving (dynamic templates)
    pub parser: Option<Rc<Parser>>,
    /// Binding parser handed to plugins
    pub parse_binding: BindingParser,
}

impl ResolverOptions {
    /// Options with the default logger and binding parser and no parser
    pub fn new(model: Rc<dyn DataModel>, evaluator: Rc<dyn ExpressionEvaluator>) -> Self {
        Self {
            model,
            evaluator,
            logger: None,
            parser: None,
            parse_binding: Binding::parse,
        }
    }

    /// Use `logger` for diagnostics
    pub fn with_logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Allow resolve-time parsing with `parser`
    pub fn with_parser(mut self, parser: Rc<Parser>) -> Self {
        self.parser = Some(parser);
        self
    }
}

impl fmt::Debug for ResolverOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverOptions")
            .field("model", &self.model)
            .field("evaluator", &self.evaluator)
            .field("logger", &self.logger)
            .field("parser", &self.parser.is_some())
            .finish()
    }
}

/// Transformed node to original node, rebuilt on every update
#[derive(Debug, Clone, Default)]
pub struct AstMap {
    inner: Rc<RefCell<HashMap<NodeId, NodeId>>>,
}

impl AstMap {
    /// Original node `transformed` was produced from
    pub fn get(&self, transformed: NodeId) -> Option<NodeId> {
        self.inner.borrow().get(&transformed).copied()
    }

    fn insert(&self, transformed: NodeId, original: NodeId) {
        self.inner.borrow_mut().insert(transformed, original);
    }

    fn take(&self) -> HashMap<NodeId, NodeId> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }

    fn restore(&self, map: HashMap<NodeId, NodeId>) {
        *self.inner.borrow_mut() = map;
    }
}

/// Per-node options handed to every resolver hook.
///
/// `model` records reads against the node being resolved, so anything a
/// plugin reads through these options becomes a dependency of that node.
#[derive(Clone)]
pub struct NodeResolveOptions {
    /// Dependency-tracked data model for the current node
    pub model: Rc<dyn DataModel>,
    /// Expression evaluator
    pub evaluator: Rc<dyn ExpressionEvaluator>,
    /// Diagnostics sink
    pub logger: Rc<dyn Logger>,
    /// Node being resolved; the transformed node once `before_resolve` ran
    pub node: Option<NodeId>,
    /// Binding parser
    pub parse_binding: BindingParser,
    tracker: Option<Rc<DependencyModel>>,
    arena: Rc<NodeArena>,
    parser: Option<Rc<Parser>>,
    ast_map: AstMap,
}

impl NodeResolveOptions {
    /// Evaluate `expression` against the tracked model
    pub fn evaluate(&self, expression: &Expression) -> Result<Value, CoreError> {
        self.evaluator.evaluate(expression, self.model.as_ref())
    }

    /// Read `binding` from the tracked model
    pub fn get(&self, binding: &Binding) -> Value {
        self.model.get(binding)
    }

    /// Parse a raw binding string
    pub fn parse_binding(&self, raw: &str) -> Result<Binding, CoreError> {
        (self.parse_binding)(raw)
    }

    /// Parse new content into the arena while resolving
    pub fn parse_node(
        &self,
        value: &Value,
        options: ParseObjectOptions,
    ) -> Result<Option<NodeId>, CoreError> {
        let parser = self.parser.as_ref().ok_or_else(|| {
            CoreError::Other("No parser available for resolve-time parsing".to_string())
        })?;
        parser.parse_object(value, NodeType::Value, options)
    }

    /// Node storage
    pub fn arena(&self) -> &Rc<NodeArena> {
        &self.arena
    }

    /// Original node a transformed node came from
    pub fn source_node(&self, transformed: NodeId) -> Option<NodeId> {
        self.ast_map.get(transformed)
    }

    /// Bindings read so far by the current node, optionally limited to one scope
    pub fn get_dependencies(&self, scope: Option<DependencyScope>) -> HashSet<Binding> {
        self.tracker
            .as_ref()
            .map(|tracker| tracker.get_dependencies(scope))
            .unwrap_or_default()
    }
}

impl fmt::Debug for NodeResolveOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeResolveOptions")
            .field("node", &self.node)
            .field("model", &self.model)
            .finish()
    }
}

/// Outcome of resolving one node
#[derive(Debug, Clone)]
pub struct ResolvedNode {
    /// The node after `before_resolve`
    pub node: NodeId,
    /// Resolved value, `None` when the node resolved to nothing
    pub value: Option<ResolvedValue>,
    /// Every binding read by the node or its descendants
    pub dependencies: Rc<HashSet<Binding>>,
    /// Whether the value changed in this update
    pub updated: bool,
}

/// Tap signature of [`ResolverHooks::resolve_options`]
pub type ResolveOptionsTap = dyn Fn(NodeResolveOptions, &Node) -> NodeResolveOptions;
/// Tap signature of [`ResolverHooks::skip_resolve`]
pub type SkipResolveTap = dyn Fn(bool, &Node, &NodeResolveOptions) -> bool;
/// Tap signature of [`ResolverHooks::before_resolve`]
pub type BeforeResolveTap =
    dyn Fn(Option<Node>, &NodeResolveOptions) -> Result<Option<Node>, CoreError>;
/// Tap signature of [`ResolverHooks::resolve`] and [`ResolverHooks::after_resolve`]
pub type ResolveTap = dyn Fn(
    Option<ResolvedValue>,
    &Node,
    &NodeResolveOptions,
) -> Result<Option<ResolvedValue>, CoreError>;

/// Interception points of the [`Resolver`]
#[derive(Debug, Default)]
pub struct ResolverHooks {
    /// Build the options used for a node
    pub resolve_options: SyncWaterfallHook<ResolveOptionsTap>,
    /// Decide whether a node may reuse its previous result; seeded with "data unchanged"
    pub skip_resolve: SyncWaterfallHook<SkipResolveTap>,
    /// Rewrite a node before resolving it; `None` resolves to an empty node
    pub before_resolve: FallibleWaterfallHook<BeforeResolveTap>,
    /// Resolve a node's own value, before its children
    pub resolve: FallibleWaterfallHook<ResolveTap>,
    /// Post-process a node's value once its children are merged in
    pub after_resolve: FallibleWaterfallHook<ResolveTap>,
    /// Called with the changed bindings before an update
    pub before_update: SyncHook<dyn Fn(&Option<HashSet<Binding>>)>,
    /// Called with the new root value after an update
    pub after_update: SyncHook<dyn Fn(&Option<ResolvedValue>)>,
    /// Called with (original node, original parent, result) for every node visited
    pub after_node_update: SyncHook<dyn Fn(&NodeId, &Option<NodeId>, &ResolvedNode)>,
}

struct UpdatePass {
    changes: Option<HashSet<Binding>>,
    next_cache: HashMap<NodeId, ResolvedNode>,
    prev_ast_map: HashMap<NodeId, NodeId>,
    id_cache: HashSet<String>,
}

/// Whether a node with `dependencies` has to be recomputed for `changes`
pub fn cares_about_data_changes(
    changes: Option<&HashSet<Binding>>,
    dependencies: Option<&HashSet<Binding>>,
) -> bool {
    let (Some(changes), Some(dependencies)) = (changes, dependencies) else {
        return true;
    };

    dependencies
        .iter()
        .any(|dep| changes.iter().any(|change| change.overlaps(dep)))
}

/// Incremental view resolver
pub struct Resolver {
    root: NodeId,
    arena: Rc<NodeArena>,
    options: ResolverOptions,
    logger: Rc<dyn Logger>,
    cache: RefCell<HashMap<NodeId, ResolvedNode>>,
    ast_map: AstMap,
    reported_ids: RefCell<HashSet<String>>,
    /// Resolver hooks
    pub hooks: ResolverHooks,
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resolver")
            .field("root", &self.root)
            .field("cached", &self.cache.borrow().len())
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Resolver {
    /// Create a resolver for the tree rooted at `root`
    pub fn new(root: NodeId, arena: Rc<NodeArena>, options: ResolverOptions) -> Self {
        let logger = options
            .logger
            .clone()
            .unwrap_or_else(|| Rc::new(TracingLogger));

        Self {
            root,
            arena,
            options,
            logger,
            cache: RefCell::new(HashMap::new()),
            ast_map: AstMap::default(),
            reported_ids: RefCell::new(HashSet::new()),
            hooks: ResolverHooks::default(),
        }
    }

    /// Root of the source tree
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node storage shared with the parser
    pub fn arena(&self) -> &Rc<NodeArena> {
        &self.arena
    }

    /// Original node a transformed node was produced from in the last update
    pub fn get_source_node(&self, transformed: NodeId) -> Option<NodeId> {
        self.ast_map.get(transformed)
    }

    /// Copy of the results of the last update, keyed by original node
    pub fn get_resolve_cache(&self) -> HashMap<NodeId, ResolvedNode> {
        self.cache.borrow().clone()
    }

    /// Resolve the tree.
    ///
    /// `changes` lists the bindings modified since the previous call; `None`
    /// recomputes every node. When a hook fails the error is returned and
    /// the previous results stay in place.
    pub fn update(
        &self,
        changes: Option<HashSet<Binding>>,
    ) -> Result<Option<ResolvedValue>, CoreError> {
        self.hooks.before_update.call(&changes);

        let mut pass = UpdatePass {
            changes,
            next_cache: HashMap::new(),
            prev_ast_map: self.ast_map.take(),
            id_cache: HashSet::new(),
        };

        let base = self.root_options();
        let resolved = match self.compute_tree(self.root, None, &mut pass, &base, None) {
            Ok(resolved) => resolved,
            Err(err) => {
                self.ast_map.restore(pass.prev_ast_map);
                return Err(err);
            }
        };

        *self.cache.borrow_mut() = pass.next_cache;
        self.collect_garbage();

        self.hooks.after_update.call(&resolved.value);
        Ok(resolved.value)
    }

    fn root_options(&self) -> NodeResolveOptions {
        NodeResolveOptions {
            model: Rc::clone(&self.options.model),
            evaluator: Rc::clone(&self.options.evaluator),
            logger: Rc::clone(&self.logger),
            node: None,
            parse_binding: self.options.parse_binding,
            tracker: None,
            arena: Rc::clone(&self.arena),
            parser: self.options.parser.clone(),
            ast_map: self.ast_map.clone(),
        }
    }

    fn previous_result(&self, node_id: NodeId, pass: &mut UpdatePass) -> Option<ResolvedNode> {
        let node = self.arena.get(node_id)?;

        if let Some(id) = node.id() {
            if !pass.id_cache.insert(id.to_string()) {
                if self.reported_ids.borrow_mut().insert(id.to_string()) {
                    match node.node_type() {
                        NodeType::Asset | NodeType::View => self.logger.error(&format!(
                            "Cache conflict: Found Asset/View nodes that have conflicting ids: {}, may cause cache issues.",
                            id
                        )),
                        NodeType::Value => self.logger.info(&format!(
                            "Cache conflict: Found Value nodes that have conflicting ids: {}, may cause cache issues. To improve performance make value node IDs globally unique.",
                            id
                        )),
                        _ => {}
                    }
                }
                return None;
            }
        }

        self.cache.borrow().get(&node_id).cloned()
    }

    fn repopulate_from_cache(
        &self,
        resolved: &ResolvedNode,
        original: NodeId,
        original_parent: Option<NodeId>,
        pass: &mut UpdatePass,
    ) -> Result<(), CoreError> {
        self.ast_map.insert(resolved.node, original);

        let update = ResolvedNode {
            updated: false,
            ..resolved.clone()
        };
        pass.next_cache.insert(original, update.clone());

        let transformed = self.arena.node(resolved.node)?;
        for child in transformed.resolved_descendants() {
            let original_child = pass.prev_ast_map.get(&child).copied().unwrap_or(child);
            if let Some(previous) = self.previous_result(original_child, pass) {
                self.repopulate_from_cache(&previous, original_child, Some(original), pass)?;
            }
        }

        self.hooks
            .after_node_update
            .call(&original, &original_parent, &update);
        Ok(())
    }

    fn compute_tree(
        &self,
        node_id: NodeId,
        raw_parent: Option<NodeId>,
        pass: &mut UpdatePass,
        parent_options: &NodeResolveOptions,
        resolved_parent: Option<NodeId>,
    ) -> Result<ResolvedNode, CoreError> {
        let node = self.arena.node(node_id)?;

        let tracker = Rc::new(DependencyModel::new(Rc::clone(&parent_options.model)));
        let tracked: Rc<dyn DataModel> = tracker.clone();

        let mut base = parent_options.clone();
        base.model = tracked;
        base.tracker = Some(Rc::clone(&tracker));
        base.node = Some(node_id);
        let mut options = self.hooks.resolve_options.call(base, &node);

        let previous = self.previous_result(node_id, pass);
        let data_changed = cares_about_data_changes(
            pass.changes.as_ref(),
            previous.as_ref().map(|p| p.dependencies.as_ref()),
        );
        let skip = self.hooks.skip_resolve.call(!data_changed, &node, &options);

        if let (Some(previous), true) = (&previous, skip) {
            self.arena.set_parent(previous.node, resolved_parent);
            self.repopulate_from_cache(previous, node_id, raw_parent, pass)?;
            return Ok(ResolvedNode {
                updated: false,
                ..previous.clone()
            });
        }

        let mut transformed = self
            .hooks
            .before_resolve
            .call(Some((*node).clone()), &options)?
            .unwrap_or(Node::Empty);

        let resolved_id = self.arena.alloc(transformed.clone());
        self.arena.set_parent(resolved_id, resolved_parent);
        self.ast_map.insert(resolved_id, node_id);
        options.node = Some(resolved_id);

        let mut value = self.hooks.resolve.call(None, &transformed, &options)?;
        let previous_value = previous.as_ref().and_then(|p| p.value.as_ref());
        let mut updated = !values_equal(previous_value, value.as_ref());
        if let (Some(previous), false) = (&previous, updated) {
            value = previous.value.clone();
        }

        let mut child_dependencies = HashSet::new();
        {
            let _children = tracker.track_scope(DependencyScope::Children);

            if let Node::MultiNode { values, .. } = &mut transformed {
                let mut items = Vec::with_capacity(values.len());
                let mut resolved_values = Vec::with_capacity(values.len());

                for &entry in values.iter() {
                    let tree =
                        self.compute_tree(entry, Some(node_id), pass, &options, Some(resolved_id))?;

                    if let Some(item) = tree.value.as_ref().filter(|v| !v.is_null()) {
                        child_dependencies.extend(tree.dependencies.iter().cloned());
                        updated = updated || tree.updated;
                        items.push(item.clone());
                    }
                    resolved_values.push(tree.node);
                }

                *values = resolved_values;
                value = Some(ResolvedValue::array(items));
            } else if let Some(children) = transformed.children_mut() {
                for child in children.iter_mut() {
                    let tree = self.compute_tree(
                        child.value,
                        Some(node_id),
                        pass,
                        &options,
                        Some(resolved_id),
                    )?;
                    child_dependencies.extend(tree.dependencies.iter().cloned());

                    if let Some(child_value) = tree.value.as_ref().filter(|v| !v.is_null()) {
                        let appends = matches!(
                            *self.arena.node(tree.node)?,
                            Node::MultiNode {
                                override_existing: false,
                                ..
                            }
                        );
                        let current = value.take().unwrap_or(ResolvedValue::Null);
                        value = Some(if appends {
                            current.append_in(&child.path, child_value)
                        } else {
                            current.set_in(&child.path, child_value.clone())
                        });
                    }

                    updated = updated || tree.updated;
                    child.value = tree.node;
                }
            }

            for dependency in &child_dependencies {
                tracker.add_child_read_dep(dependency.clone());
            }
        }

        if let (Some(previous), false) = (&previous, updated) {
            value = previous.value.clone();
        }

        self.arena.replace(resolved_id, transformed.clone());
        let value = self.hooks.after_resolve.call(value, &transformed, &options)?;

        let mut dependencies = tracker.get_dependencies(None);
        dependencies.extend(child_dependencies);

        let update = ResolvedNode {
            node: resolved_id,
            value,
            dependencies: Rc::new(dependencies),
            updated,
        };

        self.hooks
            .after_node_update
            .call(&node_id, &raw_parent, &update);
        pass.next_cache.insert(node_id, update.clone());

        Ok(update)
    }

    /// Drop nodes no longer reachable from the source tree or the cache
    fn collect_garbage(&self) {
        let mut stack = vec![self.root];
        for (original, resolved) in self.cache.borrow().iter() {
            stack.push(*original);
            stack.push(resolved.node);
        }

        let mut live = HashSet::new();
        while let Some(id) = stack.pop() {
            if !live.insert(id) {
                continue;
            }
            if let Some(node) = self.arena.get(id) {
                stack.extend(node.referenced_nodes());
            }
        }

        let removed = self.arena.retain(&live);
        if removed > 0 {
            debug!("Released {} view nodes after update", removed);
        }
    }
}
