//! View parsing and incremental resolution.

pub mod node;
pub mod parser;
pub mod resolver;
pub mod value;

pub use node::{Child, Node, NodeArena, NodeId, NodeType, SwitchCase};
pub use parser::{ParseObjectOptions, Parser, ParserHooks};
pub use resolver::{
    cares_about_data_changes, AstMap, NodeResolveOptions, ResolvedNode, Resolver, ResolverHooks,
    ResolverOptions,
};
pub use value::ResolvedValue;

use crate::binding::Binding;
use crate::error::CoreError;
use crate::hooks::SyncHook;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Extension point for view behaviour.
///
/// Plugins are applied once, when a [`ViewInstance`] builds its parser and
/// resolver on the first update.
pub trait ViewPlugin {
    /// Name used for hook taps and diagnostics
    fn name(&self) -> &str;

    /// Register parser taps
    fn apply_parser(&self, _parser: &Parser) {}

    /// Register resolver taps
    fn apply_resolver(&self, _resolver: &Rc<Resolver>) {}
}

/// Hooks of a [`ViewInstance`]
#[derive(Debug, Default)]
pub struct ViewHooks {
    /// Called with the parser before the view is parsed
    pub parser: SyncHook<dyn Fn(&Parser)>,
    /// Called with the resolver once it exists
    pub resolver: SyncHook<dyn Fn(&Rc<Resolver>)>,
    /// Called whenever an update produced a new root value
    pub on_update: SyncHook<dyn Fn(&Option<ResolvedValue>)>,
}

/// A view from a content document, resolved against live data
pub struct ViewInstance {
    initial_view: Value,
    resolver_options: ResolverOptions,
    arena: Rc<NodeArena>,
    plugins: Vec<Rc<dyn ViewPlugin>>,
    resolver: RefCell<Option<Rc<Resolver>>>,
    last_update: RefCell<Option<ResolvedValue>>,
    /// View hooks
    pub hooks: ViewHooks,
}

impl fmt::Debug for ViewInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewInstance")
            .field("id", &self.id())
            .field("plugins", &self.plugins.iter().map(|p| p.name()).collect::<Vec<_>>())
            .field("started", &self.resolver.borrow().is_some())
            .finish()
    }
}

impl ViewInstance {
    /// Create an instance for `initial_view`
    pub fn new(initial_view: Value, resolver_options: ResolverOptions) -> Self {
        Self {
            initial_view,
            resolver_options,
            arena: Rc::new(NodeArena::new()),
            plugins: Vec::new(),
            resolver: RefCell::new(None),
            last_update: RefCell::new(None),
            hooks: ViewHooks::default(),
        }
    }

    /// Add a plugin; it takes effect on the first update
    pub fn with_plugin(mut self, plugin: Rc<dyn ViewPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// The `id` of the authored view
    pub fn id(&self) -> Option<&str> {
        self.initial_view.get("id").and_then(Value::as_str)
    }

    /// The authored view
    pub fn initial_view(&self) -> &Value {
        &self.initial_view
    }

    /// The resolver, once the first update has run
    pub fn resolver(&self) -> Option<Rc<Resolver>> {
        self.resolver.borrow().clone()
    }

    /// Result of the last update
    pub fn last_update(&self) -> Option<ResolvedValue> {
        self.last_update.borrow().clone()
    }

    /// Resolve the view after `changes` (everything when `None`).
    ///
    /// `on_update` only fires when the root value is a different object than
    /// the one produced by the previous update.
    pub fn update(
        &self,
        changes: Option<HashSet<Binding>>,
    ) -> Result<Option<ResolvedValue>, CoreError> {
        let resolver = match self.resolver() {
            Some(resolver) => resolver,
            None => self.setup()?,
        };

        let update = resolver.update(changes)?;

        let unchanged = match (&*self.last_update.borrow(), &update) {
            (Some(last), Some(next)) => last.ptr_eq(next),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(update);
        }

        *self.last_update.borrow_mut() = update.clone();
        self.hooks.on_update.call(&update);
        Ok(update)
    }

    fn setup(&self) -> Result<Rc<Resolver>, CoreError> {
        let parser = Rc::new(Parser::new(Rc::clone(&self.arena)));
        for plugin in &self.plugins {
            plugin.apply_parser(&parser);
        }
        self.hooks.parser.call(&parser);

        let root = parser.parse_view(&self.initial_view)?;
        debug!(
            "Parsed view {} into {} nodes",
            self.id().unwrap_or("<anonymous>"),
            self.arena.len()
        );

        let options = self.resolver_options.clone().with_parser(parser);
        let resolver = Rc::new(Resolver::new(root, Rc::clone(&self.arena), options));
        for plugin in &self.plugins {
            plugin.apply_resolver(&resolver);
        }
        self.hooks.resolver.call(&resolver);

        *self.resolver.borrow_mut() = Some(Rc::clone(&resolver));
        Ok(resolver)
    }
}
