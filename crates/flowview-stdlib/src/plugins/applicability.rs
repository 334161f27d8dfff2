use flowview_core::view::Node;
use flowview_core::{Resolver, ViewPlugin};
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

/// Removes nodes whose `applicability` expression evaluates to `false`.
///
/// Any other result, `null` included, keeps the wrapped node. The expression
/// is evaluated against the node's tracked model, so the node is revisited
/// when the data it reads changes.
#[derive(Debug, Default)]
pub struct ApplicabilityPlugin;

impl ApplicabilityPlugin {
    /// Create the plugin
    pub fn new() -> Self {
        Self
    }
}

impl ViewPlugin for ApplicabilityPlugin {
    fn name(&self) -> &str {
        "applicability"
    }

    fn apply_resolver(&self, resolver: &Rc<Resolver>) {
        resolver.hooks.before_resolve.tap(self.name(), |node, options| match node {
            Some(Node::Applicability { expression, value }) => {
                if options.evaluate(&expression)? == Value::Bool(false) {
                    debug!("Dropping node {:?}, '{}' is not applicable", options.node, expression);
                    return Ok(None);
                }

                Ok(Some((*options.arena().node(value)?).clone()))
            }
            other => Ok(other),
        });
    }
}
