//!
//! Flowview Stdlib - the standard view plugins
//!
//! Templates, switches, applicability, string references and path queries for views
//! resolved by `flowview-core`, plus [`BindingExpressionEvaluator`], a small
//! evaluator covering the expressions content usually carries.
//!
//! ```
//! use flowview_core::{LocalModel, ResolverOptions, ViewInstance};
//! use flowview_stdlib::{standard_plugins, BindingExpressionEvaluator};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let model = Rc::new(LocalModel::new(json!({"name": "Ada", "show": false})));
//! let mut view = ViewInstance::new(
//!     json!({
//!         "id": "greeting",
//!         "title": "Hello {{name}}",
//!         "hint": {"applicability": "{{show}}", "text": "hidden"}
//!     }),
//!     ResolverOptions::new(model.clone(), Rc::new(BindingExpressionEvaluator::new())),
//! );
//! for plugin in standard_plugins(model) {
//!     view = view.with_plugin(plugin);
//! }
//!
//! let resolved = view.update(None).unwrap().unwrap();
//! assert_eq!(resolved.to_json(), json!({"id": "greeting", "title": "Hello Ada"}));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod expression;
pub mod interpolate;
pub mod plugins;

pub use expression::BindingExpressionEvaluator;
pub use plugins::{
    ApplicabilityPlugin, CheckPathPlugin, Query, StringResolverPlugin, SwitchPlugin,
    TemplatePlugin,
};

use flowview_core::{DataModel, ViewPlugin};
use std::rc::Rc;

/// Template, switch, applicability and string resolution, in the order they
/// must be applied. Static templates and static switches read `model`.
pub fn standard_plugins(model: Rc<dyn DataModel>) -> Vec<Rc<dyn ViewPlugin>> {
    vec![
        Rc::new(TemplatePlugin::new(Rc::clone(&model))),
        Rc::new(SwitchPlugin::new(model)),
        Rc::new(ApplicabilityPlugin::new()),
        Rc::new(StringResolverPlugin::new()),
    ]
}

/// Version of the stdlib crate
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
