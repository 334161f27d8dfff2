//! Harness running a content document: navigation drives which view is
//! shown, and the shown view is resolved against the document's data.

use anyhow::{Context, Result};
use flowview_core::{
    changed_bindings, Binding, DataModel, ExpressionEvaluator, FlowCompletion, FlowController,
    FlowControllerOptions, LocalModel, ResolverOptions, StateType, TransitionOptions,
    ViewInstance,
};
use flowview_dsl::{parse_and_validate_content_yaml, ContentDocument};
use flowview_stdlib::{standard_plugins, BindingExpressionEvaluator};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

/// A content document being navigated
pub struct ContentRun {
    document: ContentDocument,
    model: Rc<LocalModel>,
    evaluator: Rc<dyn ExpressionEvaluator>,
    controller: FlowController,
    view: RefCell<Option<Rc<ViewInstance>>>,
}

impl ContentRun {
    /// Parse and validate a YAML document, then prepare it to run
    pub fn from_yaml(source: &str) -> Result<Self> {
        let document =
            parse_and_validate_content_yaml(source).context("content document is invalid")?;
        Ok(Self::new(document))
    }

    /// Prepare `document` to run with its own data
    pub fn new(document: ContentDocument) -> Self {
        let model = Rc::new(LocalModel::new(document.data.clone()));
        let evaluator: Rc<dyn ExpressionEvaluator> = Rc::new(BindingExpressionEvaluator::new());
        let controller = FlowController::new(
            document.navigation.clone(),
            FlowControllerOptions::default().with_evaluator(evaluator.clone(), model.clone()),
        );

        Self {
            document,
            model,
            evaluator,
            controller,
            view: RefCell::new(None),
        }
    }

    /// The navigation state machines
    pub fn controller(&self) -> &FlowController {
        &self.controller
    }

    /// The document's data
    pub fn model(&self) -> &Rc<LocalModel> {
        &self.model
    }

    /// Start navigating
    pub fn start(&self) -> FlowCompletion {
        self.controller.start()
    }

    /// Transition the current flow
    pub fn transition(&self, action: &str) -> Result<()> {
        self.controller
            .transition(action, TransitionOptions::default())?;
        Ok(())
    }

    /// The view for the current VIEW state, created on first access.
    ///
    /// `None` when navigation is not in a VIEW state.
    pub fn current_view(&self) -> Result<Option<Rc<ViewInstance>>> {
        let Some(view_id) = self.current_view_id() else {
            *self.view.borrow_mut() = None;
            return Ok(None);
        };

        if let Some(view) = self.view.borrow().as_ref() {
            if view.id() == Some(view_id.as_str()) {
                return Ok(Some(Rc::clone(view)));
            }
        }

        let content = self
            .document
            .view(&view_id)
            .with_context(|| format!("no view with id '{}'", view_id))?
            .clone();
        debug!("Showing view {}", view_id);

        let model: Rc<dyn DataModel> = self.model.clone();
        let view = standard_plugins(model.clone()).into_iter().fold(
            ViewInstance::new(content, ResolverOptions::new(model, self.evaluator.clone())),
            |view, plugin| view.with_plugin(plugin),
        );
        let view = Rc::new(view);
        *self.view.borrow_mut() = Some(Rc::clone(&view));
        Ok(Some(view))
    }

    /// Resolve the current view in full
    pub fn render(&self) -> Result<Option<Value>> {
        let Some(view) = self.current_view()? else {
            return Ok(None);
        };
        Ok(view.update(None)?.map(|value| value.to_json()))
    }

    /// Write `values` and update the current view with the bindings that changed
    pub fn set(&self, values: Vec<(&str, Value)>) -> Result<Option<Value>> {
        let mut transaction = Vec::with_capacity(values.len());
        for (path, value) in values {
            transaction.push((Binding::parse(path)?, value));
        }
        let changes = changed_bindings(&self.model.set(transaction));

        let Some(view) = self.current_view()? else {
            return Ok(None);
        };
        Ok(view.update(Some(changes))?.map(|value| value.to_json()))
    }

    fn current_view_id(&self) -> Option<String> {
        let state = self.controller.current()?.current_state()?;
        if state.value.state_type != StateType::View {
            return None;
        }
        state.value.reference
    }
}
