use flowview_core::{
    changed_bindings, Binding, CoreError, DataModel, ExpressionEvaluator, LocalModel, Logger,
    ResolvedValue, ResolverOptions, ViewInstance, ViewPlugin,
};
use flowview_stdlib::{standard_plugins, BindingExpressionEvaluator};
use serde_json::Value;
use std::collections::HashSet;
use std::rc::Rc;

/// A view together with the model it resolves against.
///
/// Data changes go through [`TestView::set`], which updates the view with
/// exactly the bindings that changed.
#[derive(Debug)]
pub struct TestView {
    model: Rc<LocalModel>,
    view: ViewInstance,
}

impl TestView {
    /// A view with the standard plugins and the binding expression evaluator
    pub fn new(content: Value, data: Value) -> Self {
        Self::builder(content, data).with_standard_plugins().build()
    }

    /// Start configuring a view
    pub fn builder(content: Value, data: Value) -> TestViewBuilder {
        TestViewBuilder {
            content,
            model: Rc::new(LocalModel::new(data)),
            evaluator: Rc::new(BindingExpressionEvaluator::new()),
            logger: None,
            plugins: Vec::new(),
        }
    }

    /// The data model
    pub fn model(&self) -> &Rc<LocalModel> {
        &self.model
    }

    /// The view instance
    pub fn view(&self) -> &ViewInstance {
        &self.view
    }

    /// Resolve everything
    pub fn resolve(&self) -> Result<Option<ResolvedValue>, CoreError> {
        self.view.update(None)
    }

    /// Resolve everything and convert to JSON, `null` when nothing resolved
    pub fn resolve_json(&self) -> Result<Value, CoreError> {
        Ok(self
            .resolve()?
            .map(|value| value.to_json())
            .unwrap_or(Value::Null))
    }

    /// Write `values` into the model and update the view with the changes
    pub fn set(&self, values: Vec<(&str, Value)>) -> Result<Option<ResolvedValue>, CoreError> {
        let mut transaction = Vec::with_capacity(values.len());
        for (path, value) in values {
            transaction.push((Binding::parse(path)?, value));
        }

        let changes: HashSet<Binding> = changed_bindings(&self.model.set(transaction));
        self.view.update(Some(changes))
    }
}

/// Configures a [`TestView`]
pub struct TestViewBuilder {
    content: Value,
    model: Rc<LocalModel>,
    evaluator: Rc<dyn ExpressionEvaluator>,
    logger: Option<Rc<dyn Logger>>,
    plugins: Vec<Rc<dyn ViewPlugin>>,
}

impl TestViewBuilder {
    /// Evaluate expressions with `evaluator`
    pub fn with_evaluator(mut self, evaluator: Rc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Send resolver diagnostics to `logger`
    pub fn with_logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Add the template, applicability and string resolver plugins
    pub fn with_standard_plugins(mut self) -> Self {
        let model: Rc<dyn DataModel> = self.model.clone();
        self.plugins.extend(standard_plugins(model));
        self
    }

    /// Add a plugin after the ones already configured
    pub fn with_plugin(mut self, plugin: Rc<dyn ViewPlugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    /// Build the view
    pub fn build(self) -> TestView {
        let mut options = ResolverOptions::new(self.model.clone(), self.evaluator);
        if let Some(logger) = self.logger {
            options = options.with_logger(logger);
        }

        let view = self
            .plugins
            .into_iter()
            .fold(ViewInstance::new(self.content, options), |view, plugin| {
                view.with_plugin(plugin)
            });

        TestView {
            model: self.model,
            view,
        }
    }
}
