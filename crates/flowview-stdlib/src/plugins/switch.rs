use crate::BindingExpressionEvaluator;
use flowview_core::view::{Node, NodeArena, Parser, SwitchCase};
use flowview_core::{is_truthy, CoreError, DataModel, ExpressionEvaluator, Resolver, ViewPlugin};
use serde_json::Value;
use std::rc::Rc;
use tracing::debug;

/// Replaces `staticSwitch` and `dynamicSwitch` objects with the content of
/// their first case whose `case` expression is truthy.
///
/// Static switches are decided once, while the view is parsed, against
/// `model`. Dynamic switches are decided on every resolve against the
/// node's tracked model, so they follow the data their cases read. A switch
/// without a truthy case resolves to nothing.
#[derive(Debug)]
pub struct SwitchPlugin {
    model: Rc<dyn DataModel>,
    evaluator: Rc<dyn ExpressionEvaluator>,
}

impl SwitchPlugin {
    /// Create the plugin; static switches are evaluated against `model`
    pub fn new(model: Rc<dyn DataModel>) -> Self {
        Self {
            model,
            evaluator: Rc::new(BindingExpressionEvaluator::new()),
        }
    }

    /// Evaluate static switches with `evaluator` instead of the binding evaluator
    pub fn with_evaluator(mut self, evaluator: Rc<dyn ExpressionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }
}

fn select_case(
    cases: &[SwitchCase],
    arena: &NodeArena,
    mut evaluate: impl FnMut(&SwitchCase) -> Result<Value, CoreError>,
) -> Result<Option<Node>, CoreError> {
    for case in cases {
        if is_truthy(&evaluate(case)?) {
            debug!("Switch case '{}' selected", case.case);
            return Ok(Some((*arena.node(case.value)?).clone()));
        }
    }
    Ok(None)
}

impl ViewPlugin for SwitchPlugin {
    fn name(&self) -> &str {
        "switch"
    }

    fn apply_parser(&self, parser: &Parser) {
        let model = Rc::clone(&self.model);
        let evaluator = Rc::clone(&self.evaluator);

        parser
            .hooks
            .on_create_ast_node
            .tap(self.name(), move |node, _raw, parser: &Parser| match node {
                Some(Node::Switch {
                    dynamic: false,
                    cases,
                }) => select_case(&cases, parser.arena(), |case| {
                    evaluator.evaluate(&case.case, model.as_ref())
                }),
                other => Ok(other),
            });
    }

    fn apply_resolver(&self, resolver: &Rc<Resolver>) {
        resolver
            .hooks
            .before_resolve
            .tap(self.name(), |node, options| match node {
                Some(Node::Switch {
                    dynamic: true,
                    cases,
                }) => select_case(&cases, options.arena(), |case| options.evaluate(&case.case)),
                other => Ok(other),
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::StringResolverPlugin;
    use flowview_core::{changed_bindings, Binding, Expression, LocalModel, ResolverOptions, ViewInstance};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn view(content: Value, model: Rc<LocalModel>) -> ViewInstance {
        ViewInstance::new(
            content,
            ResolverOptions::new(model.clone(), Rc::new(BindingExpressionEvaluator::new())),
        )
        .with_plugin(Rc::new(SwitchPlugin::new(model)))
        .with_plugin(Rc::new(StringResolverPlugin::new()))
    }

    fn set(model: &LocalModel, path: &str, value: Value) -> std::collections::HashSet<Binding> {
        changed_bindings(&model.set(vec![(Binding::parse(path).unwrap(), value)]))
    }

    fn greeting(kind: &str) -> Value {
        json!({
            "id": "view",
            "title": {
                kind: [
                    {"case": "{{lang}} == 'fr'", "asset": {"id": "fr", "type": "text", "value": "Bonjour {{name}}"}},
                    {"case": true, "asset": {"id": "en", "type": "text", "value": "Hello {{name}}"}}
                ]
            }
        })
    }

    #[test]
    fn test_static_switch_is_decided_at_parse_time() {
        let model = Rc::new(LocalModel::new(json!({"lang": "fr", "name": "Ada"})));
        let view = view(greeting("staticSwitch"), Rc::clone(&model));

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({
                "id": "view",
                "title": {"asset": {"id": "fr", "type": "text", "value": "Bonjour Ada"}}
            })
        );

        // The chosen case stays, its own bindings still resolve
        let changes = set(&model, "lang", json!("en"));
        view.update(Some(changes)).unwrap();
        let changes = set(&model, "name", json!("Grace"));
        assert_eq!(
            view.update(Some(changes)).unwrap().unwrap().to_json()["title"]["asset"],
            json!({"id": "fr", "type": "text", "value": "Bonjour Grace"})
        );
    }

    #[test]
    fn test_dynamic_switch_follows_data() {
        let model = Rc::new(LocalModel::new(json!({"lang": "en", "name": "Ada"})));
        let view = view(greeting("dynamicSwitch"), Rc::clone(&model));

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json()["title"],
            json!({"asset": {"id": "en", "type": "text", "value": "Hello Ada"}})
        );

        let changes = set(&model, "lang", json!("fr"));
        assert_eq!(
            view.update(Some(changes)).unwrap().unwrap().to_json()["title"],
            json!({"asset": {"id": "fr", "type": "text", "value": "Bonjour Ada"}})
        );
    }

    #[test]
    fn test_switch_without_truthy_case_resolves_to_nothing() {
        let model = Rc::new(LocalModel::new(json!({"show": false})));
        let view = view(
            json!({
                "id": "view",
                "static": {"staticSwitch": [{"case": "{{show}}", "value": "shown"}]},
                "dynamic": {"dynamicSwitch": [{"case": "{{show}}", "value": "shown"}]}
            }),
            Rc::clone(&model),
        );

        assert_eq!(view.update(None).unwrap().unwrap().to_json(), json!({"id": "view"}));

        let changes = set(&model, "show", json!(true));
        assert_eq!(
            view.update(Some(changes)).unwrap().unwrap().to_json(),
            json!({"id": "view", "dynamic": {"value": "shown"}})
        );
    }

    #[derive(Debug)]
    struct PickNamed(&'static str);

    impl ExpressionEvaluator for PickNamed {
        fn evaluate(&self, expression: &Expression, _: &dyn DataModel) -> Result<Value, CoreError> {
            Ok(Value::Bool(expression.to_string() == self.0))
        }
    }

    #[test]
    fn test_static_switch_uses_configured_evaluator() {
        let model = Rc::new(LocalModel::default());
        let view = ViewInstance::new(
            json!({
                "id": "view",
                "label": {"staticSwitch": [
                    {"case": "first", "value": "one"},
                    {"case": "second", "value": "two"}
                ]}
            }),
            ResolverOptions::new(model.clone(), Rc::new(BindingExpressionEvaluator::new())),
        )
        .with_plugin(Rc::new(
            SwitchPlugin::new(model).with_evaluator(Rc::new(PickNamed("second"))),
        ))
        .with_plugin(Rc::new(StringResolverPlugin::new()));

        assert_eq!(
            view.update(None).unwrap().unwrap().to_json(),
            json!({"id": "view", "label": {"value": "two"}})
        );
    }

    #[test]
    fn test_case_errors_fail_the_update() {
        let model = Rc::new(LocalModel::default());
        let view = view(
            json!({"id": "view", "label": {"dynamicSwitch": [{"case": "foo()", "value": "x"}]}}),
            model,
        );

        match view.update(None) {
            Err(CoreError::ExpressionError(_)) => {}
            other => panic!("Expected an expression error, got {:?}", other),
        }
    }
}
