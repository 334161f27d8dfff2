//! Mocks of the runtime collaborators.

use flowview_core::{CoreError, DataModel, Expression, ExpressionEvaluator};
use mockall::mock;
use serde_json::Value;

mock! {
    /// Expression evaluator with programmable results
    #[derive(Debug)]
    pub Evaluator {}

    impl ExpressionEvaluator for Evaluator {
        fn evaluate(&self, expression: &Expression, model: &dyn DataModel) -> Result<Value, CoreError>;
    }
}

impl MockEvaluator {
    /// Evaluator answering every expression with `value`
    pub fn returning_value(value: Value) -> Self {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .returning(move |_, _| Ok(value.clone()));
        evaluator
    }

    /// Evaluator mapping each expression's text to a result, `null` otherwise
    pub fn with_results(results: Vec<(&str, Value)>) -> Self {
        let results: Vec<(String, Value)> = results
            .into_iter()
            .map(|(expression, value)| (expression.to_string(), value))
            .collect();

        let mut evaluator = MockEvaluator::new();
        evaluator.expect_evaluate().returning(move |expression, _| {
            let text = expression.to_string();
            Ok(results
                .iter()
                .find(|(expected, _)| *expected == text)
                .map(|(_, value)| value.clone())
                .unwrap_or(Value::Null))
        });
        evaluator
    }
}
