//! Expression evaluation collaborator.

use crate::data::DataModel;
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Debug};

/// An expression as it appears in content: one statement or a list of them
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    /// A single expression
    Single(String),
    /// Several expressions evaluated in order; the last result wins
    Many(Vec<String>),
}

impl Expression {
    /// Individual statements in evaluation order
    pub fn statements(&self) -> Vec<&str> {
        match self {
            Expression::Single(exp) => vec![exp.as_str()],
            Expression::Many(exps) => exps.iter().map(String::as_str).collect(),
        }
    }

    /// Interpret a raw JSON value as an expression
    pub fn from_value(value: &Value) -> Option<Expression> {
        serde_json::from_value(value.clone()).ok()
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.statements().join("; "))
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::Single(value.to_string())
    }
}

/// Evaluates expressions against a data model.
///
/// The model passed in is whatever the caller wants reads attributed to; the
/// resolver passes its dependency-tracking model so expression reads become
/// node dependencies.
pub trait ExpressionEvaluator: Debug {
    /// Evaluate `expression`, failing with [`CoreError::ExpressionError`] on bad input
    fn evaluate(&self, expression: &Expression, model: &dyn DataModel) -> Result<Value, CoreError>;
}

/// Truthiness used when an expression result gates behaviour
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
