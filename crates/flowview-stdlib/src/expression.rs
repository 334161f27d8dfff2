//! A small expression evaluator over `{{binding}}` references.
//!
//! Supported syntax: string, number, boolean and null literals, `{{binding}}`
//! reads, `{{binding}} = value` assignments, `!`, `==`, `!=`, `&&`, `||`,
//! parentheses and `;`-separated statements. The value of the last
//! statement is the result.

use flowview_core::{is_truthy, Binding, CoreError, DataModel, Expression, ExpressionEvaluator};
use serde_json::{Number, Value};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Binding(String),
    Literal(Value),
    Not,
    Eq,
    Ne,
    And,
    Or,
    Assign,
    LParen,
    RParen,
    Semicolon,
}

fn unsupported(expression: &str, detail: impl std::fmt::Display) -> CoreError {
    CoreError::ExpressionError(format!("{} in expression: {}", detail, expression))
}

fn tokenize(expression: &str) -> Result<Vec<Token>, CoreError> {
    let chars: Vec<char> = expression.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            c if c.is_whitespace() => i += 1,
            '{' if next == Some('{') => {
                let mut depth = 1;
                let mut j = i + 2;
                let start = j;
                while j < chars.len() && depth > 0 {
                    if chars[j] == '{' && chars.get(j + 1) == Some(&'{') {
                        depth += 1;
                        j += 2;
                    } else if chars[j] == '}' && chars.get(j + 1) == Some(&'}') {
                        depth -= 1;
                        j += 2;
                    } else {
                        j += 1;
                    }
                }
                if depth != 0 {
                    return Err(unsupported(expression, "Unclosed binding"));
                }
                let inner: String = chars[start..j - 2].iter().collect();
                tokens.push(Token::Binding(inner.trim().to_string()));
                i = j;
            }
            '\'' | '"' => {
                let quote = c;
                let mut j = i + 1;
                let mut text = String::new();
                while j < chars.len() && chars[j] != quote {
                    if chars[j] == '\\' && j + 1 < chars.len() {
                        j += 1;
                    }
                    text.push(chars[j]);
                    j += 1;
                }
                if j >= chars.len() {
                    return Err(unsupported(expression, "Unterminated string"));
                }
                tokens.push(Token::Literal(Value::String(text)));
                i = j + 1;
            }
            '=' if next == Some('=') => {
                tokens.push(Token::Eq);
                i += if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
            }
            '!' if next == Some('=') => {
                tokens.push(Token::Ne);
                i += if chars.get(i + 2) == Some(&'=') { 3 } else { 2 };
            }
            '=' => {
                tokens.push(Token::Assign);
                i += 1;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '&' if next == Some('&') => {
                tokens.push(Token::And);
                i += 2;
            }
            '|' if next == Some('|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ';' => {
                tokens.push(Token::Semicolon);
                i += 1;
            }
            c if c.is_ascii_digit() || (c == '-' && next.map_or(false, |n| n.is_ascii_digit())) => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_ascii_digit() || chars[j] == '.') {
                    j += 1;
                }
                let raw: String = chars[i..j].iter().collect();
                let number = raw
                    .parse::<i64>()
                    .map(Number::from)
                    .ok()
                    .or_else(|| raw.parse::<f64>().ok().and_then(Number::from_f64))
                    .ok_or_else(|| unsupported(expression, format!("Invalid number '{}'", raw)))?;
                tokens.push(Token::Literal(Value::Number(number)));
                i = j;
            }
            c if c.is_ascii_alphabetic() => {
                let mut j = i + 1;
                while j < chars.len() && (chars[j].is_ascii_alphanumeric() || chars[j] == '_') {
                    j += 1;
                }
                let word: String = chars[i..j].iter().collect();
                let literal = match word.as_str() {
                    "true" => Value::Bool(true),
                    "false" => Value::Bool(false),
                    "null" | "undefined" => Value::Null,
                    _ => return Err(unsupported(expression, format!("Unknown identifier '{}'", word))),
                };
                tokens.push(Token::Literal(literal));
                i = j;
            }
            other => return Err(unsupported(expression, format!("Unexpected '{}'", other))),
        }
    }

    Ok(tokens)
}

fn loose_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

struct Evaluation<'a> {
    expression: &'a str,
    tokens: Vec<Token>,
    position: usize,
    model: &'a dyn DataModel,
}

impl Evaluation<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        self.position += 1;
        token
    }

    fn binding(&self, raw: &str) -> Result<Binding, CoreError> {
        Binding::parse(raw)
    }

    fn statements(&mut self) -> Result<Value, CoreError> {
        let mut result = Value::Null;
        while self.peek().is_some() {
            if self.peek() == Some(&Token::Semicolon) {
                self.advance();
                continue;
            }
            result = self.statement()?;
            match self.advance() {
                None | Some(Token::Semicolon) => {}
                Some(token) => {
                    return Err(unsupported(self.expression, format!("Unexpected {:?}", token)))
                }
            }
        }
        Ok(result)
    }

    fn statement(&mut self) -> Result<Value, CoreError> {
        if let (Some(Token::Binding(raw)), Some(Token::Assign)) =
            (self.tokens.get(self.position), self.tokens.get(self.position + 1))
        {
            let binding = self.binding(raw)?;
            self.position += 2;
            let value = self.or()?;
            debug!("Setting {} from expression", binding);
            self.model.set(vec![(binding, value.clone())]);
            return Ok(value);
        }
        self.or()
    }

    fn or(&mut self) -> Result<Value, CoreError> {
        let mut left = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.advance();
            let right = self.and()?;
            if !is_truthy(&left) {
                left = right;
            }
        }
        Ok(left)
    }

    fn and(&mut self) -> Result<Value, CoreError> {
        let mut left = self.equality()?;
        while self.peek() == Some(&Token::And) {
            self.advance();
            let right = self.equality()?;
            if is_truthy(&left) {
                left = right;
            }
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Value, CoreError> {
        let mut left = self.unary()?;
        loop {
            let negate = match self.peek() {
                Some(Token::Eq) => false,
                Some(Token::Ne) => true,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = Value::Bool(loose_equals(&left, &right) != negate);
        }
    }

    fn unary(&mut self) -> Result<Value, CoreError> {
        if self.peek() == Some(&Token::Not) {
            self.advance();
            let value = self.unary()?;
            return Ok(Value::Bool(!is_truthy(&value)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Value, CoreError> {
        match self.advance() {
            Some(Token::Literal(value)) => Ok(value),
            Some(Token::Binding(raw)) => {
                let binding = self.binding(&raw)?;
                Ok(self.model.get(&binding))
            }
            Some(Token::LParen) => {
                let value = self.or()?;
                match self.advance() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(unsupported(self.expression, "Missing ')'")),
                }
            }
            Some(token) => Err(unsupported(self.expression, format!("Unexpected {:?}", token))),
            None => Err(unsupported(self.expression, "Unexpected end")),
        }
    }
}

/// Evaluates the binding expression language against a data model
#[derive(Debug, Default, Clone, Copy)]
pub struct BindingExpressionEvaluator;

impl BindingExpressionEvaluator {
    /// Create an evaluator
    pub fn new() -> Self {
        Self
    }

    /// Evaluate a single statement list
    pub fn evaluate_str(&self, expression: &str, model: &dyn DataModel) -> Result<Value, CoreError> {
        let mut evaluation = Evaluation {
            expression,
            tokens: tokenize(expression)?,
            position: 0,
            model,
        };
        evaluation.statements()
    }
}

impl ExpressionEvaluator for BindingExpressionEvaluator {
    fn evaluate(&self, expression: &Expression, model: &dyn DataModel) -> Result<Value, CoreError> {
        let mut result = Value::Null;
        for statement in expression.statements() {
            result = self.evaluate_str(statement, model)?;
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowview_core::LocalModel;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn eval(expression: &str, model: &LocalModel) -> Result<Value, CoreError> {
        BindingExpressionEvaluator::new().evaluate(&Expression::from(expression), model)
    }

    #[test]
    fn test_literals_and_reads() {
        let model = LocalModel::new(json!({"user": {"name": "Ada", "age": 36}, "items": [1, 2]}));

        assert_eq!(eval("'next'", &model).unwrap(), json!("next"));
        assert_eq!(eval("\"quoted\"", &model).unwrap(), json!("quoted"));
        assert_eq!(eval("-4", &model).unwrap(), json!(-4));
        assert_eq!(eval("1.5", &model).unwrap(), json!(1.5));
        assert_eq!(eval("null", &model).unwrap(), Value::Null);
        assert_eq!(eval("{{user.name}}", &model).unwrap(), json!("Ada"));
        assert_eq!(eval("{{ items[1] }}", &model).unwrap(), json!(2));
        assert_eq!(eval("{{missing}}", &model).unwrap(), Value::Null);
        assert_eq!(eval("", &model).unwrap(), Value::Null);
    }

    #[test]
    fn test_operators() {
        let model = LocalModel::new(json!({"a": true, "b": false, "n": 2}));

        assert_eq!(eval("!{{a}}", &model).unwrap(), json!(false));
        assert_eq!(eval("!!{{n}}", &model).unwrap(), json!(true));
        assert_eq!(eval("{{n}} == 2", &model).unwrap(), json!(true));
        assert_eq!(eval("{{n}} == 2.0", &model).unwrap(), json!(true));
        assert_eq!(eval("{{n}} != 2", &model).unwrap(), json!(false));
        assert_eq!(eval("{{a}} && {{b}}", &model).unwrap(), json!(false));
        assert_eq!(eval("{{b}} || 'fallback'", &model).unwrap(), json!("fallback"));
        assert_eq!(eval("{{a}} && ({{b}} || {{n}} === 2)", &model).unwrap(), json!(true));
    }

    #[test]
    fn test_assignments_and_sequences() {
        let model = LocalModel::new(json!({}));

        assert_eq!(
            eval("{{user.name}} = 'Ada'; {{count}} = 1; 'done'", &model).unwrap(),
            json!("done")
        );
        assert_eq!(model.snapshot(), json!({"user": {"name": "Ada"}, "count": 1}));

        let evaluator = BindingExpressionEvaluator::new();
        let many = Expression::Many(vec!["{{count}} = 2".to_string(), "{{count}}".to_string()]);
        assert_eq!(evaluator.evaluate(&many, &model).unwrap(), json!(2));
    }

    #[test]
    fn test_unsupported_syntax() {
        let model = LocalModel::default();

        for expression in ["{{a}} + 1", "foo()", "'open", "{{a", "(true", "true false"] {
            assert!(
                matches!(eval(expression, &model), Err(CoreError::ExpressionError(_))),
                "expected an error for {}",
                expression
            );
        }
    }
}
