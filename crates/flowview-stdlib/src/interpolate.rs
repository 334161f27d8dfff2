//! `{{binding}}` and `@[expression]@` references inside strings.
//!
//! A string that is exactly one reference resolves to the raw value it
//! points at. Anything else is rendered into the surrounding text, with
//! `null` rendered as an empty string.

use flowview_core::view::NodeResolveOptions;
use flowview_core::{CoreError, DataModel, Expression, ExpressionEvaluator};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::collections::HashSet;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

lazy_static! {
    static ref EXPRESSION_REGEX: Regex = Regex::new(r"@\[(.*?)\]@").unwrap();
}

/// Where references are looked up
pub trait RefContext {
    /// Read the data at a raw binding string
    fn get(&self, binding: &str) -> Result<Value, CoreError>;

    /// Evaluate a raw expression
    fn evaluate(&self, expression: &str) -> Result<Value, CoreError>;
}

impl RefContext for NodeResolveOptions {
    fn get(&self, binding: &str) -> Result<Value, CoreError> {
        let binding = self.parse_binding(binding)?;
        Ok(NodeResolveOptions::get(self, &binding))
    }

    fn evaluate(&self, expression: &str) -> Result<Value, CoreError> {
        NodeResolveOptions::evaluate(self, &Expression::from(expression))
    }
}

/// A data model and evaluator pair, for resolving outside a view
pub struct ModelContext<'a> {
    /// Model bindings are read from
    pub model: &'a dyn DataModel,
    /// Evaluator for `@[...]@` blocks
    pub evaluator: &'a dyn ExpressionEvaluator,
}

impl RefContext for ModelContext<'_> {
    fn get(&self, binding: &str) -> Result<Value, CoreError> {
        Ok(self.model.get(&flowview_core::Binding::parse(binding)?))
    }

    fn evaluate(&self, expression: &str) -> Result<Value, CoreError> {
        self.evaluator
            .evaluate(&Expression::from(expression), self.model)
    }
}

/// Render a value into surrounding text
pub fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn opens_before_close(text: &str, open: &str, close: &str) -> bool {
    match (text.find(open), text.find(close)) {
        (Some(start), Some(end)) => start < end,
        _ => false,
    }
}

/// Whether `text` contains a binding or expression reference
pub fn has_something_to_resolve(text: &str) -> bool {
    opens_before_close(text, OPEN, CLOSE) || opens_before_close(text, "@[", "]@")
}

/// Byte range of the first balanced `{{...}}` in `text`
pub fn find_next_ref(text: &str) -> Result<Option<(usize, usize)>, CoreError> {
    let Some(start) = text.find(OPEN) else {
        return Ok(None);
    };

    let mut depth = 1;
    let mut offset = start + OPEN.len();

    while depth > 0 && offset < text.len() {
        let rest = &text[offset..];
        let Some(close) = rest.find(CLOSE) else {
            break;
        };

        match rest.find(OPEN) {
            Some(open) if open < close => {
                depth += 1;
                offset += open + OPEN.len();
            }
            _ => {
                depth -= 1;
                offset += close + CLOSE.len();
            }
        }
    }

    if depth != 0 {
        return Err(CoreError::BindingParseError(format!(
            "Unbalanced {{{{ and }}}} in: {}",
            text
        )));
    }

    Ok(Some((start, offset)))
}

/// Evaluate every `@[...]@` block in `text`
pub fn resolve_expressions_in_string(
    text: &str,
    context: &dyn RefContext,
) -> Result<Value, CoreError> {
    let mut working = text.to_string();

    loop {
        let Some((start, end, expression)) = EXPRESSION_REGEX.captures(&working).and_then(|c| {
            let whole = c.get(0)?;
            Some((whole.start(), whole.end(), c.get(1)?.as_str().to_string()))
        }) else {
            break;
        };

        let value = context.evaluate(&expression)?;

        if start == 0 && end == working.len() && working == text && !value.is_string() {
            return Ok(value);
        }

        working = format!("{}{}{}", &working[..start], display(&value), &working[end..]);
    }

    Ok(Value::String(working))
}

/// Resolve expressions, then bindings, in `text`
pub fn resolve_data_refs_in_string(
    text: &str,
    context: &dyn RefContext,
) -> Result<Value, CoreError> {
    let mut working = match resolve_expressions_in_string(text, context)? {
        Value::String(s) => s,
        other => return Ok(other),
    };

    while let Some((start, end)) = find_next_ref(&working)? {
        let inner = working[start + OPEN.len()..end - CLOSE.len()].trim();
        let binding = if inner.contains(OPEN) {
            display(&resolve_data_refs_in_string(inner, context)?)
        } else {
            inner.to_string()
        };

        let value = context.get(&binding)?;

        if start == 0 && end == working.len() && !value.is_string() {
            return Ok(value);
        }

        working = format!("{}{}{}", &working[..start], display(&value), &working[end..]);
    }

    Ok(Value::String(working))
}

/// Resolve every string inside `value`, leaving keys in `skip` untouched
pub fn resolve_all_refs(
    value: &Value,
    context: &dyn RefContext,
    skip: &HashSet<String>,
) -> Result<Value, CoreError> {
    match value {
        Value::String(text) if has_something_to_resolve(text) => {
            resolve_data_refs_in_string(text, context)
        }
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                if skip.contains(&index.to_string()) {
                    Ok(item.clone())
                } else {
                    resolve_all_refs(item, context, skip)
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(entries) => {
            let mut resolved = entries.clone();
            for (key, entry) in entries {
                if !skip.contains(key) {
                    resolved.insert(key.clone(), resolve_all_refs(entry, context, skip)?);
                }
            }
            Ok(Value::Object(resolved))
        }
        other => Ok(other.clone()),
    }
}
