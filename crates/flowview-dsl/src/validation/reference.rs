use crate::document::{view_id, ContentDocument};
use crate::utils::reference::{extract_binding_references, is_valid_binding_reference};
use crate::validation::{error_codes, ValidationError, Validator};
use serde_json::Value;
use std::collections::HashSet;

/// Checks the views of a document: each has a unique `id`, and every
/// `{{...}}` reference in their strings is a parseable binding.
#[derive(Debug, Default)]
pub struct ViewReferenceValidator;

impl ViewReferenceValidator {
    /// Create a view reference validator
    pub fn new() -> Self {
        Self
    }

    fn validate_ids(&self, views: &[Value], errors: &mut Vec<ValidationError>) {
        let mut seen = HashSet::new();

        for (index, view) in views.iter().enumerate() {
            let path = format!("views[{}].id", index);
            match view_id(view) {
                None => errors.push(ValidationError::new(
                    error_codes::MISSING_REQUIRED_FIELD,
                    "View needs a string id",
                    path,
                )),
                Some(id) if !seen.insert(id) => errors.push(ValidationError::new(
                    error_codes::DUPLICATE_ID,
                    format!("Duplicate view id '{}'", id),
                    path,
                )),
                Some(_) => {}
            }
        }
    }

    fn validate_bindings(&self, value: &Value, path: &str, errors: &mut Vec<ValidationError>) {
        match value {
            Value::String(text) => {
                for reference in extract_binding_references(text) {
                    if !is_valid_binding_reference(reference) {
                        errors.push(ValidationError::new(
                            error_codes::INVALID_BINDING,
                            format!("'{{{{{}}}}}' is not a valid binding", reference),
                            path,
                        ));
                    }
                }
            }
            Value::Array(items) => {
                for (index, item) in items.iter().enumerate() {
                    self.validate_bindings(item, &format!("{}[{}]", path, index), errors);
                }
            }
            Value::Object(entries) => {
                for (key, entry) in entries {
                    self.validate_bindings(entry, &format!("{}.{}", path, key), errors);
                }
            }
            _ => {}
        }
    }
}

impl Validator for ViewReferenceValidator {
    fn validate(&self, document: &ContentDocument) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        self.validate_ids(&document.views, &mut errors);
        for (index, view) in document.views.iter().enumerate() {
            self.validate_bindings(view, &format!("views[{}]", index), &mut errors);
        }

        errors
    }
}
