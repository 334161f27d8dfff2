use crate::document::ContentDocument;
use crate::error::DslError;
use std::error::Error;
use std::fmt;

mod navigation;
mod reference;
mod schema;

pub use navigation::NavigationValidator;
pub use reference::ViewReferenceValidator;
pub use schema::StateSchemaValidator;

/// A problem found in a content document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// One of the [`error_codes`]
    pub code: &'static str,

    /// Human-readable message
    pub message: String,

    /// Location of the problem, e.g. `navigation.flow.VIEW_1.transitions.next`
    pub path: Option<String>,
}

impl ValidationError {
    pub(crate) fn new(code: &'static str, message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: Some(path.into()),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "{}: {} (at {})", self.code, self.message, path)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl Error for ValidationError {}

/// Validation error codes
pub mod error_codes {
    /// A name that does not point at a flow, state or view
    pub const INVALID_REFERENCE: &str = "ERR_DSL_VALIDATION_INVALID_REFERENCE";

    /// Two views with the same id
    pub const DUPLICATE_ID: &str = "ERR_DSL_VALIDATION_DUPLICATE_ID";

    /// A state that does not match the state schema
    pub const INVALID_SCHEMA: &str = "ERR_DSL_VALIDATION_INVALID_SCHEMA";

    /// A required key is missing
    pub const MISSING_REQUIRED_FIELD: &str = "ERR_DSL_VALIDATION_MISSING_REQUIRED_FIELD";

    /// A flow that is not an object or cannot be read
    pub const INVALID_FLOW: &str = "ERR_DSL_VALIDATION_INVALID_FLOW";

    /// A `{{...}}` reference that is not a binding
    pub const INVALID_BINDING: &str = "ERR_DSL_VALIDATION_INVALID_BINDING";
}

/// Checks one aspect of a content document
pub trait Validator {
    /// Every problem found; empty when the document is fine
    fn validate(&self, document: &ContentDocument) -> Vec<ValidationError>;
}

/// Run all validators over `document`
pub fn validate_content(document: &ContentDocument) -> Result<(), DslError> {
    let validators: Vec<Box<dyn Validator>> = vec![
        Box::new(NavigationValidator::new()),
        Box::new(StateSchemaValidator::new()?),
        Box::new(ViewReferenceValidator::new()),
    ];

    let errors: Vec<ValidationError> = validators
        .iter()
        .flat_map(|validator| validator.validate(document))
        .collect();

    if !errors.is_empty() {
        return Err(DslError::from_validation_errors(errors));
    }

    Ok(())
}
