use crate::validation::ValidationError;
use std::fmt;
use thiserror::Error;

/// Errors raised while reading or validating a content document
#[derive(Error, Debug)]
pub enum DslError {
    /// The YAML text could not be parsed
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// The JSON text could not be parsed or did not match the document shape
    #[error("JSON processing error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A single validation error
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// More than one validation error
    #[error("{}", MultipleErrorsFormat(.0))]
    MultipleValidationErrors(Vec<ValidationError>),

    /// The document is not an object
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A top-level section is missing
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

struct MultipleErrorsFormat<'a>(&'a [ValidationError]);

impl fmt::Display for MultipleErrorsFormat<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Multiple validation errors ({} issues):", self.0.len())?;
        for (i, err) in self.0.iter().enumerate() {
            write!(f, "\n  {}. {}", i + 1, err)?;
        }
        Ok(())
    }
}

impl DslError {
    /// Wrap collected validation errors; one error stays a single `ValidationError`
    pub fn from_validation_errors(mut errors: Vec<ValidationError>) -> Self {
        if errors.len() > 1 {
            return DslError::MultipleValidationErrors(errors);
        }
        match errors.pop() {
            Some(err) => DslError::ValidationError(err),
            None => DslError::InternalError(
                "Called from_validation_errors with empty vector".to_string(),
            ),
        }
    }

    /// Stable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            DslError::YamlError(_) => "ERR_DSL_YAML_PARSE",
            DslError::JsonError(_) => "ERR_DSL_JSON_PARSE",
            DslError::ValidationError(err) => err.code,
            DslError::MultipleValidationErrors(_) => "ERR_DSL_VALIDATION_MULTIPLE",
            DslError::InvalidDocument(_) => "ERR_DSL_INVALID_DOCUMENT",
            DslError::MissingRequiredField(_) => "ERR_DSL_MISSING_FIELD",
            DslError::InternalError(_) => "ERR_DSL_INTERNAL",
        }
    }

    /// All validation errors carried by this error
    pub fn validation_errors(&self) -> Vec<&ValidationError> {
        match self {
            DslError::ValidationError(err) => vec![err],
            DslError::MultipleValidationErrors(errors) => errors.iter().collect(),
            _ => Vec::new(),
        }
    }
}
