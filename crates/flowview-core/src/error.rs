use thiserror::Error;

/// Core error type for the Flowview runtime
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The navigation or flow document is misconfigured
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A navigation request could not be honoured
    #[error("Navigation error: {0}")]
    NavigationError(String),

    /// A transition was requested while another one was still in progress
    #[error("{0}")]
    TransitionInProgress(String),

    /// A flow completed without ever reaching an END state
    #[error("Flow cancelled: {0}")]
    FlowCancelled(String),

    /// Expression evaluation error
    #[error("Expression evaluation error: {0}")]
    ExpressionError(String),

    /// A binding string could not be parsed
    #[error("Binding parse error: {0}")]
    BindingParseError(String),

    /// The data model rejected a read or write
    #[error("Data model error: {0}")]
    DataModelError(String),

    /// A node handle did not resolve to a node in the arena
    #[error("Unknown view node: {0}")]
    UnknownNode(String),

    /// A template pointed at data that is not an array
    #[error("Template error: {0}")]
    TemplateError(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::SerializationError(err.to_string())
    }
}

impl From<String> for CoreError {
    fn from(err: String) -> Self {
        CoreError::Other(err)
    }
}

impl From<&str> for CoreError {
    fn from(err: &str) -> Self {
        CoreError::Other(err.to_string())
    }
}
