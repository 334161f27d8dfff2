//! # Flowview DSL
//!
//! Content documents bundle the views a player can show, the navigation that
//! decides which view is shown, and the data the views bind to. This crate
//! reads them from JSON or YAML and validates them before they reach the
//! runtime in `flowview-core`.
//!
//! ## Features
//!
//! * JSON and YAML content documents
//! * Coded validation errors with a path to the offending key
//! * Reference checks across flows, states and views
//! * JSON Schema checks for navigation states
//!
//! ## Example
//!
//! ```
//! use flowview_dsl::parse_and_validate_content_yaml;
//!
//! let yaml = r#"
//! views:
//!   - id: greeting
//!     type: text
//!     value: "Hello {{user.name}}"
//! navigation:
//!   BEGIN: main
//!   main:
//!     startState: VIEW_greeting
//!     VIEW_greeting:
//!       state_type: VIEW
//!       ref: greeting
//!       transitions:
//!         next: END_done
//!     END_done:
//!       state_type: END
//!       outcome: done
//! data:
//!   user:
//!     name: Ada
//! "#;
//!
//! let document = parse_and_validate_content_yaml(yaml).unwrap();
//! assert_eq!(document.view_ids(), vec!["greeting"]);
//! ```

mod document;
mod error;
mod parser;
mod utils;

pub mod validation;

pub use document::ContentDocument;
pub use error::DslError;
pub use parser::{document_from_value, parse_content_json, parse_content_yaml};
pub use validation::{validate_content, ValidationError};

/// Parse and validate a JSON content document.
///
/// # Errors
///
/// * Invalid JSON or a document of the wrong shape
/// * A missing `navigation` section
/// * Validation errors (dangling references, malformed states or bindings)
///
/// # Examples
///
/// ```
/// use flowview_dsl::parse_and_validate_content_json;
///
/// let json = r#"{
///     "navigation": {
///         "BEGIN": "main",
///         "main": {
///             "startState": "VIEW_1",
///             "VIEW_1": {"state_type": "VIEW", "ref": "missing-view"}
///         }
///     }
/// }"#;
///
/// let error = parse_and_validate_content_json(json).unwrap_err();
/// assert!(error.error_code().contains("INVALID_REFERENCE"));
/// ```
pub fn parse_and_validate_content_json(json: &str) -> Result<ContentDocument, DslError> {
    let document = parser::parse_content_json(json)?;
    validation::validate_content(&document)?;
    Ok(document)
}

/// Parse and validate a YAML content document
pub fn parse_and_validate_content_yaml(yaml: &str) -> Result<ContentDocument, DslError> {
    let document = parser::parse_content_yaml(yaml)?;
    validation::validate_content(&document)?;
    Ok(document)
}

/// Version of the flowview-dsl crate
///
/// ```
/// assert!(flowview_dsl::version().starts_with("0."));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
