use crate::document::ContentDocument;
use crate::error::DslError;
use crate::validation::{error_codes, ValidationError, Validator};
use jsonschema::JSONSchema;
use serde_json::{json, Value};

/// Checks every navigation state against the state schema:
/// a known `state_type`, string refs and transition targets, and an
/// `outcome` on END states.
pub struct StateSchemaValidator {
    schema: JSONSchema,
}

impl StateSchemaValidator {
    /// Compile the state schema
    pub fn new() -> Result<Self, DslError> {
        let schema = JSONSchema::compile(&state_schema())
            .map_err(|err| DslError::InternalError(format!("Invalid state schema: {}", err)))?;
        Ok(Self { schema })
    }
}

fn state_schema() -> Value {
    json!({
        "type": "object",
        "required": ["state_type"],
        "properties": {
            "state_type": { "enum": ["VIEW", "ACTION", "FLOW", "END"] },
            "ref": { "type": "string" },
            "outcome": { "type": "string" },
            "exp": {
                "anyOf": [
                    { "type": "string" },
                    { "type": "array", "items": { "type": "string" } }
                ]
            },
            "transitions": {
                "type": "object",
                "additionalProperties": { "type": "string" }
            },
            "errorState": {
                "anyOf": [
                    { "type": "string" },
                    { "type": "object", "additionalProperties": { "type": "string" } }
                ]
            }
        },
        "allOf": [
            {
                "if": {
                    "required": ["state_type"],
                    "properties": { "state_type": { "const": "END" } }
                },
                "then": { "required": ["outcome"] }
            }
        ],
        "additionalProperties": true
    })
}

impl Validator for StateSchemaValidator {
    fn validate(&self, document: &ContentDocument) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        for name in document.navigation.flows.keys() {
            // Flow shape problems are reported by the navigation check
            let Ok(flow) = document.navigation.flow(name) else {
                continue;
            };

            for (state_name, state) in &flow.states {
                if let Err(failures) = self.schema.validate(state) {
                    for failure in failures {
                        let pointer = failure.instance_path.to_string().replace('/', ".");
                        errors.push(ValidationError::new(
                            error_codes::INVALID_SCHEMA,
                            format!("State '{}' is invalid: {}", state_name, failure),
                            format!("navigation.{}.{}{}", name, state_name, pointer),
                        ));
                    }
                }
            }
        }

        errors
    }
}
