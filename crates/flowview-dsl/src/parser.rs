use crate::document::ContentDocument;
use crate::error::DslError;
use serde_json::Value;

/// Parse a content document from JSON text
pub fn parse_content_json(json: &str) -> Result<ContentDocument, DslError> {
    let raw: Value = serde_json::from_str(json)?;
    document_from_value(raw)
}

/// Parse a content document from YAML text
pub fn parse_content_yaml(yaml: &str) -> Result<ContentDocument, DslError> {
    let raw: Value = serde_yaml::from_str(yaml)?;
    document_from_value(raw)
}

/// Build a content document from an already parsed value
pub fn document_from_value(raw: Value) -> Result<ContentDocument, DslError> {
    let Some(object) = raw.as_object() else {
        return Err(DslError::InvalidDocument(
            "Content must be an object".to_string(),
        ));
    };

    if !object.contains_key("navigation") {
        return Err(DslError::MissingRequiredField("navigation".to_string()));
    }

    Ok(serde_json::from_value(raw)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_parse_yaml_and_json_agree() {
        let yaml = r#"
id: doc
views:
  - id: view-1
    type: info
navigation:
  BEGIN: flow
  flow:
    startState: VIEW_1
    VIEW_1:
      state_type: VIEW
      ref: view-1
"#;
        let json = r#"{
            "id": "doc",
            "views": [{"id": "view-1", "type": "info"}],
            "navigation": {
                "BEGIN": "flow",
                "flow": {"startState": "VIEW_1", "VIEW_1": {"state_type": "VIEW", "ref": "view-1"}}
            }
        }"#;

        let from_yaml = parse_content_yaml(yaml).unwrap();
        let from_json = parse_content_json(json).unwrap();

        assert_eq!(from_yaml, from_json);
        assert_eq!(from_yaml.id.as_deref(), Some("doc"));
        assert_eq!(from_yaml.view_ids(), vec!["view-1"]);
        assert_eq!(from_yaml.flow_names(), vec!["flow"]);
        assert_eq!(from_yaml.view("view-1"), Some(&json!({"id": "view-1", "type": "info"})));
        assert_eq!(from_yaml.data, Value::Null);
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(
            parse_content_json("[1, 2]").unwrap_err().error_code(),
            "ERR_DSL_INVALID_DOCUMENT"
        );
        assert_eq!(
            parse_content_json(r#"{"views": []}"#).unwrap_err().error_code(),
            "ERR_DSL_MISSING_FIELD"
        );
        assert_eq!(
            parse_content_json("{not json").unwrap_err().error_code(),
            "ERR_DSL_JSON_PARSE"
        );
        assert_eq!(
            parse_content_yaml("navigation: [unclosed").unwrap_err().error_code(),
            "ERR_DSL_YAML_PARSE"
        );
        assert_eq!(
            parse_content_json(r#"{"navigation": {"BEGIN": 3}}"#)
                .unwrap_err()
                .error_code(),
            "ERR_DSL_JSON_PARSE"
        );
    }
}
