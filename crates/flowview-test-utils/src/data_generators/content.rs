use serde_json::{json, Value};

/// Parse a YAML fixture into JSON.
///
/// # Panics
///
/// Panics when `source` is not valid YAML; fixtures are written by hand.
pub fn yaml_fixture(source: &str) -> Value {
    serde_yaml::from_str(source).unwrap_or_else(|err| panic!("invalid YAML fixture: {}", err))
}

/// One flow, one view, one END state reached with any action
pub fn simple_navigation() -> Value {
    json!({
        "BEGIN": "main",
        "main": {
            "startState": "VIEW_1",
            "VIEW_1": {"state_type": "VIEW", "ref": "view-1", "transitions": {"*": "END_Done"}},
            "END_Done": {"state_type": "END", "outcome": "done"}
        }
    })
}

/// Flow `foo` shows view `foo`, then runs flow `bar` in a FLOW state.
///
/// `foo-1` enters the sub-flow and `foo-2` finishes it, which returns to
/// `foo` and ends it with outcome `yay`.
pub fn sub_flow_navigation() -> Value {
    json!({
        "BEGIN": "foo",
        "foo": {
            "startState": "View1",
            "View1": {"state_type": "VIEW", "ref": "foo", "transitions": {"foo-1": "Flow2"}},
            "Flow2": {"state_type": "FLOW", "ref": "bar", "transitions": {"yay": "End"}},
            "End": {"state_type": "END", "outcome": "yay"}
        },
        "bar": {
            "startState": "View2",
            "View2": {"state_type": "VIEW", "ref": "bar", "transitions": {"foo-2": "Done"}},
            "Done": {"state_type": "END", "outcome": "yay"}
        }
    })
}

/// A view whose `next` action goes through an ACTION state evaluating `exp`
pub fn action_navigation(exp: &str) -> Value {
    json!({
        "BEGIN": "main",
        "main": {
            "startState": "VIEW_1",
            "VIEW_1": {"state_type": "VIEW", "ref": "view-1", "transitions": {"next": "ACTION_1"}},
            "ACTION_1": {
                "state_type": "ACTION",
                "exp": exp,
                "transitions": {"left": "END_Left", "right": "END_Right", "*": "VIEW_1"}
            },
            "END_Left": {"state_type": "END", "outcome": "left"},
            "END_Right": {"state_type": "END", "outcome": "right"}
        }
    })
}

/// A view listing `items` through a dynamic template, with an optional footer
pub fn list_view(id: &str) -> Value {
    json!({
        "id": id,
        "type": "list",
        "title": {"asset": {"id": "title", "type": "text", "value": "{{title}}"}},
        "footer": {"asset": {
            "id": "footer",
            "type": "text",
            "value": "Total: {{count}}",
            "applicability": "{{showFooter}}"
        }},
        "template": [{
            "data": "items",
            "output": "rows",
            "dynamic": true,
            "value": {"asset": {"id": "row-_index_", "type": "text", "value": "{{items._index_.name}}"}}
        }]
    })
}

/// A content document with a list view and a confirmation view
pub fn content_document_yaml() -> String {
    r#"
id: groceries
views:
  - id: list
    type: list
    title:
      asset:
        id: title
        type: text
        value: "{{title}}"
    template:
      - data: items
        output: rows
        dynamic: true
        value:
          asset:
            id: row-_index_
            type: text
            value: "{{items._index_.name}}"
  - id: confirm
    type: info
    title:
      asset:
        id: confirm-title
        type: text
        value: "Buy {{count}} things?"
navigation:
  BEGIN: main
  main:
    startState: LIST
    LIST:
      state_type: VIEW
      ref: list
      transitions:
        next: CHECK
    CHECK:
      state_type: ACTION
      exp: "{{confirmed}}"
      transitions:
        "true": END_Done
        "*": CONFIRM
    CONFIRM:
      state_type: VIEW
      ref: confirm
      transitions:
        back: LIST
        next: END_Done
    END_Done:
      state_type: END
      outcome: done
data:
  title: Groceries
  count: 2
  confirmed: false
  items:
    - name: milk
    - name: eggs
"#
    .to_string()
}
