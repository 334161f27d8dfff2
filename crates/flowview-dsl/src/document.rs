//! Typed content documents.

use flowview_core::Navigation;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A content document: the views it can show, the navigation that decides
/// which one is shown, and the seed data for the data model
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentDocument {
    /// Document id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Authored views, each with an `id`
    #[serde(default)]
    pub views: Vec<Value>,

    /// Flows and the flow to begin with
    pub navigation: Navigation,

    /// Initial data
    #[serde(default)]
    pub data: Value,
}

impl ContentDocument {
    /// The view whose `id` is `id`
    pub fn view(&self, id: &str) -> Option<&Value> {
        self.views
            .iter()
            .find(|view| view_id(view) == Some(id))
    }

    /// Ids of all views that have one, in document order
    pub fn view_ids(&self) -> Vec<&str> {
        self.views.iter().filter_map(view_id).collect()
    }

    /// Names of all flows
    pub fn flow_names(&self) -> Vec<&str> {
        self.navigation.flows.keys().map(String::as_str).collect()
    }
}

pub(crate) fn view_id(view: &Value) -> Option<&str> {
    view.get("id").and_then(Value::as_str)
}
