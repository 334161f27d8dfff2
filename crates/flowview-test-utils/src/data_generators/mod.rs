//! Content fixtures.

mod content;

pub use content::{
    action_navigation, content_document_yaml, list_view, simple_navigation, sub_flow_navigation,
    yaml_fixture,
};
