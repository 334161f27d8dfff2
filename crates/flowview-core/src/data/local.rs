use super::{json_get_in, json_set_in, DataModel, Update};
use crate::binding::Binding;
use serde_json::Value;
use std::cell::RefCell;
use tracing::debug;

/// In-memory JSON data model
#[derive(Debug, Default)]
pub struct LocalModel {
    data: RefCell<Value>,
}

impl LocalModel {
    /// Create a model seeded with `data`
    pub fn new(data: Value) -> Self {
        Self {
            data: RefCell::new(data),
        }
    }

    /// Copy of the whole data tree
    pub fn snapshot(&self) -> Value {
        self.data.borrow().clone()
    }

    /// Replace the whole data tree
    pub fn reset(&self, data: Value) {
        *self.data.borrow_mut() = data;
    }
}

impl DataModel for LocalModel {
    fn get(&self, binding: &Binding) -> Value {
        json_get_in(&self.data.borrow(), binding.segments())
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set(&self, transaction: Vec<(Binding, Value)>) -> Vec<Update> {
        let mut updates = Vec::new();

        for (binding, new_value) in transaction {
            let old_value = self.get(&binding);
            if old_value == new_value {
                continue;
            }

            debug!("Setting {} in local model", binding);
            json_set_in(&mut self.data.borrow_mut(), binding.segments(), new_value.clone());
            updates.push(Update {
                binding,
                old_value,
                new_value,
            });
        }

        updates
    }
}
