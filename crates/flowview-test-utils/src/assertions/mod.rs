//! Assertions over running flows.

mod flow_state;

pub use flow_state::{
    assert_completed, assert_current_state, assert_pending, FlowStateValidationError,
};
