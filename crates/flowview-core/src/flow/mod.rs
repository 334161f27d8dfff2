//! Flow navigation: document types, the per-flow state machine and the
//! controller that stacks sub-flows.

mod controller;
mod instance;
pub mod navigation;

pub use controller::{FlowController, FlowControllerHooks, FlowControllerOptions};
pub use instance::{FlowCompletion, FlowInstance, FlowInstanceHooks, FlowInstanceOptions};
pub use navigation::{
    EndState, ErrorStateTransition, NamedState, Navigation, NavigationFlow, NavigationState,
    StateType, TransitionOptions, Transitions,
};
