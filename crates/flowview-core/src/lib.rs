//!
//! Flowview Core - incremental view resolution and flow navigation
//!
//! This crate turns authored view JSON into a node tree, resolves it against
//! live data while reusing every subtree whose dependencies did not change,
//! and runs the navigation state machines that decide which view is shown.
//! Expression evaluation and data storage are collaborators described by the
//! [`ExpressionEvaluator`] and [`DataModel`] traits.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Paths into the data model
pub mod binding;

/// Data model trait, in-memory model and dependency tracking
pub mod data;

/// Error types
pub mod error;

/// Expression collaborator
pub mod expression;

/// Flow navigation state machines
pub mod flow;

/// Named interceptor registries
pub mod hooks;

/// Logging collaborator
pub mod logger;

/// View parsing and resolution
pub mod view;

pub use binding::{Binding, PathSegment};
pub use data::{changed_bindings, DataModel, DependencyModel, DependencyScope, LocalModel, Update};
pub use error::CoreError;
pub use expression::{is_truthy, Expression, ExpressionEvaluator};
pub use flow::{
    EndState, ErrorStateTransition, FlowCompletion, FlowController, FlowControllerOptions,
    FlowInstance, FlowInstanceOptions, NamedState, Navigation, NavigationFlow, NavigationState,
    StateType, TransitionOptions,
};
pub use hooks::{FallibleWaterfallHook, SyncBailHook, SyncHook, SyncWaterfallHook};
pub use logger::{LogLevel, Logger, TracingLogger};
pub use view::{
    Node, NodeArena, NodeId, NodeType, Parser, ResolvedNode, ResolvedValue, Resolver,
    ResolverOptions, SwitchCase, ViewInstance, ViewPlugin,
};
