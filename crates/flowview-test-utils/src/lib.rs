//! Testing utilities for the Flowview runtime.
//!
//! Mocks for the expression collaborator, a recording logger, content
//! fixtures, a view harness pairing a view with its data, and assertions
//! over flow controllers.

pub mod assertions;
pub mod builders;
pub mod data_generators;
pub mod logging;
pub mod mocks;

/// Re-export commonly used types for convenience
pub use mockall;

pub use builders::TestView;
pub use logging::{init_tracing, RecordingLogger};
pub use mocks::MockEvaluator;
