use flowview_core::{EndState, FlowCompletion, FlowController};
use futures::FutureExt;
use thiserror::Error;

/// Error type for flow state validation failures
#[derive(Debug, Error, PartialEq)]
pub enum FlowStateValidationError {
    #[error("No flow is running")]
    NotRunning,

    #[error("Flow ID mismatch: expected {expected}, got {actual}")]
    FlowIdMismatch { expected: String, actual: String },

    #[error("Invalid flow state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    #[error("Flow has not completed")]
    NotCompleted,

    #[error("Flow already completed with {0}")]
    AlreadyCompleted(String),

    #[error("Flow failed: {0}")]
    Failed(String),

    #[error("Outcome mismatch: expected {expected}, got {actual}")]
    OutcomeMismatch { expected: String, actual: String },
}

/// Check that the controller's current flow is `flow_id` and sits in `state`
pub fn assert_current_state(
    controller: &FlowController,
    flow_id: &str,
    state: &str,
) -> Result<(), FlowStateValidationError> {
    let current = controller
        .current()
        .ok_or(FlowStateValidationError::NotRunning)?;

    if current.id() != flow_id {
        return Err(FlowStateValidationError::FlowIdMismatch {
            expected: flow_id.to_string(),
            actual: current.id().to_string(),
        });
    }

    let actual = current
        .current_state()
        .map(|named| named.name)
        .unwrap_or_else(|| "<none>".to_string());
    if actual != state {
        return Err(FlowStateValidationError::InvalidState {
            expected: state.to_string(),
            actual,
        });
    }

    Ok(())
}

/// Check that `completion` already settled with an END state of `outcome`
pub fn assert_completed(
    completion: &FlowCompletion,
    outcome: &str,
) -> Result<EndState, FlowStateValidationError> {
    let end = completion
        .clone()
        .now_or_never()
        .ok_or(FlowStateValidationError::NotCompleted)?
        .map_err(|err| FlowStateValidationError::Failed(err.to_string()))?;

    if end.outcome != outcome {
        return Err(FlowStateValidationError::OutcomeMismatch {
            expected: outcome.to_string(),
            actual: end.outcome,
        });
    }

    Ok(end)
}

/// Check that `completion` has not settled yet
pub fn assert_pending(completion: &FlowCompletion) -> Result<(), FlowStateValidationError> {
    match completion.clone().now_or_never() {
        None => Ok(()),
        Some(Ok(end)) => Err(FlowStateValidationError::AlreadyCompleted(end.outcome)),
        Some(Err(err)) => Err(FlowStateValidationError::Failed(err.to_string())),
    }
}
