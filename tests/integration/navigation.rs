//! Navigation scenarios across flows, ACTION states and error routing.

use flowview_core::{
    FlowController, FlowControllerOptions, LocalModel, LogLevel, Navigation, TransitionOptions,
};
use flowview_stdlib::BindingExpressionEvaluator;
use flowview_test_utils::assertions::{assert_completed, assert_current_state, assert_pending};
use flowview_test_utils::data_generators::{action_navigation, sub_flow_navigation};
use flowview_test_utils::{init_tracing, MockEvaluator, RecordingLogger};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

fn controller(navigation: Value, options: FlowControllerOptions) -> FlowController {
    FlowController::new(Navigation::from_json(navigation).unwrap(), options)
}

fn current_id(controller: &FlowController) -> Option<String> {
    controller.current().map(|flow| flow.id().to_string())
}

#[tokio::test]
async fn test_sub_flow_returns_to_parent() {
    init_tracing();
    let controller = controller(sub_flow_navigation(), FlowControllerOptions::default());

    let entered = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&entered);
    controller
        .hooks()
        .flow
        .tap("record", move |flow| sink.borrow_mut().push(flow.id().to_string()));

    let completion = controller.start();
    assert_current_state(&controller, "foo", "View1").unwrap();

    controller.transition("foo-1", TransitionOptions::default()).unwrap();
    assert_current_state(&controller, "bar", "View2").unwrap();
    assert_eq!(controller.depth(), 2);
    assert_pending(&completion).unwrap();

    controller.transition("foo-2", TransitionOptions::default()).unwrap();

    let end = completion.await.unwrap();
    assert_eq!(end.outcome, "yay");
    assert_eq!(current_id(&controller).as_deref(), Some("foo"));
    assert_eq!(*entered.borrow(), vec!["foo".to_string(), "bar".to_string()]);
    assert_eq!(
        controller.current().unwrap().history(),
        vec!["View1".to_string(), "Flow2".to_string(), "End".to_string()]
    );
}

#[test]
fn test_action_state_result_picks_the_transition() {
    let controller = controller(
        action_navigation("{{choice}}"),
        FlowControllerOptions::default().with_evaluator(
            Rc::new(MockEvaluator::with_results(vec![("{{choice}}", json!("left"))])),
            Rc::new(LocalModel::default()),
        ),
    );

    let completion = controller.start();
    controller.transition("next", TransitionOptions::default()).unwrap();

    assert_completed(&completion, "left").unwrap();
}

#[test]
fn test_action_state_reads_the_model() {
    let model = Rc::new(LocalModel::new(json!({"choice": "right"})));
    let controller = controller(
        action_navigation("{{choice}}"),
        FlowControllerOptions::default()
            .with_evaluator(Rc::new(BindingExpressionEvaluator::new()), model),
    );

    let completion = controller.start();
    controller.transition("next", TransitionOptions::default()).unwrap();

    assert_completed(&completion, "right").unwrap();
}

#[test]
fn test_unmatched_action_result_uses_wildcard() {
    let controller = controller(
        action_navigation("{{choice}}"),
        FlowControllerOptions::default().with_evaluator(
            Rc::new(MockEvaluator::returning_value(json!("sideways"))),
            Rc::new(LocalModel::default()),
        ),
    );

    let completion = controller.start();
    controller.transition("next", TransitionOptions::default()).unwrap();

    assert_current_state(&controller, "main", "VIEW_1").unwrap();
    assert_pending(&completion).unwrap();
    assert_eq!(
        controller.current().unwrap().history(),
        vec!["VIEW_1".to_string(), "ACTION_1".to_string(), "VIEW_1".to_string()]
    );
}

#[test]
fn test_action_without_evaluator_stays_pending() {
    let logger = Rc::new(RecordingLogger::new());
    let controller = controller(
        action_navigation("{{choice}}"),
        FlowControllerOptions::default().with_logger(logger.clone()),
    );

    let completion = controller.start();
    controller.transition("next", TransitionOptions::default()).unwrap();

    assert_current_state(&controller, "main", "ACTION_1").unwrap();
    assert_pending(&completion).unwrap();
    assert!(logger.contains(LogLevel::Debug, "leaving ACTION state ACTION_1 pending"));
}

#[test]
fn test_error_in_sub_flow_ends_parent_through_its_transitions() {
    let controller = controller(
        json!({
            "BEGIN": "main",
            "main": {
                "startState": "Sub",
                "Sub": {"state_type": "FLOW", "ref": "checkout", "transitions": {"failed": "END_Failed", "*": "END_Done"}},
                "END_Failed": {"state_type": "END", "outcome": "failed"},
                "END_Done": {"state_type": "END", "outcome": "done"}
            },
            "checkout": {
                "startState": "Pay",
                "errorState": {"payment": "END_PaymentFailed"},
                "Pay": {"state_type": "VIEW", "ref": "pay", "transitions": {"next": "END_Paid"}},
                "END_PaymentFailed": {"state_type": "END", "outcome": "failed"},
                "END_Paid": {"state_type": "END", "outcome": "paid"}
            }
        }),
        FlowControllerOptions::default(),
    );

    let completion = controller.start();
    assert_current_state(&controller, "checkout", "Pay").unwrap();

    assert!(!controller.navigate_to_error_state(Some("network")).unwrap());
    assert_current_state(&controller, "checkout", "Pay").unwrap();

    assert!(controller.navigate_to_error_state(Some("payment")).unwrap());
    let end = assert_completed(&completion, "failed").unwrap();
    assert_eq!(end.outcome, "failed");
    assert_eq!(controller.depth(), 1);
}

#[test]
fn test_missing_begin_fails_the_start() {
    let controller = controller(json!({"main": {"startState": "A"}}), FlowControllerOptions::default());

    let completion = controller.start();
    let err = futures::executor::block_on(completion).unwrap_err();
    assert_eq!(err.to_string(), "Configuration error: Must supply a BEGIN state");
}
