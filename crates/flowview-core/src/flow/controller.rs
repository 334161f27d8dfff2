//! The stack of running flows.

use super::instance::{pending, settled, FlowCompletion, FlowInstance, FlowInstanceOptions};
use super::navigation::{EndState, NamedState, Navigation, StateType, TransitionOptions};
use crate::data::{DataModel, LocalModel};
use crate::error::CoreError;
use crate::expression::{Expression, ExpressionEvaluator};
use crate::hooks::SyncHook;
use crate::logger::{Logger, TracingLogger};
use futures::channel::oneshot;
use futures::FutureExt;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

/// Options for a [`FlowController`]
#[derive(Debug, Clone, Default)]
pub struct FlowControllerOptions {
    /// Diagnostics sink, `tracing` when unset
    pub logger: Option<Rc<dyn Logger>>,
    /// Evaluates ACTION states and `onStart`/`onEnd` expressions
    pub evaluator: Option<Rc<dyn ExpressionEvaluator>>,
    /// Model the evaluator runs against, an empty [`LocalModel`] when unset
    pub model: Option<Rc<dyn DataModel>>,
}

impl FlowControllerOptions {
    /// Use `logger` for diagnostics
    pub fn with_logger(mut self, logger: Rc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Evaluate expressions with `evaluator` against `model`
    pub fn with_evaluator(
        mut self,
        evaluator: Rc<dyn ExpressionEvaluator>,
        model: Rc<dyn DataModel>,
    ) -> Self {
        self.evaluator = Some(evaluator);
        self.model = Some(model);
        self
    }
}

/// Hooks of a [`FlowController`]
#[derive(Debug, Default)]
pub struct FlowControllerHooks {
    /// Called with every flow instance the controller creates, before it starts
    pub flow: SyncHook<dyn Fn(&Rc<FlowInstance>)>,
}

struct ControllerInner {
    navigation: Navigation,
    logger: Rc<dyn Logger>,
    evaluator: Option<Rc<dyn ExpressionEvaluator>>,
    model: Rc<dyn DataModel>,
    stack: RefCell<Vec<Rc<FlowInstance>>>,
    queue: RefCell<VecDeque<Weak<FlowInstance>>>,
    draining: Cell<bool>,
    started: Cell<bool>,
    sender: RefCell<Option<oneshot::Sender<Result<EndState, CoreError>>>>,
    completion: FlowCompletion,
    hooks: FlowControllerHooks,
}

/// Runs the navigation of a content document.
///
/// The controller starts the `BEGIN` flow and keeps a stack of flow
/// instances. Entering a FLOW state pushes the referenced flow; when that
/// flow ends its outcome is replayed as a transition into the parent. When
/// the root flow ends the controller's completion settles with its END
/// state.
///
/// Sub-flow entry and exit and ACTION evaluation run from a work queue that
/// is drained right after every transition, so [`FlowController::current`]
/// is up to date as soon as a transition call returns.
#[derive(Clone)]
pub struct FlowController {
    inner: Rc<ControllerInner>,
}

impl fmt::Debug for FlowController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowController")
            .field("begin", &self.inner.navigation.begin)
            .field("stack", &self.inner.stack.borrow())
            .field("started", &self.inner.started.get())
            .finish()
    }
}

impl FlowController {
    /// Create a controller for `navigation`
    pub fn new(navigation: Navigation, options: FlowControllerOptions) -> Self {
        let (sender, completion) = pending("navigation");
        let inner = ControllerInner {
            navigation,
            logger: options
                .logger
                .unwrap_or_else(|| Rc::new(TracingLogger) as Rc<dyn Logger>),
            evaluator: options.evaluator,
            model: options
                .model
                .unwrap_or_else(|| Rc::new(LocalModel::default()) as Rc<dyn DataModel>),
            stack: RefCell::new(Vec::new()),
            queue: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
            started: Cell::new(false),
            sender: RefCell::new(Some(sender)),
            completion,
            hooks: FlowControllerHooks::default(),
        };

        Self {
            inner: Rc::new(inner),
        }
    }

    /// Controller hooks
    pub fn hooks(&self) -> &FlowControllerHooks {
        &self.inner.hooks
    }

    /// The navigation being run
    pub fn navigation(&self) -> &Navigation {
        &self.inner.navigation
    }

    /// The flow on top of the stack
    pub fn current(&self) -> Option<Rc<FlowInstance>> {
        self.inner.current()
    }

    /// Number of flows on the stack
    pub fn depth(&self) -> usize {
        self.inner.stack.borrow().len()
    }

    /// Settles with the END state of the root flow
    pub fn completion(&self) -> FlowCompletion {
        self.inner.completion.clone()
    }

    /// Start the `BEGIN` flow.
    ///
    /// Configuration problems come back as an already failed completion.
    /// Calling `start` again after a successful start returns the same
    /// completion.
    pub fn start(&self) -> FlowCompletion {
        if self.inner.started.get() {
            self.inner.logger.warn("Already called start for navigation");
            return self.completion();
        }

        let Some(begin) = self.inner.navigation.begin.clone() else {
            return settled(Err(CoreError::ConfigurationError(
                "Must supply a BEGIN state".to_string(),
            )));
        };

        self.inner.started.set(true);
        if let Err(err) = self.inner.push_flow(&begin) {
            self.inner.started.set(false);
            return settled(Err(err));
        }

        self.inner.drain();
        self.completion()
    }

    /// Transition the current flow with `action`
    pub fn transition(&self, action: &str, options: TransitionOptions) -> Result<(), CoreError> {
        let Some(current) = self.current() else {
            return Err(CoreError::NavigationError(
                "Not currently in a flow. Cannot transition.".to_string(),
            ));
        };

        current.transition(action, options)?;
        self.inner.drain();
        Ok(())
    }

    /// Route an error through the current flow.
    ///
    /// A node-level `errorState` on the current state is tried first, as a
    /// regular transition; then the flow-level `errorState`. Returns whether
    /// either one navigated.
    pub fn navigate_to_error_state(&self, error_type: Option<&str>) -> Result<bool, CoreError> {
        let Some(current) = self.current() else {
            self.inner
                .logger
                .warn("No active flow instance for error navigation");
            return Ok(false);
        };

        let node_error_state = current.current_state().and_then(|state: NamedState| {
            state
                .value
                .error_state
                .as_ref()
                .and_then(|error_state| error_state.resolve(error_type))
                .map(str::to_string)
        });

        if let Some(target) = node_error_state {
            self.inner.logger.debug(&format!(
                "Node-level: navigating to errorState {} (error type: {})",
                target,
                error_type.unwrap_or("none")
            ));
            match current.transition(&target, TransitionOptions::default()) {
                Ok(()) => {
                    self.inner.drain();
                    return Ok(true);
                }
                Err(err) => self
                    .inner
                    .logger
                    .error(&format!("Node-level navigation failed: {}", err)),
            }
        }

        let navigated = current.transition_to_error_state(error_type)?;
        self.inner.drain();
        if !navigated {
            self.inner
                .logger
                .debug("No flow-level errorState defined or no match found");
        }
        Ok(navigated)
    }
}

impl ControllerInner {
    fn current(&self) -> Option<Rc<FlowInstance>> {
        self.stack.borrow().last().cloned()
    }

    fn is_current(&self, instance: &Rc<FlowInstance>) -> bool {
        self.stack
            .borrow()
            .last()
            .map(|top| Rc::ptr_eq(top, instance))
            .unwrap_or(false)
    }

    fn push_flow(self: &Rc<Self>, name: &str) -> Result<Rc<FlowInstance>, CoreError> {
        let flow = self.navigation.flow(name)?;
        let instance = Rc::new(FlowInstance::new(
            name,
            flow,
            FlowInstanceOptions {
                logger: Some(Rc::clone(&self.logger)),
            },
        ));

        self.install_taps(&instance);
        self.stack.borrow_mut().push(Rc::clone(&instance));
        self.hooks.flow.call(&instance);
        self.logger.debug(&format!("Starting flow {}", name));

        if let Some(Err(err)) = instance.start().now_or_never() {
            self.stack
                .borrow_mut()
                .retain(|entry| !Rc::ptr_eq(entry, &instance));
            return Err(err);
        }

        Ok(instance)
    }

    fn install_taps(self: &Rc<Self>, instance: &Rc<FlowInstance>) {
        let controller = Rc::downgrade(self);
        let target = Rc::downgrade(instance);
        instance
            .hooks
            .after_transition
            .tap("flow-controller", move |_| {
                if let Some(controller) = controller.upgrade() {
                    controller.queue.borrow_mut().push_back(target.clone());
                    controller.drain();
                }
            });

        if self.evaluator.is_none() {
            return;
        }

        let controller = Rc::downgrade(self);
        instance.hooks.on_start.tap("flow-controller", move |exp| {
            if let Some(controller) = controller.upgrade() {
                controller.evaluate_lifecycle(exp, "onStart");
            }
        });

        let controller = Rc::downgrade(self);
        instance.hooks.on_end.tap("flow-controller", move |exp| {
            if let Some(controller) = controller.upgrade() {
                controller.evaluate_lifecycle(exp, "onEnd");
            }
        });
    }

    fn evaluate_lifecycle(&self, exp: &Expression, hook: &str) {
        let Some(evaluator) = self.evaluator.as_ref() else {
            return;
        };
        if let Err(err) = evaluator.evaluate(exp, &*self.model) {
            self.logger
                .error(&format!("Error evaluating {} expression {}: {}", hook, exp, err));
        }
    }

    fn drain(self: &Rc<Self>) {
        if self.draining.get() {
            return;
        }
        self.draining.set(true);

        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(next) = next else {
                break;
            };
            let Some(instance) = next.upgrade() else {
                continue;
            };

            if let Err(err) = self.process(&instance) {
                self.logger
                    .error(&format!("Flow {} failed: {}", instance.id(), err));
                self.settle(Err(err));
            }
        }

        self.draining.set(false);
    }

    fn process(self: &Rc<Self>, instance: &Rc<FlowInstance>) -> Result<(), CoreError> {
        if !self.is_current(instance) {
            return Ok(());
        }
        let Some(state) = instance.current_state() else {
            return Ok(());
        };

        match state.value.state_type {
            StateType::Flow => {
                let reference = state.value.reference.as_deref().ok_or_else(|| {
                    CoreError::ConfigurationError(format!(
                        "FLOW state {} does not reference a flow",
                        state.name
                    ))
                })?;
                self.push_flow(reference)?;
                Ok(())
            }
            StateType::Action => self.run_action(instance, &state),
            StateType::End => self.finish(&state),
            _ => Ok(()),
        }
    }

    fn run_action(&self, instance: &FlowInstance, state: &NamedState) -> Result<(), CoreError> {
        let Some(evaluator) = self.evaluator.as_ref() else {
            self.logger.debug(&format!(
                "No expression evaluator configured, leaving ACTION state {} pending",
                state.name
            ));
            return Ok(());
        };
        let Some(exp) = state.value.exp.as_ref() else {
            self.logger
                .warn(&format!("ACTION state {} has no exp", state.name));
            return Ok(());
        };

        let action = match evaluator.evaluate(exp, &*self.model)? {
            Value::String(action) => action,
            other => other.to_string(),
        };
        instance.transition(&action, TransitionOptions::default())
    }

    fn finish(&self, state: &NamedState) -> Result<(), CoreError> {
        let end = EndState::from_state(&state.value)?;

        let parent = {
            let mut stack = self.stack.borrow_mut();
            if stack.len() > 1 {
                stack.pop();
                stack.last().cloned()
            } else {
                None
            }
        };

        match parent {
            Some(parent) => {
                self.logger.debug(&format!(
                    "Sub-flow ended with {}, returning to {}",
                    end.outcome,
                    parent.id()
                ));
                parent.transition(&end.outcome, TransitionOptions::default())
            }
            None => {
                self.settle(Ok(end));
                Ok(())
            }
        }
    }

    fn settle(&self, result: Result<EndState, CoreError>) {
        let sender = self.sender.borrow_mut().take();
        if let Some(sender) = sender {
            let _ = sender.send(result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Binding;
    use mockall::mock;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    mock! {
        #[derive(Debug)]
        Evaluator {}

        impl ExpressionEvaluator for Evaluator {
            fn evaluate(&self, expression: &Expression, model: &dyn DataModel) -> Result<Value, CoreError>;
        }
    }

    fn controller(navigation: Value) -> FlowController {
        FlowController::new(
            Navigation::from_json(navigation).unwrap(),
            FlowControllerOptions::default(),
        )
    }

    fn current_id(controller: &FlowController) -> Option<String> {
        controller.current().map(|flow| flow.id().to_string())
    }

    fn sub_flow_navigation() -> Value {
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

    #[tokio::test]
    async fn test_ends_when_the_flow_does() {
        let controller = controller(json!({
            "BEGIN": "foo",
            "foo": {
                "startState": "View1",
                "View1": {"state_type": "VIEW", "ref": "foo", "transitions": {"*": "End"}},
                "End": {"state_type": "END", "outcome": "yay"}
            }
        }));

        let result = controller.start();
        controller.transition("foo", TransitionOptions::default()).unwrap();

        assert_eq!(result.await.unwrap().outcome, "yay");
    }

    #[tokio::test]
    async fn test_calls_another_flow() {
        let controller = controller(sub_flow_navigation());

        let result = controller.start();
        assert_eq!(current_id(&controller).as_deref(), Some("foo"));

        controller.transition("foo-1", TransitionOptions::default()).unwrap();
        assert_eq!(current_id(&controller).as_deref(), Some("bar"));
        assert_eq!(controller.depth(), 2);

        controller.transition("foo-2", TransitionOptions::default()).unwrap();

        assert_eq!(result.await.unwrap().outcome, "yay");
        assert_eq!(current_id(&controller).as_deref(), Some("foo"));
        assert_eq!(controller.depth(), 1);
    }

    #[test]
    fn test_switches_between_parent_and_sub_flow() {
        let controller = controller(json!({
            "BEGIN": "Flow-1",
            "Flow-1": {
                "startState": "Initial",
                "END_Back": {"outcome": "backBeforeTopic", "state_type": "END"},
                "Go-To-Flow-2": {"state_type": "FLOW", "ref": "Flow-2", "transitions": {"*": "Initial"}},
                "Initial": {
                    "ref": "Initial-View",
                    "state_type": "VIEW",
                    "transitions": {"Prev": "END_Back", "*": "Go-To-Flow-2"},
                    "nodeName": "Initial",
                    "fromAction": null
                }
            },
            "Flow-2": {
                "startState": "Result",
                "END_Done": {"state_type": "END", "outcome": "Done"},
                "Result": {"ref": "Result-View", "state_type": "VIEW", "transitions": {"*": "END_Done"}}
            }
        }));

        controller.start();
        assert_eq!(current_id(&controller).as_deref(), Some("Flow-1"));
        controller.transition("Next", TransitionOptions::default()).unwrap();
        assert_eq!(current_id(&controller).as_deref(), Some("Flow-2"));
        controller.transition("Back", TransitionOptions::default()).unwrap();
        assert_eq!(current_id(&controller).as_deref(), Some("Flow-1"));

        controller.transition("Next", TransitionOptions::default()).unwrap();
        let current = controller.current().unwrap();
        assert_eq!(current.id(), "Flow-2");
        assert_eq!(current.current_state().unwrap().name, "Result");
        assert!(controller.completion().now_or_never().is_none());
    }

    #[tokio::test]
    async fn test_start_errors() {
        let cases = vec![
            (json!({"BEGIN": "foo"}), "No flow defined for: foo"),
            (json!({"BEGIN": "foo", "foo": "bar"}), "Flow: foo needs to be an object"),
            (json!({}), "Must supply a BEGIN state"),
            (json!({"BEGIN": "foo", "foo": {}}), "No 'startState' defined for flow"),
        ];

        for (navigation, expected) in cases {
            let controller = controller(navigation);
            let err = controller.start().await.unwrap_err();
            assert_eq!(err, CoreError::ConfigurationError(expected.to_string()));
            assert!(controller.current().is_none());
        }
    }

    #[test]
    fn test_fails_if_not_started() {
        let controller = controller(json!({}));
        let err = controller
            .transition("next", TransitionOptions::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Navigation error: Not currently in a flow. Cannot transition."
        );
    }

    #[tokio::test]
    async fn test_keeps_last_flow_current_after_completion() {
        let controller = controller(json!({
            "BEGIN": "FLOW_1",
            "FLOW_1": {
                "startState": "VIEW_1",
                "VIEW_1": {"ref": "view-1", "state_type": "VIEW", "transitions": {"*": "End"}},
                "End": {"state_type": "END", "outcome": "done"}
            }
        }));

        let result = controller.start();
        controller.transition("Next", TransitionOptions::default()).unwrap();
        result.await.unwrap();

        let current = controller.current().unwrap();
        assert_eq!(
            current.current_state().unwrap().value.outcome.as_deref(),
            Some("done")
        );
    }

    #[tokio::test]
    async fn test_start_is_idempotent() {
        let controller = controller(sub_flow_navigation());
        let first = controller.start();
        let second = controller.start();

        assert_eq!(controller.depth(), 1);
        controller.transition("foo-1", TransitionOptions::default()).unwrap();
        controller.transition("foo-2", TransitionOptions::default()).unwrap();

        assert_eq!(first.await.unwrap(), second.await.unwrap());
    }

    #[test]
    fn test_flow_hook_sees_every_instance() {
        let controller = controller(sub_flow_navigation());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let recorded = Rc::clone(&seen);
        controller.hooks().flow.tap("test", move |flow| {
            assert!(flow.current_state().is_none());
            recorded.borrow_mut().push(flow.id().to_string());
        });

        controller.start();
        controller.transition("foo-1", TransitionOptions::default()).unwrap();

        assert_eq!(*seen.borrow(), vec!["foo", "bar"]);
    }

    #[tokio::test]
    async fn test_action_states_transition_with_the_evaluated_result() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .withf(|exp, _| exp == &Expression::from("{{next}}"))
            .times(1)
            .returning(|_, model| Ok(model.get(&Binding::parse("next").unwrap())));

        let model = Rc::new(LocalModel::new(json!({"next": "approve"})));
        let controller = FlowController::new(
            Navigation::from_json(json!({
                "BEGIN": "flow",
                "flow": {
                    "startState": "Decide",
                    "Decide": {"state_type": "ACTION", "exp": "{{next}}", "transitions": {"approve": "Done", "*": "Rejected"}},
                    "Done": {"state_type": "END", "outcome": "approved"},
                    "Rejected": {"state_type": "END", "outcome": "rejected"}
                }
            }))
            .unwrap(),
            FlowControllerOptions::default().with_evaluator(Rc::new(evaluator), model),
        );

        let end = controller.start().await.unwrap();
        assert_eq!(end.outcome, "approved");
        assert_eq!(
            controller.current().unwrap().history(),
            vec!["Decide", "Done"]
        );
    }

    #[tokio::test]
    async fn test_action_failure_rejects_the_completion() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .returning(|_, _| Err(CoreError::ExpressionError("boom".to_string())));

        let controller = FlowController::new(
            Navigation::from_json(json!({
                "BEGIN": "flow",
                "flow": {
                    "startState": "View",
                    "View": {"state_type": "VIEW", "ref": "v", "transitions": {"next": "Act"}},
                    "Act": {"state_type": "ACTION", "exp": "bad", "transitions": {"*": "View"}}
                }
            }))
            .unwrap(),
            FlowControllerOptions::default()
                .with_evaluator(Rc::new(evaluator), Rc::new(LocalModel::default())),
        );

        let result = controller.start();
        controller.transition("next", TransitionOptions::default()).unwrap();

        assert_eq!(
            result.await.unwrap_err(),
            CoreError::ExpressionError("boom".to_string())
        );
    }

    #[test]
    fn test_on_start_and_on_end_are_evaluated() {
        let mut evaluator = MockEvaluator::new();
        evaluator
            .expect_evaluate()
            .returning(|exp, model| {
                let binding = Binding::parse("log").unwrap();
                let mut log = model.get(&binding).as_array().cloned().unwrap_or_default();
                log.push(json!(exp.to_string()));
                model.set(vec![(binding, Value::Array(log))]);
                Ok(Value::Null)
            });

        let model = Rc::new(LocalModel::default());
        let controller = FlowController::new(
            Navigation::from_json(json!({
                "BEGIN": "flow",
                "flow": {
                    "onStart": "started",
                    "onEnd": "ended",
                    "startState": "View",
                    "View": {"state_type": "VIEW", "ref": "v", "transitions": {"*": "End"}},
                    "End": {"state_type": "END", "outcome": "done"}
                }
            }))
            .unwrap(),
            FlowControllerOptions::default().with_evaluator(Rc::new(evaluator), model.clone()),
        );

        controller.start();
        controller.transition("next", TransitionOptions::default()).unwrap();

        assert_eq!(model.snapshot(), json!({"log": ["started", "ended"]}));
    }

    #[test]
    fn test_action_without_evaluator_waits_for_the_host() {
        let controller = controller(json!({
            "BEGIN": "flow",
            "flow": {
                "startState": "Act",
                "Act": {"state_type": "ACTION", "exp": "x", "transitions": {"*": "End"}},
                "End": {"state_type": "END", "outcome": "done"}
            }
        }));

        controller.start();
        assert_eq!(controller.current().unwrap().current_state().unwrap().name, "Act");

        controller.transition("go", TransitionOptions::default()).unwrap();
        assert!(controller.completion().now_or_never().is_some());
    }

    mod error_navigation {
        use super::*;
        use pretty_assertions::assert_eq;

        fn navigation() -> Value {
            json!({
                "BEGIN": "flow",
                "flow": {
                    "startState": "View1",
                    "errorState": {"network": "NetworkError", "*": "GenericError"},
                    "View1": {
                        "state_type": "VIEW",
                        "ref": "view-1",
                        "errorState": "NodeError",
                        "transitions": {"NodeError": "NodeErrorView", "next": "View2"}
                    },
                    "View2": {"state_type": "VIEW", "ref": "view-2", "transitions": {}},
                    "NodeErrorView": {"state_type": "VIEW", "ref": "node-error", "transitions": {}},
                    "NetworkError": {"state_type": "VIEW", "ref": "network-error", "transitions": {}},
                    "GenericError": {"state_type": "VIEW", "ref": "generic-error", "transitions": {}}
                }
            })
        }

        fn current_state(controller: &FlowController) -> String {
            controller.current().unwrap().current_state().unwrap().name
        }

        #[test]
        fn test_node_level_error_state_uses_a_transition() {
            let controller = controller(navigation());
            controller.start();

            assert!(controller.navigate_to_error_state(Some("network")).unwrap());
            assert_eq!(current_state(&controller), "NodeErrorView");
        }

        #[test]
        fn test_falls_back_to_flow_level_error_state() {
            let controller = controller(navigation());
            controller.start();
            controller.transition("next", TransitionOptions::default()).unwrap();

            assert!(controller.navigate_to_error_state(Some("network")).unwrap());
            assert_eq!(current_state(&controller), "NetworkError");
        }

        #[test]
        fn test_reports_when_nothing_matches() {
            let controller = controller(json!({
                "BEGIN": "flow",
                "flow": {
                    "startState": "View1",
                    "View1": {"state_type": "VIEW", "ref": "view-1", "transitions": {}}
                }
            }));

            assert!(!controller.navigate_to_error_state(None).unwrap());
            controller.start();
            assert!(!controller.navigate_to_error_state(None).unwrap());
            assert_eq!(current_state(&controller), "View1");
        }
    }
}
