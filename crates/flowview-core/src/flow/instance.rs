//! A state machine over one flow.

use super::navigation::{
    EndState, NamedState, NavigationFlow, NavigationState, StateType, TransitionOptions,
};
use crate::error::CoreError;
use crate::expression::Expression;
use crate::hooks::{SyncBailHook, SyncHook, SyncWaterfallHook};
use crate::logger::{Logger, TracingLogger};
use futures::channel::oneshot;
use futures::future::{self, LocalBoxFuture, Shared};
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// Outcome of a flow, shared by everyone who asked for it
pub type FlowCompletion = Shared<LocalBoxFuture<'static, Result<EndState, CoreError>>>;

/// A completion that is already settled with `result`
pub(crate) fn settled(result: Result<EndState, CoreError>) -> FlowCompletion {
    future::ready(result).boxed_local().shared()
}

/// A pending completion and the sender that settles it.
///
/// Dropping the sender settles the completion with [`CoreError::FlowCancelled`].
pub(crate) fn pending(
    id: &str,
) -> (oneshot::Sender<Result<EndState, CoreError>>, FlowCompletion) {
    let (sender, receiver) = oneshot::channel();
    let id = id.to_string();
    let completion = receiver
        .map(move |result| result.unwrap_or_else(|_| Err(CoreError::FlowCancelled(id))))
        .boxed_local()
        .shared();
    (sender, completion)
}

/// Options for a [`FlowInstance`]
#[derive(Debug, Clone, Default)]
pub struct FlowInstanceOptions {
    /// Diagnostics sink, `tracing` when unset
    pub logger: Option<Rc<dyn Logger>>,
}

/// Hooks of a [`FlowInstance`]
#[derive(Debug, Default)]
pub struct FlowInstanceHooks {
    /// Rewrite the flow before it starts
    pub before_start: SyncWaterfallHook<dyn Fn(NavigationFlow) -> NavigationFlow>,
    /// Called with the flow's `onStart` expression
    pub on_start: SyncHook<dyn Fn(&Expression)>,
    /// Called with the flow's `onEnd` expression when an END state is entered
    pub on_end: SyncHook<dyn Fn(&Expression)>,
    /// Return `Some(true)` to block a transition away from the given state
    pub skip_transition: SyncBailHook<dyn Fn(&Option<NamedState>) -> Option<bool>>,
    /// Rewrite the current state before its transitions are consulted
    pub before_transition: SyncWaterfallHook<dyn Fn(NavigationState, &str) -> NavigationState>,
    /// Rewrite the state being entered
    pub resolve_transition_node: SyncWaterfallHook<dyn Fn(NavigationState) -> NavigationState>,
    /// Called with the previous and the new state
    pub transition: SyncHook<dyn Fn(&Option<NamedState>, &NamedState)>,
    /// Called once a transition finished; transitioning again is allowed here
    pub after_transition: SyncHook<dyn Fn(&FlowInstance)>,
}

struct TransitionGuard<'a>(&'a Cell<bool>);

impl<'a> TransitionGuard<'a> {
    fn enter(flag: &'a Cell<bool>) -> Self {
        flag.set(true);
        Self(flag)
    }
}

impl Drop for TransitionGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

/// Navigation state machine for a single flow.
///
/// `start` enters the flow's `startState` and returns a [`FlowCompletion`]
/// that settles when an END state is reached. Transitions are synchronous;
/// starting a transition from inside one of the transition hooks is an
/// error.
pub struct FlowInstance {
    id: String,
    flow: RefCell<NavigationFlow>,
    logger: Rc<dyn Logger>,
    history: RefCell<Vec<String>>,
    current_state: RefCell<Option<NamedState>>,
    transitioning: Cell<bool>,
    completion: RefCell<Option<FlowCompletion>>,
    sender: RefCell<Option<oneshot::Sender<Result<EndState, CoreError>>>>,
    /// Instance hooks
    pub hooks: FlowInstanceHooks,
}

impl fmt::Debug for FlowInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlowInstance")
            .field("id", &self.id)
            .field(
                "current_state",
                &self.current_state.borrow().as_ref().map(|state| state.name.clone()),
            )
            .field("history", &self.history.borrow())
            .finish()
    }
}

impl FlowInstance {
    /// Create an instance for `flow`
    pub fn new(id: impl Into<String>, flow: NavigationFlow, options: FlowInstanceOptions) -> Self {
        Self {
            id: id.into(),
            flow: RefCell::new(flow),
            logger: options
                .logger
                .unwrap_or_else(|| Rc::new(TracingLogger) as Rc<dyn Logger>),
            history: RefCell::new(Vec::new()),
            current_state: RefCell::new(None),
            transitioning: Cell::new(false),
            completion: RefCell::new(None),
            sender: RefCell::new(None),
            hooks: FlowInstanceHooks::default(),
        }
    }

    /// Name of the flow
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The state the flow is in
    pub fn current_state(&self) -> Option<NamedState> {
        self.current_state.borrow().clone()
    }

    /// Names of every state entered, oldest first
    pub fn history(&self) -> Vec<String> {
        self.history.borrow().clone()
    }

    /// The flow, after `before_start` rewrites
    pub fn flow(&self) -> NavigationFlow {
        self.flow.borrow().clone()
    }

    /// The completion handed out by `start`, if it was called
    pub fn completion(&self) -> Option<FlowCompletion> {
        self.completion.borrow().clone()
    }

    /// Whether a transition is being processed
    pub fn is_transitioning(&self) -> bool {
        self.transitioning.get()
    }

    /// Enter the start state.
    ///
    /// Calling `start` again returns the completion of the first call.
    pub fn start(&self) -> FlowCompletion {
        let existing = self.completion.borrow().clone();
        if let Some(existing) = existing {
            self.logger.warn("Already called start for flow");
            return existing;
        }

        let flow = self.hooks.before_start.call(self.flow.borrow().clone());
        let on_start = flow.on_start.clone();
        let start_state = flow.start_state.clone();
        *self.flow.borrow_mut() = flow;

        if let Some(on_start) = on_start {
            self.hooks.on_start.call(&on_start);
        }

        let Some(initial) = start_state else {
            return settled(Err(CoreError::ConfigurationError(
                "No 'startState' defined for flow".to_string(),
            )));
        };

        let (sender, completion) = pending(&self.id);
        *self.sender.borrow_mut() = Some(sender);
        *self.completion.borrow_mut() = Some(completion.clone());

        if let Err(err) = self.push_history(&initial) {
            self.settle(Err(err));
        }

        completion
    }

    /// Flow-level error state for `error_type`
    pub fn get_flow_error_state(&self, error_type: Option<&str>) -> Option<String> {
        self.flow
            .borrow()
            .error_state
            .as_ref()?
            .resolve(error_type)
            .map(str::to_string)
    }

    /// Follow `action` from the current state, falling back to `*`.
    ///
    /// An action with no matching transition is logged and leaves the state
    /// alone. So does any transition once an END state was reached.
    pub fn transition(&self, action: &str, options: TransitionOptions) -> Result<(), CoreError> {
        let Some(current) = self.check_transition(action)? else {
            return Ok(());
        };

        if options.force {
            self.logger.debug("Forced transition. Skipping validation checks");
        } else if self.hooks.skip_transition.call(&Some(current.clone())) == Some(true) {
            self.logger.debug(&format!(
                "Skipping transition from {} b/c hook told us to",
                current.name
            ));
            return Ok(());
        }

        let state = self.hooks.before_transition.call(current.value.clone(), action);
        let Some(transitions) = state.transitions.as_ref() else {
            return Err(CoreError::NavigationError(format!(
                "No transitions defined for {}",
                current.name
            )));
        };

        let Some(next) = transitions.get(action).or_else(|| transitions.get("*")) else {
            self.logger.warn(&format!(
                "No transition from {} using {} or *",
                current.name, action
            ));
            return Ok(());
        };

        self.logger.debug(&format!(
            "Transitioning from {} to {} using {}",
            current.name, next, action
        ));
        self.push_history(next)
    }

    /// Follow `action` using only the flow-level transitions
    pub fn flow_transition(&self, action: &str) -> Result<(), CoreError> {
        let Some(current) = self.check_transition(action)? else {
            return Ok(());
        };

        let next = {
            let flow = self.flow.borrow();
            let Some(transitions) = flow.transitions.as_ref() else {
                self.logger.warn("No flow-level transitions defined");
                return Ok(());
            };
            transitions.get(action).or_else(|| transitions.get("*")).cloned()
        };

        let Some(next) = next else {
            self.logger.warn(&format!(
                "No flow-level transition for {} or * in flow",
                action
            ));
            return Ok(());
        };

        self.logger.debug(&format!(
            "Flow-level transition from {} to {} using {}",
            current.name, next, action
        ));
        self.push_history(&next)
    }

    /// Jump straight to the flow-level error state for `error_type`.
    ///
    /// Transition maps and `skip_transition` are not consulted. Returns
    /// whether an error state was entered.
    pub fn transition_to_error_state(&self, error_type: Option<&str>) -> Result<bool, CoreError> {
        let Some(target) = self.get_flow_error_state(error_type) else {
            return Ok(false);
        };

        if self.check_transition(&target)?.is_none() {
            return Ok(false);
        }

        self.logger.debug(&format!(
            "Navigating to flow-level error state {} (error type: {})",
            target,
            error_type.unwrap_or("none")
        ));
        self.push_history(&target)?;
        Ok(true)
    }

    /// Current state if a transition may start, `None` when already at END
    fn check_transition(&self, action: &str) -> Result<Option<NamedState>, CoreError> {
        let current = self.current_state();

        if self.transitioning.get() {
            return Err(CoreError::TransitionInProgress(format!(
                "Transitioning while ongoing transition from {} is in progress is not supported",
                current
                    .as_ref()
                    .map(|state| state.name.as_str())
                    .unwrap_or("undefined")
            )));
        }

        match current {
            Some(state) if state.value.is_end() => {
                self.logger.warn(&format!(
                    "Skipping transition using {}. Already at END state",
                    action
                ));
                Ok(None)
            }
            Some(state) => Ok(Some(state)),
            None => Err(CoreError::NavigationError(
                "Cannot transition when there's no current state".to_string(),
            )),
        }
    }

    fn push_history(&self, name: &str) -> Result<(), CoreError> {
        let state = {
            let flow = self.flow.borrow();
            if !flow.has_state(name) {
                return Err(CoreError::ConfigurationError(format!(
                    "No flow definition for: {} was found.",
                    name
                )));
            }
            flow.state(name)
        };

        let Some(state) = state else {
            self.logger
                .error(&format!("Flow doesn't contain any states named: {}", name));
            return Ok(());
        };

        let previous = self.current_state();
        let guard = TransitionGuard::enter(&self.transitioning);

        let next = NamedState {
            name: name.to_string(),
            value: self.hooks.resolve_transition_node.call(state),
        };
        *self.current_state.borrow_mut() = Some(next.clone());
        self.history.borrow_mut().push(name.to_string());

        if next.value.state_type == StateType::End {
            let on_end = self.flow.borrow().on_end.clone();
            if let Some(on_end) = on_end {
                self.hooks.on_end.call(&on_end);
            }
            self.settle(EndState::from_state(&next.value));
        }

        self.hooks.transition.call(&previous, &next);

        drop(guard);
        self.hooks.after_transition.call(self);
        Ok(())
    }

    fn settle(&self, result: Result<EndState, CoreError>) {
        let sender = self.sender.borrow_mut().take();
        if let Some(sender) = sender {
            let _ = sender.send(result);
        }
    }
}
