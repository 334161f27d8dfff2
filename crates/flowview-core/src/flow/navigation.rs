//! Navigation document types.
//!
//! Flows and states keep every key they do not know about, so plugins can
//! attach their own data to a state and read it back from hooks.

use crate::error::CoreError;
use crate::expression::Expression;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Transition map from action to state name
pub type Transitions = BTreeMap<String, String>;

/// The `navigation` section of a content document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Navigation {
    /// Name of the flow to run first
    #[serde(rename = "BEGIN", default, skip_serializing_if = "Option::is_none")]
    pub begin: Option<String>,
    /// Flows by name, kept raw until one is entered
    #[serde(flatten)]
    pub flows: Map<String, Value>,
}

impl Navigation {
    /// Parse a navigation section from JSON
    pub fn from_json(value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|err| CoreError::ConfigurationError(format!("Invalid navigation: {}", err)))
    }

    /// Look up and parse the flow named `name`
    pub fn flow(&self, name: &str) -> Result<NavigationFlow, CoreError> {
        let raw = self
            .flows
            .get(name)
            .ok_or_else(|| CoreError::ConfigurationError(format!("No flow defined for: {}", name)))?;

        if !raw.is_object() {
            return Err(CoreError::ConfigurationError(format!(
                "Flow: {} needs to be an object",
                name
            )));
        }

        serde_json::from_value(raw.clone()).map_err(|err| {
            CoreError::ConfigurationError(format!("Flow: {} is invalid: {}", name, err))
        })
    }
}

/// A single flow: a start state plus named states
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationFlow {
    /// State entered by `start`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_state: Option<String>,
    /// Where errors are routed for this flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_state: Option<ErrorStateTransition>,
    /// Flow-level transitions, used by `flow_transition`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Transitions>,
    /// Evaluated when the flow starts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_start: Option<Expression>,
    /// Evaluated when the flow reaches an END state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_end: Option<Expression>,
    /// States by name
    #[serde(flatten)]
    pub states: Map<String, Value>,
}

impl NavigationFlow {
    /// Parse a flow from JSON
    pub fn from_json(value: Value) -> Result<Self, CoreError> {
        serde_json::from_value(value)
            .map_err(|err| CoreError::ConfigurationError(format!("Invalid flow: {}", err)))
    }

    /// Whether a state called `name` exists
    pub fn has_state(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    /// Parse the state called `name`; `None` when it is missing or malformed
    pub fn state(&self, name: &str) -> Option<NavigationState> {
        serde_json::from_value(self.states.get(name)?.clone()).ok()
    }
}

/// Kind of a navigation state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StateType {
    /// Shows a view
    View,
    /// Evaluates an expression and transitions with the result
    Action,
    /// Runs another flow
    Flow,
    /// Ends the flow
    End,
    /// Any other state type
    #[serde(other)]
    Unknown,
}

/// A state of a flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    /// What kind of state this is
    pub state_type: StateType,
    /// View id for VIEW states, flow name for FLOW states
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Expression of an ACTION state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<Expression>,
    /// Outcome of an END state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    /// Action to state name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transitions: Option<Transitions>,
    /// Node-level error routing
    #[serde(
        rename = "errorState",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub error_state: Option<ErrorStateTransition>,
    /// Everything else on the state
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl NavigationState {
    /// A state of `state_type` with nothing else set
    pub fn new(state_type: StateType) -> Self {
        Self {
            state_type,
            reference: None,
            exp: None,
            outcome: None,
            transitions: None,
            error_state: None,
            extra: Map::new(),
        }
    }

    /// Whether this is an END state
    pub fn is_end(&self) -> bool {
        self.state_type == StateType::End
    }
}

/// Result of a flow: the END state it finished in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndState {
    /// Always [`StateType::End`]
    pub state_type: StateType,
    /// The outcome
    #[serde(default)]
    pub outcome: String,
    /// Any other keys of the END state
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EndState {
    /// An END state with just an outcome
    pub fn new(outcome: impl Into<String>) -> Self {
        Self {
            state_type: StateType::End,
            outcome: outcome.into(),
            extra: Map::new(),
        }
    }

    /// Build the end result for `state`, keeping all its extra keys
    pub fn from_state(state: &NavigationState) -> Result<Self, CoreError> {
        let mut end: EndState = serde_json::from_value(serde_json::to_value(state)?)?;
        end.state_type = StateType::End;
        Ok(end)
    }
}

/// Error routing: one state name or a state per error type (`*` as fallback)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorStateTransition {
    /// Always this state
    Single(String),
    /// Error type to state name
    ByType(BTreeMap<String, String>),
}

impl ErrorStateTransition {
    /// State to enter for `error_type`
    pub fn resolve(&self, error_type: Option<&str>) -> Option<&str> {
        match self {
            ErrorStateTransition::Single(state) => Some(state),
            ErrorStateTransition::ByType(states) => error_type
                .and_then(|error_type| states.get(error_type))
                .or_else(|| states.get("*"))
                .map(String::as_str),
        }
    }
}

/// A state together with its name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedState {
    /// Name of the state in the flow
    pub name: String,
    /// The state
    pub value: NavigationState,
}

/// Options for a single transition
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionOptions {
    /// Ignore `skip_transition` taps
    pub force: bool,
}

impl TransitionOptions {
    /// Options for a forced transition
    pub fn forced() -> Self {
        Self { force: true }
    }
}
