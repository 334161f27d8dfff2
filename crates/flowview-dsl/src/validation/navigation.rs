use crate::document::ContentDocument;
use crate::validation::{error_codes, ValidationError, Validator};
use flowview_core::{ErrorStateTransition, Navigation, NavigationFlow, NavigationState, StateType};
use std::collections::HashSet;

/// Checks that every name in the navigation section points at something:
/// `BEGIN` at a flow, `startState` and transition targets at states of the
/// same flow, `FLOW` states at flows and `VIEW` states at views.
#[derive(Debug, Default)]
pub struct NavigationValidator;

impl NavigationValidator {
    /// Create a navigation validator
    pub fn new() -> Self {
        Self
    }

    fn validate_begin(&self, navigation: &Navigation, errors: &mut Vec<ValidationError>) {
        match navigation.begin.as_deref() {
            None => errors.push(ValidationError::new(
                error_codes::MISSING_REQUIRED_FIELD,
                "Navigation must supply a BEGIN flow",
                "navigation.BEGIN",
            )),
            Some(begin) if !navigation.flows.contains_key(begin) => {
                errors.push(ValidationError::new(
                    error_codes::INVALID_REFERENCE,
                    format!("BEGIN references unknown flow '{}'", begin),
                    "navigation.BEGIN",
                ))
            }
            Some(_) => {}
        }
    }

    fn validate_flow(
        &self,
        name: &str,
        flow: &NavigationFlow,
        navigation: &Navigation,
        view_ids: &HashSet<&str>,
        errors: &mut Vec<ValidationError>,
    ) {
        let path = format!("navigation.{}", name);

        match flow.start_state.as_deref() {
            None => errors.push(ValidationError::new(
                error_codes::MISSING_REQUIRED_FIELD,
                format!("Flow '{}' has no startState", name),
                format!("{}.startState", path),
            )),
            Some(start) if !flow.has_state(start) => errors.push(ValidationError::new(
                error_codes::INVALID_REFERENCE,
                format!("startState references unknown state '{}'", start),
                format!("{}.startState", path),
            )),
            Some(_) => {}
        }

        if let Some(error_state) = &flow.error_state {
            check_error_state(flow, error_state, &format!("{}.errorState", path), errors);
        }

        for (action, target) in flow.transitions.iter().flatten() {
            check_target(flow, target, &format!("{}.transitions.{}", path, action), errors);
        }

        for state_name in flow.states.keys() {
            // Malformed states are reported by the schema check
            let Some(state) = flow.state(state_name) else {
                continue;
            };
            let state_path = format!("{}.{}", path, state_name);
            self.validate_state(flow, &state, &state_path, navigation, view_ids, errors);
        }
    }

    fn validate_state(
        &self,
        flow: &NavigationFlow,
        state: &NavigationState,
        path: &str,
        navigation: &Navigation,
        view_ids: &HashSet<&str>,
        errors: &mut Vec<ValidationError>,
    ) {
        for (action, target) in state.transitions.iter().flatten() {
            check_target(flow, target, &format!("{}.transitions.{}", path, action), errors);
        }

        if let Some(error_state) = &state.error_state {
            check_error_state(flow, error_state, &format!("{}.errorState", path), errors);
        }

        let ref_path = format!("{}.ref", path);
        match (state.state_type, state.reference.as_deref()) {
            (StateType::Flow, None) => errors.push(ValidationError::new(
                error_codes::MISSING_REQUIRED_FIELD,
                "FLOW state needs a ref to a flow",
                ref_path,
            )),
            (StateType::Flow, Some(reference)) if !navigation.flows.contains_key(reference) => {
                errors.push(ValidationError::new(
                    error_codes::INVALID_REFERENCE,
                    format!("FLOW state references unknown flow '{}'", reference),
                    ref_path,
                ))
            }
            (StateType::View, None) => errors.push(ValidationError::new(
                error_codes::MISSING_REQUIRED_FIELD,
                "VIEW state needs a ref to a view",
                ref_path,
            )),
            (StateType::View, Some(reference)) if !view_ids.contains(reference) => {
                errors.push(ValidationError::new(
                    error_codes::INVALID_REFERENCE,
                    format!("VIEW state references unknown view '{}'", reference),
                    ref_path,
                ))
            }
            (StateType::Action, _) if state.exp.is_none() => errors.push(ValidationError::new(
                error_codes::MISSING_REQUIRED_FIELD,
                "ACTION state needs an exp",
                format!("{}.exp", path),
            )),
            _ => {}
        }
    }
}

impl Validator for NavigationValidator {
    fn validate(&self, document: &ContentDocument) -> Vec<ValidationError> {
        let navigation = &document.navigation;
        let view_ids: HashSet<&str> = document.view_ids().into_iter().collect();
        let mut errors = Vec::new();

        self.validate_begin(navigation, &mut errors);

        for (name, raw) in &navigation.flows {
            if !raw.is_object() {
                errors.push(ValidationError::new(
                    error_codes::INVALID_FLOW,
                    format!("Flow '{}' needs to be an object", name),
                    format!("navigation.{}", name),
                ));
                continue;
            }

            match navigation.flow(name) {
                Ok(flow) => self.validate_flow(name, &flow, navigation, &view_ids, &mut errors),
                Err(err) => errors.push(ValidationError::new(
                    error_codes::INVALID_FLOW,
                    err.to_string(),
                    format!("navigation.{}", name),
                )),
            }
        }

        errors
    }
}

fn check_target(
    flow: &NavigationFlow,
    target: &str,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    if !flow.has_state(target) {
        errors.push(ValidationError::new(
            error_codes::INVALID_REFERENCE,
            format!("Transition targets unknown state '{}'", target),
            path,
        ));
    }
}

fn check_error_state(
    flow: &NavigationFlow,
    error_state: &ErrorStateTransition,
    path: &str,
    errors: &mut Vec<ValidationError>,
) {
    let targets: Vec<(String, &String)> = match error_state {
        ErrorStateTransition::Single(target) => vec![(path.to_string(), target)],
        ErrorStateTransition::ByType(targets) => targets
            .iter()
            .map(|(error_type, target)| (format!("{}.{}", path, error_type), target))
            .collect(),
    };

    for (target_path, target) in targets {
        if !flow.has_state(target) {
            errors.push(ValidationError::new(
                error_codes::INVALID_REFERENCE,
                format!("errorState targets unknown state '{}'", target),
                target_path,
            ));
        }
    }
}
