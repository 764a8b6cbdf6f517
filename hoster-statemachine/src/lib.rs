//! Pure, backend-agnostic state transition checking.
//!
//! A storage backend owns the load-check-write lifecycle (it must apply the
//! state change atomically against whatever concurrency control the store
//! provides); this crate owns only the decision of whether a transition is
//! legal from a row already in hand, and what happens next if it is. This
//! keeps the transition rules testable without a database and reusable
//! across future backends.

use hoster_schema::{Resource, Row};

/// Why a transition was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    NoStateMachine,
    InvalidTransition { from: String, to: String },
    GuardFailed(String),
}

impl std::fmt::Display for TransitionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransitionError::NoStateMachine => write!(f, "resource has no state machine"),
            TransitionError::InvalidTransition { from, to } => {
                write!(f, "invalid transition {from} -> {to}")
            }
            TransitionError::GuardFailed(message) => write!(f, "guard failed: {message}"),
        }
    }
}

impl std::error::Error for TransitionError {}

/// A transition that has passed every check and is ready to be written.
#[derive(Debug, Clone)]
pub struct TransitionPlan {
    pub from: String,
    pub to: String,
    /// The on-enter command to dispatch once the write commits, if any.
    pub command: Option<&'static str>,
}

/// Validate a transition request against a resource's declared state
/// machine: lookup the current state, check the transition table, then run
/// the destination guard (if any) against the row as it stood before the
/// write. Callers perform the actual storage write themselves, atomically,
/// after this returns `Ok`.
pub fn plan_transition(
    resource: &Resource,
    current_row: &Row,
    to_state: &str,
) -> Result<TransitionPlan, TransitionError> {
    let sm = resource
        .state_machine
        .as_ref()
        .ok_or(TransitionError::NoStateMachine)?;

    let from = current_row
        .get(sm.field)
        .and_then(serde_json::Value::as_str)
        .unwrap_or(sm.initial)
        .to_string();

    if !sm.can_transition(&from, to_state) {
        return Err(TransitionError::InvalidTransition {
            from,
            to: to_state.to_string(),
        });
    }

    if let Some(guard) = sm.guard_for(to_state) {
        (guard.check)(current_row).map_err(TransitionError::GuardFailed)?;
    }

    Ok(TransitionPlan {
        from,
        to: to_state.to_string(),
        command: sm.on_enter_command(to_state),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_transition_not_in_table() {
        let deployment = hoster_schema::resource("deployment").unwrap();
        let mut row = Row::new();
        row.insert("status".into(), serde_json::json!("pending"));
        let err = plan_transition(deployment, &row, "running").unwrap_err();
        assert!(matches!(err, TransitionError::InvalidTransition { .. }));
    }

    #[test]
    fn rejects_when_guard_fails() {
        let deployment = hoster_schema::resource("deployment").unwrap();
        let mut row = Row::new();
        row.insert("status".into(), serde_json::json!("scheduled"));
        let err = plan_transition(deployment, &row, "starting").unwrap_err();
        assert!(matches!(err, TransitionError::GuardFailed(_)));
    }

    #[test]
    fn accepts_valid_transition_and_reports_command() {
        let deployment = hoster_schema::resource("deployment").unwrap();
        let mut row = Row::new();
        row.insert("status".into(), serde_json::json!("pending"));
        let plan = plan_transition(deployment, &row, "scheduled").unwrap();
        assert_eq!(plan.from, "pending");
        assert_eq!(plan.command, Some("schedule_deployment"));
    }

    #[test]
    fn falls_back_to_initial_state_when_field_absent() {
        let deployment = hoster_schema::resource("deployment").unwrap();
        let row = Row::new();
        let plan = plan_transition(deployment, &row, "scheduled").unwrap();
        assert_eq!(plan.from, "pending");
    }
}
