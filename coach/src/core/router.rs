//! Deterministic routing between interview stages.

use std::fmt;

use serde::Serialize;

use crate::core::keywords::is_stop_request;
use crate::core::state::InterviewState;
use crate::core::transcript::last_user_turn;

/// The closed set of stages the orchestrator can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Planner,
    Observer,
    Interviewer,
    Manager,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Planner => "planner",
            Stage::Observer => "observer",
            Stage::Interviewer => "interviewer",
            Stage::Manager => "manager",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Entry routing: plan once, then always observe.
pub fn route_before_observer(state: &InterviewState) -> Stage {
    if state.interview_plan.is_empty() {
        Stage::Planner
    } else {
        Stage::Observer
    }
}

/// Post-observation routing: finish via Manager or keep interviewing.
///
/// A finished state always wins over message content. With no history the
/// interviewer opens the conversation.
pub fn route_after_observer(state: &InterviewState) -> Stage {
    if state.is_finished {
        return Stage::Manager;
    }
    if state.messages.is_empty() {
        return Stage::Interviewer;
    }
    match last_user_turn(&state.messages) {
        Some(turn) if is_stop_request(&turn.content) => Stage::Manager,
        _ => Stage::Interviewer,
    }
}
