//! Planner: drafts the interview plan once per session.

use anyhow::Result;
use tracing::{debug, warn};

use crate::core::state::{InterviewState, StateUpdate, ThoughtTag};
use crate::core::text::{flatten_lines, truncate_with_marker};
use crate::io::llm::ChatMessage;
use crate::stages::{StageAgents, ask};

/// Longest plan kept verbatim in the Planner thought.
pub const PLAN_THOUGHT_MAX_CHARS: usize = 4000;
pub const PLAN_TRUNCATED_MARKER: &str = "\n\n[truncated]";

pub const NO_PLAN_PLACEHOLDER: &str = "Failed to generate an interview plan.";
pub const PLANNING_ERROR: &str = "Planning failed.";

const PLANNER_INSTRUCTION: &str = "Draft an interview plan from the candidate information above. \
Use the `web_search` tool if it is available. Keep the plan compact.";

pub fn run(state: &InterviewState, agents: &StageAgents) -> StateUpdate {
    debug!(turn = state.turn_count, "planner started");
    match draft_plan(state, agents) {
        Ok(reply) => {
            let plan = reply.unwrap_or_else(|| {
                warn!("planner returned no reply");
                NO_PLAN_PLACEHOLDER.to_string()
            });
            debug!(chars = plan.chars().count(), "planner reply received");
            let thought = truncate_with_marker(
                plan.trim(),
                PLAN_THOUGHT_MAX_CHARS,
                PLAN_TRUNCATED_MARKER,
            );
            StateUpdate {
                interview_plan: Some(flatten_lines(&plan)),
                ..StateUpdate::default()
            }
            .with_thought(ThoughtTag::Planner, thought)
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "planner failed");
            StateUpdate {
                interview_plan: Some(PLANNING_ERROR.to_string()),
                ..StateUpdate::default()
            }
            .with_thought(ThoughtTag::Planner, PLANNING_ERROR)
            .with_failure(format!("{err:#}"))
        }
    }
}

fn draft_plan(state: &InterviewState, agents: &StageAgents) -> Result<Option<String>> {
    let first_message = state
        .messages
        .last()
        .map(|turn| turn.content.as_str())
        .unwrap_or_default();
    let context = agents
        .prompts
        .render_planner(&state.candidate_profile, first_message)?;
    ask(
        agents.planner.as_ref(),
        vec![
            ChatMessage::user(context),
            ChatMessage::user(PLANNER_INSTRUCTION),
        ],
    )
}
