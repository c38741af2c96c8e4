//! Manager: writes the final feedback and closes the interview.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::state::{InterviewState, StateUpdate, ThoughtTag};
use crate::core::text::truncate_with_marker;
use crate::io::llm::ChatMessage;
use crate::stages::summarizer::summarize;
use crate::stages::{StageAgents, ask};

/// Upper bound on the analysis handed to the manager prompt.
pub const ANALYSIS_MAX_CHARS: usize = 8000;
pub const ANALYSIS_TRUNCATED_MARKER: &str = "\n\n[analysis truncated]";

pub const NO_FEEDBACK_PLACEHOLDER: &str = "Failed to generate feedback.";
pub const FEEDBACK_GENERATED: &str =
    "Final feedback generated from the summarized observations and the candidate profile.";

const MANAGER_INSTRUCTION: &str = "Write the final feedback for this technical interview. \
If there are knowledge gaps, recommend 3-5 current resources (documentation, articles, books, courses). \
Use the `web_search` tool if it is available. \
Give each recommendation as title + link + why it helps.";

/// Feedback shown when the manager call itself fails.
pub fn error_feedback(error: &str) -> String {
    format!("=== FINAL FEEDBACK ===\nA technical error occurred while generating feedback: {error}")
}

pub fn run(state: &InterviewState, agents: &StageAgents) -> StateUpdate {
    info!(turns = state.turn_count, "manager generating final feedback");
    match write_feedback(state, agents) {
        Ok(reply) => {
            let feedback = reply.unwrap_or_else(|| {
                warn!("manager returned no reply");
                NO_FEEDBACK_PLACEHOLDER.to_string()
            });
            debug!(chars = feedback.chars().count(), "manager feedback received");
            finish(feedback).with_thought(ThoughtTag::Manager, FEEDBACK_GENERATED)
        }
        Err(err) => {
            let error = format!("{err:#}");
            warn!(%error, "manager failed");
            let feedback = error_feedback(&error);
            finish(feedback.clone())
                .with_thought(ThoughtTag::Manager, feedback)
                .with_failure(error)
        }
    }
}

fn finish(feedback: String) -> StateUpdate {
    StateUpdate {
        current_agent_response: Some(feedback),
        is_finished: Some(true),
        ..StateUpdate::default()
    }
}

fn write_feedback(state: &InterviewState, agents: &StageAgents) -> Result<Option<String>> {
    let entries: Vec<String> = state
        .thoughts_tagged(ThoughtTag::Observer)
        .map(ToString::to_string)
        .collect();
    debug!(observer_thoughts = entries.len(), "manager collecting analysis");

    let summary = summarize(&entries, agents.observer.as_ref(), &agents.prompts);
    if summary.chars().count() > ANALYSIS_MAX_CHARS {
        warn!(chars = summary.chars().count(), "analysis still too long; truncating");
    }
    let analysis = truncate_with_marker(&summary, ANALYSIS_MAX_CHARS, ANALYSIS_TRUNCATED_MARKER);

    let context = agents
        .prompts
        .render_manager(&state.candidate_profile, &analysis)?;
    ask(
        agents.manager.as_ref(),
        vec![
            ChatMessage::user(context),
            ChatMessage::user(MANAGER_INSTRUCTION),
        ],
    )
}
