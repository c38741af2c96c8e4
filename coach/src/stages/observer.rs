//! Observer: grades the latest answer and steers difficulty.
//!
//! The observer never talks to the candidate. Its analysis is stored as an
//! internal thought; the keyword heuristics in [`crate::core::difficulty`]
//! turn that free text into a difficulty change and a finish signal.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::difficulty::{adjust_difficulty, classify_analysis, signals_finished};
use crate::core::keywords::OBSERVER_STOP_KEYWORD;
use crate::core::state::{DEFAULT_DIFFICULTY, InterviewState, StateUpdate, ThoughtTag};
use crate::io::llm::ChatMessage;
use crate::io::prompt::ObserverPromptInputs;
use crate::stages::{StageAgents, ask};

pub const BOOTSTRAP_THOUGHT: &str = "Interview started. Initializing analysis.";
pub const BOOTSTRAP_INSTRUCTIONS: &str = "The candidate has not written anything yet. \
Open the interview with a greeting and the first technical question.";
/// Question assumed when the answer has no preceding turn.
pub const DEFAULT_QUESTION: &str = "Introduce yourself.";
pub const NO_ANALYSIS_PLACEHOLDER: &str = "Failed to analyze the answer.";
pub const ANALYSIS_ERROR: &str = "Answer analysis failed.";
pub const CONTINUE_INSTRUCTIONS: &str = "Continue the interview at the current difficulty.";

const OBSERVER_INSTRUCTION: &str = "Analyze the candidate's answer and give your assessment.";

pub fn run(state: &InterviewState, agents: &StageAgents) -> StateUpdate {
    let Some(last) = state.messages.last() else {
        debug!("observer bootstrap");
        return StateUpdate {
            observer_instructions: Some(BOOTSTRAP_INSTRUCTIONS.to_string()),
            difficulty_level: Some(DEFAULT_DIFFICULTY),
            ..StateUpdate::default()
        }
        .with_thought(ThoughtTag::Observer, BOOTSTRAP_THOUGHT);
    };

    if last.content.to_lowercase().contains(OBSERVER_STOP_KEYWORD) {
        info!("observer saw stop request");
        return StateUpdate {
            is_finished: Some(true),
            ..StateUpdate::default()
        };
    }

    let question = match state.messages.len() {
        n if n > 1 => state.messages[n - 2].content.as_str(),
        _ => DEFAULT_QUESTION,
    };

    match analyze(state, agents, question, &last.content) {
        Ok(reply) => {
            let analysis = reply.unwrap_or_else(|| {
                warn!("observer returned no reply");
                NO_ANALYSIS_PLACEHOLDER.to_string()
            });
            let verdict = classify_analysis(&analysis);
            let difficulty = adjust_difficulty(state.difficulty_level, verdict);
            let finished = signals_finished(&analysis);
            debug!(
                ?verdict,
                from = state.difficulty_level,
                to = difficulty,
                finished,
                "observer graded answer"
            );
            StateUpdate {
                observer_instructions: Some(String::new()),
                difficulty_level: Some(difficulty),
                is_finished: Some(finished),
                ..StateUpdate::default()
            }
            .with_thought(ThoughtTag::Observer, analysis)
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "observer failed");
            StateUpdate {
                observer_instructions: Some(CONTINUE_INSTRUCTIONS.to_string()),
                difficulty_level: Some(state.difficulty_level),
                ..StateUpdate::default()
            }
            .with_thought(ThoughtTag::Observer, ANALYSIS_ERROR)
            .with_failure(format!("{err:#}"))
        }
    }
}

fn analyze(
    state: &InterviewState,
    agents: &StageAgents,
    question: &str,
    answer: &str,
) -> Result<Option<String>> {
    let context = agents.prompts.render_observer(&ObserverPromptInputs {
        profile: &state.candidate_profile,
        plan: &state.interview_plan,
        difficulty: state.difficulty_level,
        question,
        answer,
    })?;
    ask(
        agents.observer.as_ref(),
        vec![
            ChatMessage::user(context),
            ChatMessage::user(OBSERVER_INSTRUCTION),
        ],
    )
}
