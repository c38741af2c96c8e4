//! Interview stages.
//!
//! Every stage is a plain function `fn(&InterviewState, &StageAgents) -> StateUpdate`.
//! Stages never fail: LLM and template errors degrade into placeholder text
//! and are reported through [`StateUpdate::failure`].

use anyhow::Result;

use crate::core::router::Stage;
use crate::core::state::{InterviewState, StateUpdate};
use crate::io::llm::{Agent, ChatMessage, last_assistant_reply};
use crate::io::prompt::PromptEngine;

pub mod interviewer;
pub mod manager;
pub mod observer;
pub mod planner;
pub mod summarizer;

/// The LLM delegates and prompt templates shared by all stages.
pub struct StageAgents {
    pub planner: Box<dyn Agent>,
    pub observer: Box<dyn Agent>,
    pub interviewer: Box<dyn Agent>,
    pub manager: Box<dyn Agent>,
    pub prompts: PromptEngine,
}

impl Stage {
    /// Run this stage's handler against the current state.
    pub fn run(self, state: &InterviewState, agents: &StageAgents) -> StateUpdate {
        let handler: fn(&InterviewState, &StageAgents) -> StateUpdate = match self {
            Stage::Planner => planner::run,
            Stage::Observer => observer::run,
            Stage::Interviewer => interviewer::run,
            Stage::Manager => manager::run,
        };
        handler(state, agents)
    }
}

/// Invoke `agent` and pull out its final non-empty assistant reply.
///
/// `Ok(None)` means the agent answered with nothing usable.
pub(crate) fn ask(agent: &dyn Agent, messages: Vec<ChatMessage>) -> Result<Option<String>> {
    let transcript = agent.invoke(messages)?;
    Ok(last_assistant_reply(&transcript).map(str::to_string))
}
