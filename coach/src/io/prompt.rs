//! Prompt rendering for interview stages.
//!
//! Context prompts are minijinja templates embedded at compile time. Agent
//! system prompts are static text exposed as constants.

use anyhow::Result;
use minijinja::{Environment, context};

use crate::core::state::CandidateProfile;

pub const PLANNER_SYSTEM_PROMPT: &str = include_str!("prompts/planner_system.md");
pub const OBSERVER_SYSTEM_PROMPT: &str = include_str!("prompts/observer_system.md");
pub const INTERVIEWER_SYSTEM_PROMPT: &str = include_str!("prompts/interviewer_system.md");
pub const MANAGER_SYSTEM_PROMPT: &str = include_str!("prompts/manager_system.md");

const PLANNER_TEMPLATE: &str = include_str!("prompts/planner_context.md");
const OBSERVER_TEMPLATE: &str = include_str!("prompts/observer_context.md");
const INTERVIEWER_TEMPLATE: &str = include_str!("prompts/interviewer_context.md");
const MANAGER_TEMPLATE: &str = include_str!("prompts/manager_context.md");
const SUMMARIZER_TEMPLATE: &str = include_str!("prompts/summarizer.md");

/// Inputs for the observer context prompt.
#[derive(Debug, Clone)]
pub struct ObserverPromptInputs<'a> {
    pub profile: &'a CandidateProfile,
    pub plan: &'a str,
    pub difficulty: u8,
    pub question: &'a str,
    pub answer: &'a str,
}

/// Inputs for the interviewer context prompt.
#[derive(Debug, Clone)]
pub struct InterviewerPromptInputs<'a> {
    pub profile: &'a CandidateProfile,
    pub plan: &'a str,
    pub difficulty: u8,
    pub observer_thought: Option<&'a str>,
    pub instructions: &'a str,
}

/// Template engine wrapper around minijinja.
pub struct PromptEngine {
    env: Environment<'static>,
}

impl Default for PromptEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PromptEngine {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("planner", PLANNER_TEMPLATE)
            .expect("planner template should be valid");
        env.add_template("observer", OBSERVER_TEMPLATE)
            .expect("observer template should be valid");
        env.add_template("interviewer", INTERVIEWER_TEMPLATE)
            .expect("interviewer template should be valid");
        env.add_template("manager", MANAGER_TEMPLATE)
            .expect("manager template should be valid");
        env.add_template("summarizer", SUMMARIZER_TEMPLATE)
            .expect("summarizer template should be valid");
        Self { env }
    }

    pub fn render_planner(&self, profile: &CandidateProfile, first_message: &str) -> Result<String> {
        let template = self.env.get_template("planner")?;
        Ok(template.render(context! {
            profile => profile,
            first_message => first_message.trim(),
        })?)
    }

    pub fn render_observer(&self, input: &ObserverPromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("observer")?;
        Ok(template.render(context! {
            profile => input.profile,
            plan => input.plan,
            difficulty => input.difficulty,
            question => input.question.trim(),
            answer => input.answer.trim(),
        })?)
    }

    pub fn render_interviewer(&self, input: &InterviewerPromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("interviewer")?;
        Ok(template.render(context! {
            profile => input.profile,
            plan => input.plan,
            difficulty => input.difficulty,
            observer_thought => input.observer_thought.map(str::trim).filter(|s| !s.is_empty()),
            instructions => (!input.instructions.trim().is_empty()).then(|| input.instructions.trim()),
        })?)
    }

    pub fn render_manager(&self, profile: &CandidateProfile, analysis: &str) -> Result<String> {
        let template = self.env.get_template("manager")?;
        Ok(template.render(context! {
            profile => profile,
            analysis => analysis,
        })?)
    }

    pub fn render_summarizer(&self, thoughts: &str) -> Result<String> {
        let template = self.env.get_template("summarizer")?;
        Ok(template.render(context! { thoughts => thoughts })?)
    }
}
