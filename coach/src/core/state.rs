//! Shared interview state and the explicit merge of stage updates.
//!
//! Stages never mutate [`InterviewState`] directly. Each returns a
//! [`StateUpdate`], and the orchestrator folds it in with
//! [`InterviewState::merge`]:
//!
//! - `messages` and `internal_thoughts` are concatenated (append-only).
//! - Scalar fields are last-writer-wins when the update carries `Some`.
//! - `is_finished` is monotonic: an update can set it, never clear it.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lowest allowed difficulty level.
pub const MIN_DIFFICULTY: u8 = 1;
/// Highest allowed difficulty level.
pub const MAX_DIFFICULTY: u8 = 5;
/// Difficulty used before Observer has seen any answer.
pub const DEFAULT_DIFFICULTY: u8 = 2;

/// Author of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Agent,
}

/// One entry of the visible conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn agent(content: impl Into<String>) -> Self {
        Self {
            role: Role::Agent,
            content: content.into(),
        }
    }
}

/// Stage that produced an internal thought.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThoughtTag {
    Planner,
    Observer,
    Manager,
}

impl ThoughtTag {
    pub fn as_str(self) -> &'static str {
        match self {
            ThoughtTag::Planner => "Planner",
            ThoughtTag::Observer => "Observer",
            ThoughtTag::Manager => "Manager",
        }
    }
}

/// Tagged diagnostic entry. Rendered as `[Tag]: text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thought {
    pub tag: ThoughtTag,
    pub text: String,
}

impl Thought {
    pub fn new(tag: ThoughtTag, text: impl Into<String>) -> Self {
        Self {
            tag,
            text: text.into(),
        }
    }
}

impl fmt::Display for Thought {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.tag.as_str(), self.text)
    }
}

/// Candidate details collected once at session start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub name: String,
    pub role: String,
    pub grade: String,
    pub experience: String,
}

impl Default for CandidateProfile {
    fn default() -> Self {
        Self {
            name: "Candidate".to_string(),
            role: "Developer".to_string(),
            grade: "Junior".to_string(),
            experience: "Not specified".to_string(),
        }
    }
}

/// The single long-lived record threaded through every stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewState {
    pub messages: Vec<Turn>,
    pub internal_thoughts: Vec<Thought>,
    pub candidate_profile: CandidateProfile,
    pub interview_plan: String,
    pub observer_instructions: String,
    pub current_agent_response: String,
    pub last_agent_visible_message: String,
    pub difficulty_level: u8,
    pub is_finished: bool,
    pub turn_count: u32,
}

impl Default for InterviewState {
    fn default() -> Self {
        Self::new(CandidateProfile::default())
    }
}

impl InterviewState {
    /// Fresh state for a new session.
    pub fn new(candidate_profile: CandidateProfile) -> Self {
        Self {
            messages: Vec::new(),
            internal_thoughts: Vec::new(),
            candidate_profile,
            interview_plan: String::new(),
            observer_instructions: String::new(),
            current_agent_response: String::new(),
            last_agent_visible_message: String::new(),
            difficulty_level: DEFAULT_DIFFICULTY,
            is_finished: false,
            turn_count: 0,
        }
    }

    /// Record a real user input: append the turn and bump the counter.
    pub fn push_user_input(&mut self, input: impl Into<String>) {
        self.messages.push(Turn::user(input));
        self.turn_count += 1;
    }

    /// Fold a stage's partial update into the state.
    pub fn merge(mut self, update: StateUpdate) -> Self {
        self.messages.extend(update.messages);
        self.internal_thoughts.extend(update.internal_thoughts);

        if let Some(plan) = update.interview_plan {
            self.interview_plan = plan;
        }
        if let Some(instructions) = update.observer_instructions {
            self.observer_instructions = instructions;
        }
        if let Some(response) = update.current_agent_response {
            self.current_agent_response = response;
        }
        if let Some(level) = update.difficulty_level {
            self.difficulty_level = level.clamp(MIN_DIFFICULTY, MAX_DIFFICULTY);
        }
        if let Some(finished) = update.is_finished {
            self.is_finished = self.is_finished || finished;
        }

        self
    }

    /// Thoughts with the given tag, in insertion order.
    pub fn thoughts_tagged(&self, tag: ThoughtTag) -> impl Iterator<Item = &Thought> {
        self.internal_thoughts.iter().filter(move |t| t.tag == tag)
    }
}

/// Partial update returned by a stage.
///
/// `failure` describes a recovered error for the trace log and is never
/// merged into the state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub messages: Vec<Turn>,
    pub internal_thoughts: Vec<Thought>,
    pub interview_plan: Option<String>,
    pub observer_instructions: Option<String>,
    pub current_agent_response: Option<String>,
    pub difficulty_level: Option<u8>,
    pub is_finished: Option<bool>,
    pub failure: Option<String>,
}

impl StateUpdate {
    pub fn with_thought(mut self, tag: ThoughtTag, text: impl Into<String>) -> Self {
        self.internal_thoughts.push(Thought::new(tag, text));
        self
    }

    pub fn with_failure(mut self, failure: impl Into<String>) -> Self {
        self.failure = Some(failure.into());
        self
    }
}
