//! Test-only fakes for the LLM seams plus state builders.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Mutex;

use anyhow::{Result, anyhow};

use crate::core::state::{CandidateProfile, InterviewState, Thought, ThoughtTag, Turn};
use crate::io::console::{Input, LineReader};
use crate::io::llm::{Agent, ChatBackend, ChatMessage, Completion, CompletionRequest};
use crate::io::prompt::PromptEngine;
use crate::stages::StageAgents;

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Empty,
    Error(String),
}

#[derive(Debug, Default)]
struct ScriptedInner {
    queue: VecDeque<Scripted>,
    calls: Vec<Vec<ChatMessage>>,
}

/// Agent that plays back queued outcomes and records every call.
///
/// Clones share the same queue, so a test can keep a handle after boxing
/// one into [`StageAgents`]. An exhausted queue is an error.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgent {
    inner: Rc<RefCell<ScriptedInner>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an assistant reply.
    pub fn reply(self, text: &str) -> Self {
        self.push(Scripted::Reply(text.to_string()))
    }

    /// Queue a transcript with no assistant reply.
    pub fn empty(self) -> Self {
        self.push(Scripted::Empty)
    }

    /// Queue an invocation error.
    pub fn fail(self, message: &str) -> Self {
        self.push(Scripted::Error(message.to_string()))
    }

    fn push(self, outcome: Scripted) -> Self {
        self.inner.borrow_mut().queue.push_back(outcome);
        self
    }

    /// Messages passed to each invocation, oldest first.
    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.inner.borrow().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }
}

impl Agent for ScriptedAgent {
    fn invoke(&self, messages: Vec<ChatMessage>) -> Result<Vec<ChatMessage>> {
        let mut inner = self.inner.borrow_mut();
        inner.calls.push(messages.clone());
        match inner.queue.pop_front() {
            Some(Scripted::Reply(text)) => {
                let mut transcript = messages;
                transcript.push(ChatMessage::assistant(text));
                Ok(transcript)
            }
            Some(Scripted::Empty) => Ok(messages),
            Some(Scripted::Error(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted agent has no queued outcome")),
        }
    }
}

/// One scripted agent per stage.
#[derive(Debug, Clone, Default)]
pub struct ScriptedAgents {
    pub planner: ScriptedAgent,
    pub observer: ScriptedAgent,
    pub interviewer: ScriptedAgent,
    pub manager: ScriptedAgent,
}

impl ScriptedAgents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Box shared handles into the stage bundle.
    pub fn stage_agents(&self) -> StageAgents {
        StageAgents {
            planner: Box::new(self.planner.clone()),
            observer: Box::new(self.observer.clone()),
            interviewer: Box::new(self.interviewer.clone()),
            manager: Box::new(self.manager.clone()),
            prompts: PromptEngine::new(),
        }
    }
}

/// Chat backend that replays queued completions and records requests.
pub struct ScriptedBackend {
    responses: Mutex<VecDeque<Result<Completion>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedBackend {
    pub fn new(responses: Vec<Result<Completion>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl ChatBackend for ScriptedBackend {
    fn complete(&self, request: &CompletionRequest) -> Result<Completion> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.responses
            .lock()
            .map_err(|_| anyhow!("scripted backend poisoned"))?
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("scripted backend has no queued completion")))
    }
}

/// Line reader that plays back queued lines and interrupts, then reports
/// closed input.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLines {
    queue: VecDeque<Input>,
}

impl ScriptedLines {
    pub fn new() -> Self {
        Self::default()
    }

    /// One queued line per line of `text`.
    pub fn from_text(text: &str) -> Self {
        text.lines().fold(Self::new(), Self::line)
    }

    pub fn line(mut self, line: &str) -> Self {
        self.queue.push_back(Input::Line(line.to_string()));
        self
    }

    /// Queue a Ctrl+C at the prompt.
    pub fn interrupt(mut self) -> Self {
        self.queue.push_back(Input::Interrupted);
        self
    }
}

impl LineReader for ScriptedLines {
    fn read_line(&mut self) -> Result<Input> {
        Ok(self.queue.pop_front().unwrap_or(Input::Closed))
    }
}

/// Profile with distinct, recognizable values.
pub fn profile() -> CandidateProfile {
    CandidateProfile {
        name: "Alice".to_string(),
        role: "Backend Developer".to_string(),
        grade: "Middle".to_string(),
        experience: "3 years of Rust".to_string(),
    }
}

/// State past planning: plan set, one question asked and answered.
pub fn answered_state(question: &str, answer: &str) -> InterviewState {
    let mut state = InterviewState::new(profile());
    state.interview_plan = "1. Ownership 2. Traits".to_string();
    state.messages.push(Turn::agent(question));
    state.push_user_input(answer);
    state
}

pub fn observer_thought(text: &str) -> Thought {
    Thought::new(ThoughtTag::Observer, text)
}
