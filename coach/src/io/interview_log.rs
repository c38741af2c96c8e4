//! Session artifacts written to `logs_dir` when an interview ends.
//!
//! - `interview_log_<stamp>.json`: the turn-by-turn record, pretty-printed.
//! - `runtime_traces_<stamp>.jsonl`: one stage event per line.
//!
//! Both are product output, independent of `RUST_LOG`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::core::router::Stage;
use crate::core::state::StateUpdate;

/// Shown as the agent message for turns answered before any question.
pub const DIALOGUE_START: &str = "(start of dialogue)";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedTurn {
    pub turn_id: u32,
    pub agent_visible_message: String,
    pub user_message: String,
    /// Planner and Observer thoughts produced during this turn, one per line.
    pub internal_thoughts: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterviewLog {
    pub participant_name: String,
    pub turns: Vec<LoggedTurn>,
    pub final_feedback: String,
}

impl InterviewLog {
    pub fn new(participant_name: impl Into<String>) -> Self {
        Self {
            participant_name: participant_name.into(),
            turns: Vec::new(),
            final_feedback: String::new(),
        }
    }

    /// Append a turn; ids are 1-based and sequential.
    pub fn add_turn(&mut self, agent_message: &str, user_message: &str, thoughts: String) {
        let agent_visible_message = if agent_message.is_empty() {
            DIALOGUE_START.to_string()
        } else {
            agent_message.to_string()
        };
        self.turns.push(LoggedTurn {
            turn_id: next_turn_id(self.turns.len()),
            agent_visible_message,
            user_message: user_message.to_string(),
            internal_thoughts: thoughts,
        });
    }

    pub fn set_final_feedback(&mut self, feedback: impl Into<String>) {
        self.final_feedback = feedback.into();
    }
}

/// 1-based id following `logged` turns, saturating at `u32::MAX`.
fn next_turn_id(logged: usize) -> u32 {
    u32::try_from(logged).map_or(u32::MAX, |n| n.saturating_add(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TracePhase {
    Start,
    End,
    Error,
}

/// One stage lifecycle event. Fields that don't apply to a phase are `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceEvent {
    pub ts: String,
    pub stage: Stage,
    pub phase: TracePhase,
    pub turn_count: u32,
    pub duration_ms: Option<u64>,
    pub input_messages: Option<usize>,
    pub output_messages: Option<usize>,
    pub input_internal_thoughts: Option<usize>,
    pub output_internal_thoughts: Option<usize>,
    pub error: Option<String>,
}

impl TraceEvent {
    fn blank(stage: Stage, phase: TracePhase, turn_count: u32) -> Self {
        Self {
            ts: chrono::Local::now().to_rfc3339(),
            stage,
            phase,
            turn_count,
            duration_ms: None,
            input_messages: None,
            output_messages: None,
            input_internal_thoughts: None,
            output_internal_thoughts: None,
            error: None,
        }
    }

    pub fn start(stage: Stage, turn_count: u32, messages: usize, thoughts: usize) -> Self {
        Self {
            input_messages: Some(messages),
            input_internal_thoughts: Some(thoughts),
            ..Self::blank(stage, TracePhase::Start, turn_count)
        }
    }

    pub fn end(stage: Stage, turn_count: u32, duration_ms: u64, update: &StateUpdate) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            output_messages: Some(update.messages.len()),
            output_internal_thoughts: Some(update.internal_thoughts.len()),
            ..Self::blank(stage, TracePhase::End, turn_count)
        }
    }

    pub fn error(stage: Stage, turn_count: u32, duration_ms: u64, error: &str) -> Self {
        Self {
            duration_ms: Some(duration_ms),
            error: Some(error.to_string()),
            ..Self::blank(stage, TracePhase::Error, turn_count)
        }
    }
}

/// In-memory trace, flushed once at session end.
#[derive(Debug, Clone, Default)]
pub struct TraceLog {
    events: Vec<TraceEvent>,
}

impl TraceLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, event: TraceEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[TraceEvent] {
        &self.events
    }

    fn to_jsonl(&self) -> Result<String> {
        let mut buf = String::new();
        for event in &self.events {
            buf.push_str(&serde_json::to_string(event).context("serialize trace event")?);
            buf.push('\n');
        }
        Ok(buf)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLogPaths {
    pub log_path: PathBuf,
    pub trace_path: PathBuf,
}

impl SessionLogPaths {
    pub fn new(logs_dir: &Path, stamp: &str) -> Self {
        Self {
            log_path: logs_dir.join(format!("interview_log_{stamp}.json")),
            trace_path: logs_dir.join(format!("runtime_traces_{stamp}.jsonl")),
        }
    }
}

/// Write both session files under `logs_dir`, stamped with local time.
pub fn write_session_logs(
    logs_dir: &Path,
    log: &InterviewLog,
    trace: &TraceLog,
) -> Result<SessionLogPaths> {
    let stamp = chrono::Local::now().format(TIMESTAMP_FORMAT).to_string();
    let paths = SessionLogPaths::new(logs_dir, &stamp);
    fs::create_dir_all(logs_dir)
        .with_context(|| format!("create logs dir {}", logs_dir.display()))?;

    write_json(&paths.log_path, log)?;
    write_text(&paths.trace_path, &trace.to_jsonl()?)?;
    Ok(paths)
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut buf = serde_json::to_string_pretty(value)?;
    buf.push('\n');
    write_text(path, &buf)
}
