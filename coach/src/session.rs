//! One interview session: state, agents and the logs it produces.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::core::keywords::is_stop_request;
use crate::core::state::{CandidateProfile, InterviewState, ThoughtTag};
use crate::graph::run_turn;
use crate::io::config::{ApiKeys, CoachConfig};
use crate::io::console::{Console, Input, LineReader};
use crate::io::interview_log::{InterviewLog, SessionLogPaths, TraceLog, write_session_logs};
use crate::io::llm::{ChatAgent, ChatBackend, OpenAiCompatibleBackend};
use crate::io::prompt::{
    INTERVIEWER_SYSTEM_PROMPT, MANAGER_SYSTEM_PROMPT, OBSERVER_SYSTEM_PROMPT,
    PLANNER_SYSTEM_PROMPT, PromptEngine,
};
use crate::io::search::{SearchTool, TavilySearch};
use crate::stages::StageAgents;

/// What the candidate sees after a turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The interview continues with this question.
    Question(String),
    /// The interview is over; this is the final feedback.
    Feedback(String),
}

pub struct Session {
    state: InterviewState,
    agents: StageAgents,
    log: InterviewLog,
    trace: TraceLog,
    logs_dir: PathBuf,
}

impl Session {
    pub fn new(profile: CandidateProfile, agents: StageAgents, logs_dir: PathBuf) -> Self {
        let log = InterviewLog::new(profile.name.clone());
        Self {
            state: InterviewState::new(profile),
            agents,
            log,
            trace: TraceLog::new(),
            logs_dir,
        }
    }

    pub fn state(&self) -> &InterviewState {
        &self.state
    }

    pub fn log(&self) -> &InterviewLog {
        &self.log
    }

    pub fn trace(&self) -> &TraceLog {
        &self.trace
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished
    }

    /// Feed one candidate answer through the orchestrator.
    pub fn process_user_input(&mut self, input: &str) -> Result<TurnOutcome> {
        if self.state.is_finished {
            bail!("interview already finished");
        }
        if input.trim().is_empty() {
            bail!("answer must not be empty");
        }

        let thoughts_before = self.state.internal_thoughts.len();
        let shown_before = self.state.last_agent_visible_message.clone();

        self.state.push_user_input(input);
        run_turn(&mut self.state, &self.agents, &mut self.trace);

        let turn_thoughts = self.state.internal_thoughts[thoughts_before..]
            .iter()
            .filter(|t| matches!(t.tag, ThoughtTag::Planner | ThoughtTag::Observer))
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        self.log.add_turn(&shown_before, input, turn_thoughts);

        let response = self.state.current_agent_response.clone();
        if self.state.is_finished {
            info!(turns = self.state.turn_count, "interview finished");
            Ok(TurnOutcome::Feedback(response))
        } else {
            self.state.last_agent_visible_message = response.clone();
            Ok(TurnOutcome::Question(response))
        }
    }

    /// Record the final feedback (if any) and write both log files.
    pub fn finish(&mut self) -> Result<SessionLogPaths> {
        if self.state.is_finished {
            self.log
                .set_final_feedback(self.state.current_agent_response.clone());
        }
        let paths = write_session_logs(&self.logs_dir, &self.log, &self.trace)?;
        info!(
            log = %paths.log_path.display(),
            trace = %paths.trace_path.display(),
            "session logs written"
        );
        Ok(paths)
    }
}

/// Ctrl+C state shared between the signal handler and [`run_interactive`].
///
/// A terminal prompt reports Ctrl+C itself, so the signal only arrives
/// while a turn runs or when input is not a terminal.
#[derive(Debug, Default)]
pub struct InterruptFlag {
    requested: AtomicBool,
    in_turn: AtomicBool,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle a SIGINT. Returns `false` when the process should exit now:
    /// outside a turn, or on a second signal during the same turn.
    pub fn signal(&self) -> bool {
        if !self.in_turn.load(Ordering::SeqCst) {
            return false;
        }
        !self.requested.swap(true, Ordering::SeqCst)
    }

    /// Ask the loop to offer a save once the current turn completes.
    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    fn take(&self) -> bool {
        self.requested.swap(false, Ordering::SeqCst)
    }

    fn set_in_turn(&self, in_turn: bool) {
        self.in_turn.store(in_turn, Ordering::SeqCst);
    }
}

/// How an interactive run ended.
///
/// Paths are `None` when the logs were not written, either by choice or
/// because writing failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// Final feedback produced.
    Completed(Option<SessionLogPaths>),
    /// Interrupted by Ctrl+C; the user chose whether to save.
    Interrupted(Option<SessionLogPaths>),
    /// Input closed mid-interview; nothing written.
    InputClosed,
}

/// Drive `session` from `console` until it finishes or is interrupted.
///
/// Ctrl+C at a prompt arrives from the console. `interrupted` covers
/// Ctrl+C while a turn runs and is checked once the turn completes, so a
/// submitted answer is always processed first. Turn errors are shown and
/// the loop continues.
pub fn run_interactive<L: LineReader, W: Write>(
    console: &mut Console<L, W>,
    session: &mut Session,
    interrupted: &InterruptFlag,
) -> Result<SessionEnd> {
    loop {
        let answer = match console.read_answer()? {
            Input::Line(answer) => answer,
            Input::Interrupted => return offer_save(console, session),
            Input::Closed => {
                warn!("input closed before the interview finished");
                return Ok(SessionEnd::InputClosed);
            }
        };
        if answer.trim().is_empty() {
            console.system("Please enter an answer.")?;
            continue;
        }
        if is_stop_request(&answer) {
            console.system("Finishing the interview...\n")?;
        }

        interrupted.set_in_turn(true);
        let outcome = session.process_user_input(&answer);
        interrupted.set_in_turn(false);

        match outcome {
            Ok(TurnOutcome::Feedback(feedback)) => {
                console.feedback(&feedback)?;
                return Ok(SessionEnd::Completed(save_logs(console, session)?));
            }
            Ok(TurnOutcome::Question(question)) if question.is_empty() => {
                console.system("Waiting for your answer...\n")?;
            }
            Ok(TurnOutcome::Question(question)) => console.interviewer(&question)?,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "turn failed");
                console.error(&format!("{err:#}"))?;
                console.system("Try to continue, or type 'стоп' to finish.")?;
            }
        }

        if interrupted.take() {
            return offer_save(console, session);
        }
    }
}

fn offer_save<L: LineReader, W: Write>(
    console: &mut Console<L, W>,
    session: &mut Session,
) -> Result<SessionEnd> {
    console.system("Interview interrupted.")?;
    let saved = if console.confirm("Save progress?")? {
        save_logs(console, session)?
    } else {
        None
    };
    Ok(SessionEnd::Interrupted(saved))
}

/// Write the session logs; a failure is reported, not propagated.
fn save_logs<L: LineReader, W: Write>(
    console: &mut Console<L, W>,
    session: &mut Session,
) -> Result<Option<SessionLogPaths>> {
    match session.finish() {
        Ok(paths) => Ok(Some(paths)),
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to write session logs");
            console.error(&format!("Failed to save logs: {err:#}"))?;
            Ok(None)
        }
    }
}

/// Build the four production agents.
///
/// Web search is attached to Planner and Manager only, and only when a
/// search key is configured.
pub fn build_agents(config: &CoachConfig, keys: &ApiKeys) -> Result<StageAgents> {
    let backend: Arc<dyn ChatBackend> =
        Arc::new(OpenAiCompatibleBackend::new(config, keys.llm.clone())?);
    let search: Option<Arc<dyn SearchTool>> = match &keys.search {
        Some(key) => Some(Arc::new(TavilySearch::new(
            &config.search,
            key.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )?)),
        None => None,
    };
    info!(search = search.is_some(), model = %config.model, "agents configured");

    let rounds = config.max_tool_rounds;
    Ok(StageAgents {
        planner: Box::new(
            ChatAgent::new("planner", PLANNER_SYSTEM_PROMPT, backend.clone(), rounds)
                .with_search(search.clone()),
        ),
        observer: Box::new(ChatAgent::new(
            "observer",
            OBSERVER_SYSTEM_PROMPT,
            backend.clone(),
            rounds,
        )),
        interviewer: Box::new(ChatAgent::new(
            "interviewer",
            INTERVIEWER_SYSTEM_PROMPT,
            backend.clone(),
            rounds,
        )),
        manager: Box::new(
            ChatAgent::new("manager", MANAGER_SYSTEM_PROMPT, backend, rounds).with_search(search),
        ),
        prompts: PromptEngine::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedAgent, ScriptedAgents, ScriptedLines, profile};

    fn console(lines: ScriptedLines) -> Console<ScriptedLines, Vec<u8>> {
        Console::new(lines, Vec::new())
    }

    fn session(scripted: &ScriptedAgents, logs_dir: PathBuf) -> Session {
        Session::new(profile(), scripted.stage_agents(), logs_dir)
    }

    #[test]
    fn first_turn_logs_planner_and_observer_thoughts() {
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            observer: ScriptedAgent::new().reply("Частично правильно"),
            interviewer: ScriptedAgent::new().reply("Tell me about Box"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, PathBuf::from("unused"));

        let outcome = session.process_user_input("Hi, I'm Alice").expect("turn");

        assert_eq!(outcome, TurnOutcome::Question("Tell me about Box".to_string()));
        assert_eq!(session.state().last_agent_visible_message, "Tell me about Box");
        let turn = &session.log().turns[0];
        assert_eq!(turn.turn_id, 1);
        assert_eq!(turn.agent_visible_message, "(start of dialogue)");
        assert_eq!(turn.user_message, "Hi, I'm Alice");
        assert_eq!(
            turn.internal_thoughts,
            "[Planner]: plan\n[Observer]: Частично правильно"
        );
    }

    #[test]
    fn second_turn_logs_previous_question() {
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            observer: ScriptedAgent::new().reply("ok").reply("ok"),
            interviewer: ScriptedAgent::new().reply("Q1").reply("Q2"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, PathBuf::from("unused"));
        session.process_user_input("hello").expect("turn 1");
        session.process_user_input("answer").expect("turn 2");

        let turn = &session.log().turns[1];
        assert_eq!(turn.agent_visible_message, "Q1");
        assert_eq!(turn.internal_thoughts, "[Observer]: ok");
        assert_eq!(session.state().turn_count, 2);
    }

    #[test]
    fn rejects_blank_and_post_finish_input() {
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            manager: ScriptedAgent::new().reply("Feedback"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, PathBuf::from("unused"));
        assert!(session.process_user_input("   ").is_err());

        let outcome = session.process_user_input("стоп").expect("turn");
        assert_eq!(outcome, TurnOutcome::Feedback("Feedback".to_string()));
        assert!(session.is_finished());
        assert!(session.process_user_input("more").is_err());
    }

    #[test]
    fn finish_writes_feedback_to_log() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            manager: ScriptedAgent::new().reply("Solid junior"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, temp.path().to_path_buf());
        session.process_user_input("стоп").expect("turn");

        let paths = session.finish().expect("finish");

        assert_eq!(session.log().final_feedback, "Solid junior");
        assert!(paths.log_path.is_file());
        assert!(paths.trace_path.is_file());
    }

    #[test]
    fn build_agents_works_without_search_key() {
        let config = CoachConfig::default();
        let keys = ApiKeys {
            llm: "key".to_string(),
            search: None,
        };
        assert!(build_agents(&config, &keys).is_ok());
    }

    #[test]
    fn interactive_run_completes_and_writes_logs() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            observer: ScriptedAgent::new().reply("правильно"),
            interviewer: ScriptedAgent::new().reply("What is a slice?"),
            manager: ScriptedAgent::new().reply("Well done"),
        };
        let mut session = session(&scripted, temp.path().to_path_buf());
        let mut console = console(ScriptedLines::from_text(
            "Hello\n--stop--\n\n--stop--\nстоп\n--stop--\n",
        ));

        let end = run_interactive(&mut console, &mut session, &InterruptFlag::new())
            .expect("run");

        assert!(matches!(end, SessionEnd::Completed(Some(ref paths)) if paths.log_path.is_file()));
        assert_eq!(session.log().turns.len(), 2);
        assert_eq!(session.log().final_feedback, "Well done");
    }

    #[test]
    fn log_write_failure_is_not_fatal() {
        let temp = tempfile::tempdir().expect("tempdir");
        let not_a_dir = temp.path().join("not_a_dir");
        std::fs::write(&not_a_dir, "").expect("create file");
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            manager: ScriptedAgent::new().reply("Feedback"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, not_a_dir);
        let mut out = Vec::new();
        let mut console = Console::new(ScriptedLines::from_text("стоп\n--stop--\n"), &mut out);

        let end = run_interactive(&mut console, &mut session, &InterruptFlag::new())
            .expect("run");
        drop(console);

        assert_eq!(end, SessionEnd::Completed(None));
        assert!(String::from_utf8(out).expect("utf8").contains("Failed to save logs"));
    }

    #[test]
    fn interactive_run_stops_on_closed_input() {
        let scripted = ScriptedAgents::new();
        let mut session = session(&scripted, PathBuf::from("unused"));
        let end = run_interactive(
            &mut console(ScriptedLines::new()),
            &mut session,
            &InterruptFlag::new(),
        )
        .expect("run");
        assert_eq!(end, SessionEnd::InputClosed);
        assert_eq!(session.state().turn_count, 0);
    }

    #[test]
    fn interrupt_at_prompt_offers_save() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            observer: ScriptedAgent::new().reply("ok"),
            interviewer: ScriptedAgent::new().reply("Q1"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, temp.path().to_path_buf());
        let lines = ScriptedLines::from_text("Hello\n--stop--\nhalf an ans")
            .interrupt()
            .line("y");

        let end = run_interactive(&mut console(lines), &mut session, &InterruptFlag::new())
            .expect("run");

        let SessionEnd::Interrupted(Some(paths)) = end else {
            panic!("expected saved interrupt, got {end:?}");
        };
        let saved: InterviewLog =
            serde_json::from_str(&std::fs::read_to_string(paths.log_path).expect("read"))
                .expect("parse");
        assert_eq!(saved.turns.len(), 1);
        assert_eq!(saved.turns[0].user_message, "Hello");
        assert_eq!(saved.final_feedback, "");
    }

    #[test]
    fn interrupt_during_turn_keeps_submitted_answer() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            observer: ScriptedAgent::new().reply("ok"),
            interviewer: ScriptedAgent::new().reply("Q1"),
            ..ScriptedAgents::default()
        };
        let mut session = session(&scripted, temp.path().to_path_buf());
        let interrupted = InterruptFlag::new();
        interrupted.request();
        let lines = ScriptedLines::from_text("my real answer\n--stop--\ny\n");

        let end = run_interactive(&mut console(lines), &mut session, &interrupted)
            .expect("run");

        assert!(matches!(end, SessionEnd::Interrupted(Some(_))));
        assert!(!interrupted.take());
        assert_eq!(session.log().turns.len(), 1);
        assert_eq!(session.log().turns[0].user_message, "my real answer");
    }

    #[test]
    fn signal_exits_outside_a_turn_and_on_repeat() {
        let flag = InterruptFlag::new();
        assert!(!flag.signal());
        assert!(!flag.take());

        flag.set_in_turn(true);
        assert!(flag.signal());
        assert!(!flag.signal());
        assert!(flag.take());
    }

    #[test]
    fn declined_save_writes_nothing() {
        let temp = tempfile::tempdir().expect("tempdir");
        let scripted = ScriptedAgents::new();
        let mut session = session(&scripted, temp.path().to_path_buf());
        let lines = ScriptedLines::new().interrupt().line("n");

        let end = run_interactive(&mut console(lines), &mut session, &InterruptFlag::new())
            .expect("run");

        assert_eq!(end, SessionEnd::Interrupted(None));
        assert_eq!(session.state().turn_count, 0);
        assert_eq!(std::fs::read_dir(temp.path()).expect("read dir").count(), 0);
    }
}
