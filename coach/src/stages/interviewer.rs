//! Interviewer: produces the next visible question.

use anyhow::Result;
use tracing::{debug, warn};

use crate::core::state::{InterviewState, Role, StateUpdate, ThoughtTag, Turn};
use crate::core::transcript::{find_last, recent_turns};
use crate::io::llm::ChatMessage;
use crate::io::prompt::InterviewerPromptInputs;
use crate::stages::{StageAgents, ask};

/// Conversation entries replayed to the model.
pub const HISTORY_WINDOW: usize = 6;

pub const NO_QUESTION_PLACEHOLDER: &str = "Sorry, I couldn't come up with a question.";
pub const TECHNICAL_ERROR_REPLY: &str =
    "Sorry, a technical error occurred. Please repeat your answer.";

pub fn run(state: &InterviewState, agents: &StageAgents) -> StateUpdate {
    match next_question(state, agents) {
        Ok(Some(text)) => {
            debug!(chars = text.chars().count(), "interviewer reply received");
            reply(text)
        }
        Ok(None) => {
            warn!("interviewer returned no reply");
            reply(NO_QUESTION_PLACEHOLDER.to_string())
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "interviewer failed");
            reply(TECHNICAL_ERROR_REPLY.to_string()).with_failure(format!("{err:#}"))
        }
    }
}

fn reply(text: String) -> StateUpdate {
    StateUpdate {
        messages: vec![Turn::agent(text.clone())],
        current_agent_response: Some(text),
        ..StateUpdate::default()
    }
}

fn next_question(state: &InterviewState, agents: &StageAgents) -> Result<Option<String>> {
    let observer_thought = find_last(&state.internal_thoughts, |t| t.tag == ThoughtTag::Observer)
        .map(ToString::to_string);
    let context = agents.prompts.render_interviewer(&InterviewerPromptInputs {
        profile: &state.candidate_profile,
        plan: &state.interview_plan,
        difficulty: state.difficulty_level,
        observer_thought: observer_thought.as_deref(),
        instructions: &state.observer_instructions,
    })?;

    let mut messages = vec![ChatMessage::user(context)];
    messages.extend(
        recent_turns(&state.messages, HISTORY_WINDOW)
            .iter()
            .map(|turn| match turn.role {
                Role::User => ChatMessage::user(turn.content.clone()),
                Role::Agent => ChatMessage::assistant(turn.content.clone()),
            }),
    );
    ask(agents.interviewer.as_ref(), messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Thought;
    use crate::io::llm::ChatRole;
    use crate::test_support::{ScriptedAgent, ScriptedAgents, observer_thought};

    fn with_interviewer(interviewer: ScriptedAgent) -> ScriptedAgents {
        ScriptedAgents {
            interviewer,
            ..ScriptedAgents::default()
        }
    }

    #[test]
    fn reply_becomes_message_and_response() {
        let scripted = with_interviewer(ScriptedAgent::new().reply("What is Send?"));
        let update = run(&InterviewState::default(), &scripted.stage_agents());

        assert_eq!(update.messages, vec![Turn::agent("What is Send?")]);
        assert_eq!(update.current_agent_response.as_deref(), Some("What is Send?"));
        assert!(update.failure.is_none());
    }

    #[test]
    fn replays_recent_history_with_latest_observer_thought() {
        let scripted = with_interviewer(ScriptedAgent::new().reply("next"));
        let mut state = InterviewState::default();
        state.interview_plan = "plan".to_string();
        for i in 0..4 {
            state.messages.push(Turn::agent(format!("q{i}")));
            state.push_user_input(format!("a{i}"));
        }
        state.internal_thoughts = vec![
            observer_thought("old analysis"),
            Thought::new(ThoughtTag::Planner, "plan thought"),
            observer_thought("new analysis"),
        ];

        run(&state, &scripted.stage_agents());

        let call = &scripted.interviewer.calls()[0];
        assert_eq!(call.len(), 1 + HISTORY_WINDOW);
        assert!(call[0].content.contains("[Observer]: new analysis"));
        assert!(!call[0].content.contains("old analysis"));
        assert_eq!(call[1].role, ChatRole::Assistant);
        assert_eq!(call[1].content, "q1");
        assert_eq!(call[6].role, ChatRole::User);
        assert_eq!(call[6].content, "a3");
    }

    #[test]
    fn empty_reply_uses_placeholder() {
        let scripted = with_interviewer(ScriptedAgent::new().empty());
        let update = run(&InterviewState::default(), &scripted.stage_agents());
        assert_eq!(
            update.current_agent_response.as_deref(),
            Some(NO_QUESTION_PLACEHOLDER)
        );
        assert_eq!(update.messages.len(), 1);
    }

    #[test]
    fn error_asks_to_repeat() {
        let scripted = with_interviewer(ScriptedAgent::new().fail("503"));
        let update = run(&InterviewState::default(), &scripted.stage_agents());
        assert_eq!(
            update.current_agent_response.as_deref(),
            Some(TECHNICAL_ERROR_REPLY)
        );
        assert_eq!(update.messages, vec![Turn::agent(TECHNICAL_ERROR_REPLY)]);
        assert!(update.failure.is_some());
    }
}
