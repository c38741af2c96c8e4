//! Fixed-topology orchestrator for one user turn.
//!
//! ```text
//! [Planner?] -> Observer -> Interviewer | Manager
//! ```
//!
//! Planner runs only while no plan exists. Each stage's update is merged
//! into the state before the next routing decision, and every stage run is
//! bracketed by `start`/`end` trace events.

use std::time::Instant;

use tracing::debug;

use crate::core::router::{Stage, route_after_observer, route_before_observer};
use crate::core::state::InterviewState;
use crate::io::interview_log::{TraceEvent, TraceLog};
use crate::stages::StageAgents;

/// Run one orchestrator pass and return the stages in execution order.
pub fn run_turn(
    state: &mut InterviewState,
    agents: &StageAgents,
    trace: &mut TraceLog,
) -> Vec<Stage> {
    let mut executed = Vec::with_capacity(3);

    if route_before_observer(state) == Stage::Planner {
        run_traced(Stage::Planner, state, agents, trace);
        executed.push(Stage::Planner);
    }

    run_traced(Stage::Observer, state, agents, trace);
    executed.push(Stage::Observer);

    let last = route_after_observer(state);
    run_traced(last, state, agents, trace);
    executed.push(last);

    debug!(stages = ?executed, finished = state.is_finished, "turn complete");
    executed
}

fn run_traced(stage: Stage, state: &mut InterviewState, agents: &StageAgents, trace: &mut TraceLog) {
    let turn = state.turn_count;
    trace.record(TraceEvent::start(
        stage,
        turn,
        state.messages.len(),
        state.internal_thoughts.len(),
    ));
    let started = Instant::now();

    let update = stage.run(state, agents);

    let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    if let Some(failure) = &update.failure {
        trace.record(TraceEvent::error(stage, turn, duration_ms, failure));
    }
    trace.record(TraceEvent::end(stage, turn, duration_ms, &update));

    *state = std::mem::take(state).merge(update);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::interview_log::TracePhase;
    use crate::test_support::{ScriptedAgent, ScriptedAgents};

    #[test]
    fn first_turn_plans_then_observes_then_asks() {
        let scripted = ScriptedAgents {
            planner: ScriptedAgent::new().reply("plan"),
            observer: ScriptedAgent::new().reply("правильно"),
            interviewer: ScriptedAgent::new().reply("First question"),
            ..ScriptedAgents::default()
        };
        let mut state = InterviewState::default();
        state.push_user_input("Hello");
        let mut trace = TraceLog::new();

        let stages = run_turn(&mut state, &scripted.stage_agents(), &mut trace);

        assert_eq!(stages, vec![Stage::Planner, Stage::Observer, Stage::Interviewer]);
        assert_eq!(state.interview_plan, "plan");
        assert_eq!(state.current_agent_response, "First question");

        let phases: Vec<(Stage, TracePhase)> =
            trace.events().iter().map(|e| (e.stage, e.phase)).collect();
        assert_eq!(
            phases,
            vec![
                (Stage::Planner, TracePhase::Start),
                (Stage::Planner, TracePhase::End),
                (Stage::Observer, TracePhase::Start),
                (Stage::Observer, TracePhase::End),
                (Stage::Interviewer, TracePhase::Start),
                (Stage::Interviewer, TracePhase::End),
            ]
        );
    }

    #[test]
    fn failures_are_traced_between_start_and_end() {
        let scripted = ScriptedAgents {
            observer: ScriptedAgent::new().fail("network down"),
            interviewer: ScriptedAgent::new().reply("q"),
            ..ScriptedAgents::default()
        };
        let mut state = crate::test_support::answered_state("q0", "a0");
        let mut trace = TraceLog::new();

        run_turn(&mut state, &scripted.stage_agents(), &mut trace);

        let observer: Vec<&TraceEvent> = trace
            .events()
            .iter()
            .filter(|e| e.stage == Stage::Observer)
            .collect();
        assert_eq!(observer.len(), 3);
        assert_eq!(observer[1].phase, TracePhase::Error);
        assert_eq!(observer[1].error.as_deref(), Some("network down"));
        assert_eq!(observer[2].phase, TracePhase::End);
    }

    #[test]
    fn finished_state_routes_to_manager() {
        let scripted = ScriptedAgents {
            observer: ScriptedAgent::new().reply("finished"),
            manager: ScriptedAgent::new().reply("Feedback"),
            ..ScriptedAgents::default()
        };
        let mut state = crate::test_support::answered_state("q", "a");
        let mut trace = TraceLog::new();

        let stages = run_turn(&mut state, &scripted.stage_agents(), &mut trace);

        assert_eq!(stages, vec![Stage::Observer, Stage::Manager]);
        assert!(state.is_finished);
        assert_eq!(state.current_agent_response, "Feedback");
    }
}
