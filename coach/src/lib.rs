//! Multi-agent technical interview coach.
//!
//! A fixed pipeline of LLM-backed stages runs once per candidate answer:
//! a Planner drafts the interview plan on the first turn, an Observer grades
//! every answer and steers difficulty, and then either the Interviewer asks
//! the next question or the Manager writes the final feedback.
//!
//! - **[`core`]**: Pure, deterministic logic (state merge, routing, grading
//!   heuristics). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (HTTP clients, console, config,
//!   log files). Isolated behind traits to enable fakes in tests.
//!
//! [`stages`] and [`graph`] combine the two into one orchestrator pass;
//! [`session`] drives passes across a whole interview.

pub mod core;
pub mod graph;
pub mod io;
pub mod logging;
pub mod session;
pub mod stages;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
