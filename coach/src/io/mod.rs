//! Side-effecting helpers: config, console, LLM and search clients, logs.

pub mod config;
pub mod console;
pub mod interview_log;
pub mod llm;
pub mod prompt;
pub mod search;
