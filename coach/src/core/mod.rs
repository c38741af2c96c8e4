//! Deterministic, pure interview logic.
//!
//! Core modules are free of I/O side effects. They operate on in-memory
//! state and return deterministic outputs suitable for tests.

pub mod difficulty;
pub mod keywords;
pub mod router;
pub mod state;
pub mod text;
pub mod transcript;
