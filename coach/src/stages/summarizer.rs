//! Collapses observer analyses into text that fits the manager's context.

use tracing::{debug, warn};

use crate::io::llm::{Agent, ChatMessage};
use crate::io::prompt::PromptEngine;
use crate::stages::ask;

/// Joined analyses shorter than this are passed through untouched.
pub const SUMMARY_THRESHOLD_CHARS: usize = 3000;
/// Summaries shorter than this are treated as failed.
pub const MIN_SUMMARY_CHARS: usize = 100;
/// Entries kept when summarization fails.
pub const FALLBACK_ENTRIES: usize = 3;

pub const NO_ANALYSIS: &str = "The observer provided no analysis.";

const SUMMARIZE_INSTRUCTION: &str =
    "Summarize the observer's analysis, keeping all important information.";

/// Summarize `entries`. Never fails; falls back to the last few raw entries.
pub fn summarize(entries: &[String], agent: &dyn Agent, prompts: &PromptEngine) -> String {
    if entries.is_empty() {
        return NO_ANALYSIS.to_string();
    }

    let joined = entries.join("\n");
    let chars = joined.chars().count();
    if chars < SUMMARY_THRESHOLD_CHARS {
        return joined;
    }

    debug!(chars, entries = entries.len(), "summarizing observer analysis");
    let summary = prompts.render_summarizer(&joined).and_then(|prompt| {
        ask(
            agent,
            vec![
                ChatMessage::user(prompt),
                ChatMessage::user(SUMMARIZE_INSTRUCTION),
            ],
        )
    });

    match summary {
        Ok(Some(text)) if text.chars().count() >= MIN_SUMMARY_CHARS => {
            debug!(chars = text.chars().count(), "summary created");
            text
        }
        Ok(_) => {
            warn!("summary missing or too short; keeping last entries");
            fallback(entries)
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "summarization failed; keeping last entries");
            fallback(entries)
        }
    }
}

fn fallback(entries: &[String]) -> String {
    let start = entries.len().saturating_sub(FALLBACK_ENTRIES);
    entries[start..].join("\n")
}
