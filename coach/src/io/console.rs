//! Line-oriented console used by the interactive session.
//!
//! Lines come from a [`LineReader`]; in production that is a `rustyline`
//! editor, so Ctrl+C at a prompt arrives as [`Input::Interrupted`] instead
//! of a signal.

use std::io::Write;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::core::state::CandidateProfile;

/// Line that terminates a multi-line answer.
pub const END_OF_ANSWER: &str = "--stop--";

const SEPARATOR_WIDTH: usize = 60;

/// Result of one read from the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Ctrl+C at the prompt.
    Interrupted,
    /// End of input (Ctrl+D or closed stdin).
    Closed,
}

/// Source of user lines. The prompt is written by [`Console`] beforehand.
pub trait LineReader {
    fn read_line(&mut self) -> Result<Input>;
}

impl LineReader for DefaultEditor {
    fn read_line(&mut self) -> Result<Input> {
        match self.readline("") {
            Ok(line) => Ok(Input::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(Input::Interrupted),
            Err(ReadlineError::Eof) => Ok(Input::Closed),
            Err(err) => Err(err).context("read console line"),
        }
    }
}

/// Console over a line reader and a writer; rustyline and stdout in production.
pub struct Console<L, W> {
    input: L,
    output: W,
}

impl<L: LineReader, W: Write> Console<L, W> {
    pub fn new(input: L, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> Result<Input> {
        Ok(match self.input.read_line()? {
            Input::Line(mut line) => {
                let trimmed_len = line.trim_end_matches(['\n', '\r']).len();
                line.truncate(trimmed_len);
                Input::Line(line)
            }
            other => other,
        })
    }

    /// Ask for a value; blank input (or end of input) keeps `default`.
    ///
    /// `None` when the user interrupted.
    pub fn prompt_with_default(&mut self, label: &str, default: &str) -> Result<Option<String>> {
        write!(self.output, "{label} [{default}]: ")?;
        self.output.flush()?;
        let value = match self.read_line()? {
            Input::Interrupted => return Ok(None),
            Input::Closed => String::new(),
            Input::Line(line) => line,
        };
        let value = value.trim();
        Ok(Some(if value.is_empty() {
            default.to_string()
        } else {
            value.to_string()
        }))
    }

    /// `None` when the user interrupted before the profile was complete.
    pub fn read_profile(&mut self) -> Result<Option<CandidateProfile>> {
        let defaults = CandidateProfile::default();
        writeln!(
            self.output,
            "\nCandidate profile (press Enter to keep the default):\n"
        )?;
        let Some(name) = self.prompt_with_default("Name", &defaults.name)? else {
            return Ok(None);
        };
        let Some(role) = self.prompt_with_default("Role", &defaults.role)? else {
            return Ok(None);
        };
        let Some(grade) = self.prompt_with_default("Grade", &defaults.grade)? else {
            return Ok(None);
        };
        let Some(experience) =
            self.prompt_with_default("Experience (short)", &defaults.experience)?
        else {
            return Ok(None);
        };
        Ok(Some(CandidateProfile {
            name,
            role,
            grade,
            experience,
        }))
    }

    /// Read a multi-line answer ending at [`END_OF_ANSWER`] or end of input.
    ///
    /// [`Input::Closed`] only when input ended before any line was read.
    /// An interrupt discards the partial answer.
    pub fn read_answer(&mut self) -> Result<Input> {
        writeln!(
            self.output,
            "Enter your answer (finish with a '{END_OF_ANSWER}' line)\nYou: "
        )?;
        self.output.flush()?;

        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                Input::Line(line) if line.trim() == END_OF_ANSWER => break,
                Input::Line(line) => lines.push(line),
                Input::Interrupted => return Ok(Input::Interrupted),
                Input::Closed if lines.is_empty() => return Ok(Input::Closed),
                Input::Closed => break,
            }
        }
        Ok(Input::Line(lines.join("\n")))
    }

    /// Ask a yes/no question; only `y` (any case) counts as yes.
    pub fn confirm(&mut self, question: &str) -> Result<bool> {
        write!(self.output, "{question} (y/n): ")?;
        self.output.flush()?;
        Ok(match self.read_line()? {
            Input::Line(answer) => answer.trim().eq_ignore_ascii_case("y"),
            Input::Interrupted | Input::Closed => false,
        })
    }

    pub fn header(&mut self) -> Result<()> {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        writeln!(self.output, "{separator}\nInterview Coach\n{separator}")?;
        Ok(())
    }

    pub fn system(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "[System] {message}")?;
        Ok(())
    }

    pub fn error(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "\n[Error] {message}")?;
        Ok(())
    }

    pub fn interviewer(&mut self, message: &str) -> Result<()> {
        writeln!(self.output, "\nInterviewer: {message}\n")?;
        Ok(())
    }

    pub fn feedback(&mut self, feedback: &str) -> Result<()> {
        let separator = "=".repeat(SEPARATOR_WIDTH);
        writeln!(
            self.output,
            "\n{separator}\nFINAL FEEDBACK\n{separator}\n\n{feedback}\n\n{separator}\n"
        )?;
        Ok(())
    }
}
