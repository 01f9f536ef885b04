//! ui::prompts
//!
//! Yes/no confirmation as an injectable capability.
//!
//! # Design
//!
//! The engine never talks to a terminal. It asks a [`Confirm`] and gets a
//! boolean back. The CLI hands it a [`TerminalConfirm`], [`AlwaysYes`] for
//! `--yes`, or [`NonInteractive`] when prompting is configured off. Tests
//! pass a fixed policy or a closure.

use std::io::IsTerminal;

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("confirmation required but stdin is not a terminal (pass --yes to proceed)")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Something that can answer a yes/no question.
pub trait Confirm {
    /// Ask `prompt`; `default` is the answer on a bare Enter.
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError>;
}

/// Answers every question with yes.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysYes;

impl Confirm for AlwaysYes {
    fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool, PromptError> {
        tracing::debug!(prompt, "auto-confirmed");
        Ok(true)
    }
}

/// Answers every question with no.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysNo;

impl Confirm for AlwaysNo {
    fn confirm(&mut self, prompt: &str, _default: bool) -> Result<bool, PromptError> {
        tracing::debug!(prompt, "auto-declined");
        Ok(false)
    }
}

impl<F> Confirm for F
where
    F: FnMut(&str, bool) -> bool,
{
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        Ok(self(prompt, default))
    }
}

/// Refuses to ask: every question is an error.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl Confirm for NonInteractive {
    fn confirm(&mut self, _prompt: &str, _default: bool) -> Result<bool, PromptError> {
        Err(PromptError::NotInteractive)
    }
}

/// Asks on the terminal with `dialoguer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&mut self, prompt: &str, default: bool) -> Result<bool, PromptError> {
        if !std::io::stdin().is_terminal() {
            return Err(PromptError::NotInteractive);
        }
        dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(|e| PromptError::IoError(e.to_string()))
    }
}
