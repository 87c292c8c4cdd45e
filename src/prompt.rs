// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Operator decisions.
//!
//! Materialization sometimes needs a human to decide what happens to a file
//! that is already in the way. Those decisions go through the [`Prompter`]
//! trait, so the conflict resolution logic never talks to a terminal
//! directly. [`InquirePrompter`] asks on the terminal. [`ScriptedPrompter`]
//! answers from a fixed script.

use inquire::{Confirm, Select};
use std::collections::VecDeque;
use tracing::{debug, instrument};

/// Source of operator decisions.
pub trait Prompter {
    /// Ask a yes or no question.
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool>;

    /// Ask operator to pick one of the options, returning its index.
    fn select(&mut self, message: &str, options: &[&str]) -> Result<usize>;
}

/// Prompt operator on the terminal through inquire.
#[derive(Debug, Default, Clone)]
pub struct InquirePrompter;

impl InquirePrompter {
    /// Construct new terminal prompter.
    pub fn new() -> Self {
        Self
    }
}

impl Prompter for InquirePrompter {
    #[instrument(skip(self), level = "debug")]
    fn confirm(&mut self, message: &str, default: bool) -> Result<bool> {
        Ok(Confirm::new(message).with_default(default).prompt()?)
    }

    #[instrument(skip(self), level = "debug")]
    fn select(&mut self, message: &str, options: &[&str]) -> Result<usize> {
        let choice = Select::new(message, options.to_vec()).raw_prompt()?;
        debug!("operator picked {:?}", choice.value);
        Ok(choice.index)
    }
}

/// Canned answer for a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Answer to [`Prompter::confirm`].
    Confirm(bool),

    /// Answer to [`Prompter::select`], given by option label.
    Select(String),
}

/// Prompter that replays a fixed script of answers.
///
/// Every question asked is recorded, so callers can check both what was
/// asked and how often.
#[derive(Debug, Default, Clone)]
pub struct ScriptedPrompter {
    answers: VecDeque<Answer>,
    asked: Vec<String>,
}

impl ScriptedPrompter {
    /// Construct new scripted prompter.
    pub fn new(answers: impl IntoIterator<Item = Answer>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            asked: Vec::new(),
        }
    }

    /// Construct scripted prompter that only answers selections.
    pub fn selecting(labels: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(labels.into_iter().map(|label| Answer::Select(label.into())))
    }

    /// Questions asked so far, in order.
    pub fn asked(&self) -> &[String] {
        self.asked.as_slice()
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next_answer(&mut self, message: &str) -> Result<Answer> {
        self.asked.push(message.to_string());
        self.answers.pop_front().ok_or_else(|| PromptError::ScriptExhausted {
            message: message.to_string(),
        })
    }
}

impl Prompter for ScriptedPrompter {
    fn confirm(&mut self, message: &str, _default: bool) -> Result<bool> {
        match self.next_answer(message)? {
            Answer::Confirm(answer) => Ok(answer),
            answer => Err(PromptError::ScriptMismatch {
                message: message.to_string(),
                answer,
            }),
        }
    }

    fn select(&mut self, message: &str, options: &[&str]) -> Result<usize> {
        match self.next_answer(message)? {
            Answer::Select(label) => options
                .iter()
                .position(|option| *option == label)
                .ok_or(PromptError::UnknownOption { label }),
            answer => Err(PromptError::ScriptMismatch {
                message: message.to_string(),
                answer,
            }),
        }
    }
}

/// Operator decision error types.
#[derive(Debug, thiserror::Error)]
pub enum PromptError {
    /// Terminal prompt fails or is cancelled.
    #[error(transparent)]
    Inquire(#[from] inquire::InquireError),

    /// Script ran out of answers.
    #[error("no scripted answer left for {message:?}")]
    ScriptExhausted { message: String },

    /// Scripted answer has the wrong shape for the question.
    #[error("scripted answer {answer:?} does not fit {message:?}")]
    ScriptMismatch { message: String, answer: Answer },

    /// Scripted selection names an option that was not offered.
    #[error("scripted answer {label:?} is not an offered option")]
    UnknownOption { label: String },
}

/// Friendly result alias :3
pub type Result<T, E = PromptError> = std::result::Result<T, E>;
