use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::TaskId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TaskError {
    #[error("task {0} has an empty prompt")]
    EmptyPrompt(TaskId),

    #[error("task {0} has no choices")]
    NoChoices(TaskId),

    #[error("task {id} lists choice {choice:?} more than once")]
    DuplicateChoice { id: TaskId, choice: String },

    #[error("task {0} does not offer its correct answer as a choice")]
    AnswerNotOffered(TaskId),
}

//
// ─── TASK ──────────────────────────────────────────────────────────────────────
//

/// A single multiple-choice quiz question.
///
/// Immutable once built. The correct answer is guaranteed to appear exactly
/// once among the presented choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    prompt: String,
    answer: String,
    choices: Vec<String>,
}

impl Task {
    /// Builds a task, validating the authoring rules.
    ///
    /// # Errors
    ///
    /// Returns `TaskError` if the prompt is blank, there are no choices, a
    /// choice is repeated, or the answer is not among the choices.
    pub fn new(
        id: TaskId,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        choices: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, TaskError> {
        let prompt = prompt.into();
        let answer = answer.into();
        let choices: Vec<String> = choices.into_iter().map(Into::into).collect();

        if prompt.trim().is_empty() {
            return Err(TaskError::EmptyPrompt(id));
        }
        if choices.is_empty() {
            return Err(TaskError::NoChoices(id));
        }

        let mut seen = HashSet::with_capacity(choices.len());
        for choice in &choices {
            if !seen.insert(choice.as_str()) {
                return Err(TaskError::DuplicateChoice {
                    id,
                    choice: choice.clone(),
                });
            }
        }
        if !seen.contains(answer.as_str()) {
            return Err(TaskError::AnswerNotOffered(id));
        }

        Ok(Self {
            id,
            prompt,
            answer,
            choices,
        })
    }

    #[must_use]
    pub fn id(&self) -> TaskId {
        self.id
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    /// Choices in presentation order.
    #[must_use]
    pub fn choices(&self) -> &[String] {
        &self.choices
    }
}
