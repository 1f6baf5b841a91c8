use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::ids::TaskId;

const SEPARATOR: char = ':';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TokenError {
    #[error("choice token {0:?} has no separator")]
    MissingSeparator(String),

    #[error("choice token {0:?} does not start with a task id")]
    InvalidTaskId(String),
}

/// Correlation data attached to a choice button: `<task id>:<choice>`.
///
/// Only the first separator splits, so the choice itself may contain `:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceToken {
    pub task_id: TaskId,
    pub choice: String,
}

impl ChoiceToken {
    #[must_use]
    pub fn new(task_id: TaskId, choice: impl Into<String>) -> Self {
        Self {
            task_id,
            choice: choice.into(),
        }
    }
}

impl fmt::Display for ChoiceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{SEPARATOR}{}", self.task_id, self.choice)
    }
}

impl FromStr for ChoiceToken {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, choice) = s
            .split_once(SEPARATOR)
            .ok_or_else(|| TokenError::MissingSeparator(s.to_string()))?;
        let task_id = id
            .parse::<TaskId>()
            .map_err(|_| TokenError::InvalidTaskId(s.to_string()))?;
        Ok(Self::new(task_id, choice))
    }
}
