use std::collections::HashMap;

use thiserror::Error;

use crate::model::ids::TaskId;
use crate::model::task::{Task, TaskError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("catalog must contain at least one task")]
    Empty,

    #[error("task id {0} appears more than once")]
    DuplicateId(TaskId),

    #[error(transparent)]
    Task(#[from] TaskError),
}

/// Fixed, ordered curriculum of tasks.
///
/// Authoring order is the dispatch order. The id index is built once here
/// so lookups never rescan the list.
#[derive(Debug, Clone)]
pub struct Catalog {
    tasks: Vec<Task>,
    index: HashMap<TaskId, usize>,
}

impl Catalog {
    /// Builds a catalog from tasks in curriculum order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Empty` for an empty list and
    /// `CatalogError::DuplicateId` if two tasks share an id.
    pub fn new(tasks: Vec<Task>) -> Result<Self, CatalogError> {
        if tasks.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut index = HashMap::with_capacity(tasks.len());
        for (pos, task) in tasks.iter().enumerate() {
            if index.insert(task.id(), pos).is_some() {
                return Err(CatalogError::DuplicateId(task.id()));
            }
        }

        Ok(Self { tasks, index })
    }

    /// The "Go basics" curriculum shipped with the bot.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the built-in tasks violate authoring rules.
    pub fn builtin() -> Result<Self, CatalogError> {
        let tasks = vec![
            Task::new(
                TaskId::new(1),
                "Which keyword declares a variable in Go?",
                "var",
                ["let", "const", "var", "define"],
            )?,
            Task::new(
                TaskId::new(2),
                "Which data type holds integers in Go?",
                "int",
                ["integer", "float", "int", "number"],
            )?,
            Task::new(
                TaskId::new(3),
                "Which data type holds strings in Go?",
                "string",
                ["char", "string", "text", "varchar"],
            )?,
            Task::new(
                TaskId::new(4),
                "Which keyword imports packages in Go?",
                "import",
                ["include", "import", "use", "require"],
            )?,
            Task::new(
                TaskId::new(5),
                "What does fmt.Println(1+1) print in Go?",
                "2",
                ["1", "2", "3", "Error"],
            )?,
        ];
        Self::new(tasks)
    }

    #[must_use]
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.index.get(&id).map(|&pos| &self.tasks[pos])
    }

    #[must_use]
    pub fn contains(&self, id: TaskId) -> bool {
        self.index.contains_key(&id)
    }

    /// Tasks in curriculum order.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
