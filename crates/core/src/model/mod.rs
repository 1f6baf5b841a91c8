mod catalog;
mod ids;
mod progress;
mod task;
mod token;

pub use ids::{ChatId, ParseIdError, TaskId, UserId};

pub use catalog::{Catalog, CatalogError};
pub use progress::{ProgressReport, ProgressSnapshot};
pub use task::{Task, TaskError};
pub use token::{ChoiceToken, TokenError};
