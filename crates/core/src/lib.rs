#![forbid(unsafe_code)]

pub mod dispatch;
pub mod model;

pub use dispatch::{Verdict, evaluate, next_task};
pub use model::{
    Catalog, CatalogError, ChatId, ChoiceToken, ProgressReport, ProgressSnapshot, Task, TaskError,
    TaskId, TokenError, UserId,
};
