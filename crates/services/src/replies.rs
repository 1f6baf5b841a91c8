//! User-facing texts.

use quiz_core::model::{ProgressReport, Task};

pub const WELCOME: &str = "Welcome to the Go quiz bot! 🚀

Commands:
/task - get the next task
/progress - show your progress";

pub const UNKNOWN_COMMAND: &str = "Unknown command 🤷";

pub const ALL_TASKS_SOLVED: &str = "Congratulations! You have solved every task 🎉";

pub const LAST_TASK_SOLVED: &str = "🎉 You have solved all available tasks!";

pub const CORRECT: &str = "Correct! ✅";

pub const INCORRECT: &str = "Incorrect ❌ Try again!";

pub const CORRECT_NOT_SAVED: &str = "Correct, but your progress could not be saved. Please try again.";

pub const TASK_UNAVAILABLE: &str = "Could not load your next task right now 😕";

pub const PROGRESS_UNAVAILABLE: &str = "Could not load your progress right now 😕";

#[must_use]
pub fn task_prompt(task: &Task) -> String {
    format!("{}\n\nChoose the correct answer:", task.prompt())
}

#[must_use]
pub fn progress(report: &ProgressReport) -> String {
    format!(
        "Your progress: 📊\n\nSolved tasks: {}/{}\nProgress: {:.1}%",
        report.solved,
        report.total,
        report.percentage()
    )
}
