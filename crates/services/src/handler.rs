use std::sync::Arc;

use quiz_core::dispatch::{Verdict, evaluate, next_task};
use quiz_core::model::{Catalog, ChatId, ChoiceToken, ProgressReport, Task, UserId};
use tracing::{debug, info, instrument, warn};

use crate::coordinator::ProgressCoordinator;
use crate::error::{InteractionError, TransportError};
use crate::replies;
use crate::transport::{ChoiceButton, InboundEvent, Transport};

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

/// Commands understood by the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Task,
    Progress,
    Unknown,
}

impl Command {
    /// Parses `task`, `/task` or `/task@somebot`.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let name = raw.trim().trim_start_matches('/');
        let name = name.split_once('@').map_or(name, |(name, _bot)| name);
        match name {
            "start" => Self::Start,
            "task" => Self::Task,
            "progress" => Self::Progress,
            _ => Self::Unknown,
        }
    }
}

//
// ─── HANDLER ───────────────────────────────────────────────────────────────────
//

/// Turns inbound chat intents into progress reads/writes and replies.
///
/// Every failure stops here: store and transport errors are logged and become
/// a friendly message (or nothing), never a panic or a propagated error.
#[derive(Clone)]
pub struct SessionHandler {
    catalog: Arc<Catalog>,
    progress: Arc<ProgressCoordinator>,
    transport: Arc<dyn Transport>,
}

impl SessionHandler {
    #[must_use]
    pub fn new(
        catalog: Arc<Catalog>,
        progress: Arc<ProgressCoordinator>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            catalog,
            progress,
            transport,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Handle one inbound event to completion.
    #[instrument(skip_all, fields(user = %event.user()))]
    pub async fn handle(&self, event: InboundEvent) {
        match event {
            InboundEvent::Command { chat, user, name } => {
                self.on_command(chat, user, &name).await;
            }
            InboundEvent::ChoiceSelected {
                callback_id,
                chat,
                user,
                token,
            } => {
                self.on_choice(&callback_id, chat, user, &token).await;
            }
        }
    }

    async fn on_command(&self, chat: ChatId, user: UserId, name: &str) {
        let command = Command::parse(name);
        debug!(?command, raw = name, "command received");
        match command {
            Command::Start => self.say(chat, replies::WELCOME).await,
            Command::Task => self.present_next(chat, user, replies::ALL_TASKS_SOLVED).await,
            Command::Progress => self.report_progress(chat, user).await,
            Command::Unknown => self.say(chat, replies::UNKNOWN_COMMAND).await,
        }
    }

    async fn on_choice(&self, callback_id: &str, chat: ChatId, user: UserId, token: &str) {
        let (task, choice) = match self.resolve(token) {
            Ok(found) => found,
            Err(err) => {
                warn!(token, error = %err, "dropping choice selection");
                return;
            }
        };

        match evaluate(task, &choice) {
            Verdict::Incorrect => {
                debug!(task = %task.id(), "incorrect answer");
                self.acknowledge(callback_id, replies::INCORRECT).await;
            }
            Verdict::Correct => {
                if let Err(e) = self.progress.record_solved(user, task.id()).await {
                    debug!(task = %task.id(), error = %e, "solved task not recorded");
                    self.acknowledge(callback_id, replies::CORRECT_NOT_SAVED).await;
                    return;
                }
                info!(task = %task.id(), "task solved");
                self.acknowledge(callback_id, replies::CORRECT).await;
                self.present_next(chat, user, replies::LAST_TASK_SOLVED).await;
            }
        }
    }

    fn resolve(&self, token: &str) -> Result<(&Task, String), InteractionError> {
        let ChoiceToken { task_id, choice } = token.parse::<ChoiceToken>()?;
        let task = self
            .catalog
            .get(task_id)
            .ok_or(InteractionError::UnknownTask(task_id))?;
        Ok((task, choice))
    }

    async fn present_next(&self, chat: ChatId, user: UserId, when_done: &str) {
        let snapshot = match self.progress.get_progress(user).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(error = %e, "next task unavailable");
                self.say(chat, replies::TASK_UNAVAILABLE).await;
                return;
            }
        };

        let Some(task) = next_task(&self.catalog, &snapshot) else {
            self.say(chat, when_done).await;
            return;
        };

        let buttons: Vec<ChoiceButton> = task
            .choices()
            .iter()
            .map(|choice| ChoiceButton {
                label: choice.clone(),
                data: ChoiceToken::new(task.id(), choice.as_str()).to_string(),
            })
            .collect();
        let result = self
            .transport
            .send_choices(chat, &replies::task_prompt(task), buttons)
            .await;
        log_delivery("task", result);
    }

    async fn report_progress(&self, chat: ChatId, user: UserId) {
        let text = match self.progress.get_progress(user).await {
            Ok(snapshot) => replies::progress(&ProgressReport::compute(&self.catalog, &snapshot)),
            Err(e) => {
                debug!(error = %e, "progress report unavailable");
                replies::PROGRESS_UNAVAILABLE.to_string()
            }
        };
        self.say(chat, &text).await;
    }

    async fn say(&self, chat: ChatId, text: &str) {
        log_delivery("text", self.transport.send_text(chat, text).await);
    }

    async fn acknowledge(&self, callback_id: &str, text: &str) {
        log_delivery(
            "choice answer",
            self.transport.answer_choice(callback_id, text).await,
        );
    }
}

fn log_delivery(kind: &str, result: Result<(), TransportError>) {
    if let Err(err) = result {
        warn!(kind, error = %err, "failed to deliver reply");
    }
}
