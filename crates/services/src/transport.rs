use async_trait::async_trait;

use quiz_core::model::{ChatId, UserId};

use crate::error::TransportError;

/// An intent received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// A slash-style command such as `task`.
    Command {
        chat: ChatId,
        user: UserId,
        name: String,
    },
    /// A tap on one of the buttons sent with a task.
    ChoiceSelected {
        callback_id: String,
        chat: ChatId,
        user: UserId,
        token: String,
    },
}

impl InboundEvent {
    #[must_use]
    pub fn user(&self) -> UserId {
        match self {
            Self::Command { user, .. } | Self::ChoiceSelected { user, .. } => *user,
        }
    }
}

/// A labelled button; `data` comes back verbatim as the selection token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceButton {
    pub label: String,
    pub data: String,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a plain text message.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the message could not be handed off.
    async fn send_text(&self, chat: ChatId, text: &str) -> Result<(), TransportError>;

    /// Send a message with one button per choice.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the message could not be handed off.
    async fn send_choices(
        &self,
        chat: ChatId,
        text: &str,
        buttons: Vec<ChoiceButton>,
    ) -> Result<(), TransportError>;

    /// Acknowledge a choice selection with short feedback.
    ///
    /// # Errors
    ///
    /// Returns `TransportError` if the acknowledgement could not be handed off.
    async fn answer_choice(&self, callback_id: &str, text: &str) -> Result<(), TransportError>;
}
