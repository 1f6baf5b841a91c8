//! Newline-delimited JSON frames exchanged over stdio.

use quiz_core::model::{ChatId, UserId};
use serde::{Deserialize, Serialize};
use services::{ChoiceButton, InboundEvent};

/// One line read from stdin.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Command {
        chat_id: ChatId,
        user_id: UserId,
        name: String,
    },
    Choice {
        callback_id: String,
        chat_id: ChatId,
        user_id: UserId,
        data: String,
    },
}

impl From<InboundFrame> for InboundEvent {
    fn from(frame: InboundFrame) -> Self {
        match frame {
            InboundFrame::Command {
                chat_id,
                user_id,
                name,
            } => InboundEvent::Command {
                chat: chat_id,
                user: user_id,
                name,
            },
            InboundFrame::Choice {
                callback_id,
                chat_id,
                user_id,
                data,
            } => InboundEvent::ChoiceSelected {
                callback_id,
                chat: chat_id,
                user: user_id,
                token: data,
            },
        }
    }
}

/// One line written to stdout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Text {
        chat_id: ChatId,
        text: String,
    },
    Choices {
        chat_id: ChatId,
        text: String,
        buttons: Vec<ButtonFrame>,
    },
    CallbackAnswer {
        callback_id: String,
        text: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ButtonFrame {
    pub label: String,
    pub data: String,
}

impl From<ChoiceButton> for ButtonFrame {
    fn from(button: ChoiceButton) -> Self {
        Self {
            label: button.label,
            data: button.data,
        }
    }
}
