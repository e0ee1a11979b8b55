use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::models::ChatMessageEntity;
use crate::dto::{format_epoch_ms, now_epoch_ms};

/// Discrete event carried on a chat room stream.
///
/// Serialized as one SSE `data:` line per event; `type` discriminates on the
/// wire.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChatStreamEvent {
    /// Sent once when the connection opens, so the client can distinguish a
    /// slow first poll from a failed connection.
    Connected {
        /// Server wall-clock time in epoch milliseconds.
        timestamp: i64,
    },
    /// One newly visible chat row.
    Message {
        /// The row payload.
        data: ChatMessagePayload,
    },
    /// Keep-alive emitted during inactivity.
    Heartbeat {
        /// Server wall-clock time in epoch milliseconds.
        timestamp: i64,
    },
    /// A recoverable (or, at open time, fatal) stream error.
    Error {
        /// Human-readable description.
        message: String,
    },
}

impl ChatStreamEvent {
    /// Handshake event stamped with the current time.
    pub fn connected() -> Self {
        Self::Connected {
            timestamp: now_epoch_ms(),
        }
    }

    /// Heartbeat event stamped with the current time.
    pub fn heartbeat() -> Self {
        Self::Heartbeat {
            timestamp: now_epoch_ms(),
        }
    }

    /// Error event with the given message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Chat row as delivered to stream subscribers.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessagePayload {
    /// Row identifier.
    pub id: String,
    /// Message body.
    pub content: String,
    /// Insertion time, RFC 3339.
    pub created_at: String,
    /// Sender identity.
    pub sender: ChatSenderPayload,
}

/// Sender block embedded in each message event.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatSenderPayload {
    /// Account identifier.
    pub id: String,
    /// Display name.
    pub nickname: String,
    /// Avatar URL; explicitly `null` when unset.
    pub avatar_url: Option<String>,
    /// Gamification level.
    pub level: u32,
}

impl From<ChatMessageEntity> for ChatStreamEvent {
    fn from(row: ChatMessageEntity) -> Self {
        Self::Message {
            data: ChatMessagePayload {
                id: row.id,
                content: row.content,
                created_at: format_epoch_ms(row.created_at_ms),
                sender: ChatSenderPayload {
                    id: row.sender.id,
                    nickname: row.sender.nickname,
                    avatar_url: row.sender.avatar_url,
                    level: row.sender.level,
                },
            },
        }
    }
}
