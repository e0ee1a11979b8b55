use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::models::{ChatMessageEntity, ChatSenderEntity, TableStateEntity};

/// Chat row as stored in the `chat_messages` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoChatMessageDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub room_id: String,
    pub content: String,
    /// Epoch milliseconds. The collection is append-only so this never changes.
    pub created_at: i64,
    pub sender: MongoChatSenderDocument,
}

/// Denormalized sender profile embedded in each chat row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoChatSenderDocument {
    pub id: String,
    pub nickname: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub level: u32,
}

impl From<MongoChatMessageDocument> for ChatMessageEntity {
    fn from(value: MongoChatMessageDocument) -> Self {
        Self {
            id: value.id,
            room_id: value.room_id,
            content: value.content,
            created_at_ms: value.created_at,
            sender: ChatSenderEntity {
                id: value.sender.id,
                nickname: value.sender.nickname,
                avatar_url: value.sender.avatar_url,
                level: value.sender.level,
            },
        }
    }
}

/// Table snapshot as stored in the `table_states` collection.
///
/// The snapshot body is opaque to this layer; it deserializes straight into
/// JSON and is forwarded untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoTableStateDocument {
    #[serde(rename = "_id")]
    pub table_id: String,
    pub snapshot: Value,
    #[serde(default)]
    pub updated_at: i64,
}

impl From<MongoTableStateDocument> for TableStateEntity {
    fn from(value: MongoTableStateDocument) -> Self {
        Self {
            table_id: value.table_id,
            snapshot: value.snapshot,
            updated_at_ms: value.updated_at,
        }
    }
}
