use serde_json::Value;

/// A single chat row read from the append-only message log.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessageEntity {
    /// Row identifier, unique within the log.
    pub id: String,
    /// Room the message belongs to.
    pub room_id: String,
    /// Message body as written by the sender.
    pub content: String,
    /// Insertion timestamp in epoch milliseconds.
    pub created_at_ms: i64,
    /// Denormalized sender profile carried with the row.
    pub sender: ChatSenderEntity,
}

/// Sender identity attached to a chat row.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSenderEntity {
    /// Account identifier of the sender.
    pub id: String,
    /// Display name at the time the row was written.
    pub nickname: String,
    /// Optional avatar URL.
    pub avatar_url: Option<String>,
    /// Gamification level at the time the row was written.
    pub level: u32,
}

/// Authoritative state snapshot persisted for one table.
#[derive(Debug, Clone)]
pub struct TableStateEntity {
    /// Table the snapshot belongs to.
    pub table_id: String,
    /// Opaque game state produced by the engine.
    pub snapshot: Value,
    /// Last update timestamp in epoch milliseconds.
    pub updated_at_ms: i64,
}
