use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::dao::models::TableStateEntity;
use crate::dto::format_epoch_ms;

/// Current authoritative snapshot returned by the sync pull endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct TableStateResponse {
    /// Table identifier.
    pub table_id: String,
    /// Opaque game state snapshot, exactly as the engine persisted it.
    pub snapshot: Value,
    /// Last update time, RFC 3339.
    pub updated_at: String,
}

impl From<TableStateEntity> for TableStateResponse {
    fn from(entity: TableStateEntity) -> Self {
        Self {
            table_id: entity.table_id,
            snapshot: entity.snapshot,
            updated_at: format_epoch_ms(entity.updated_at_ms),
        }
    }
}

/// Broadcast request submitted by the game engine after a state change.
#[derive(Debug, Deserialize, ToSchema)]
pub struct BroadcastRequest {
    /// Complete snapshot to publish. Always a full snapshot, never a delta:
    /// the channel is not guaranteed to deliver history to late joiners.
    pub snapshot: Value,
}
