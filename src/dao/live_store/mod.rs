#[cfg(feature = "mongo-store")]
pub mod mongodb;
#[cfg(test)]
pub mod testing;

use futures::future::BoxFuture;

use crate::dao::models::{ChatMessageEntity, TableStateEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the externally owned message log and snapshot store.
///
/// This layer only reads: chat rows are appended by the community app and
/// table snapshots are written by the game engine. Nothing here mutates
/// persisted data.
pub trait LiveStore: Send + Sync {
    /// Timestamp of the most recent chat row in `room_id`, if any.
    fn latest_message_ts(&self, room_id: &str) -> BoxFuture<'static, StorageResult<Option<i64>>>;
    /// Chat rows strictly newer than `after_ms`, oldest first.
    ///
    /// `None` reads from the beginning of retained history.
    fn messages_after(
        &self,
        room_id: &str,
        after_ms: Option<i64>,
    ) -> BoxFuture<'static, StorageResult<Vec<ChatMessageEntity>>>;
    /// Current authoritative snapshot for `table_id`.
    fn table_snapshot(
        &self,
        table_id: &str,
    ) -> BoxFuture<'static, StorageResult<Option<TableStateEntity>>>;
    /// Cheap liveness probe against the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the underlying connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
