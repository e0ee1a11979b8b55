use serde_json::Value;
use tracing::{debug, warn};

use crate::state::SharedState;

/// Publish a state snapshot to the table's pub/sub channel, best effort.
///
/// Broadcast failures never propagate: the engine's persisted state stays
/// authoritative and viewers without a channel fall back to the REST pull.
/// A send failure on a cached channel gets exactly one recreate-and-resend,
/// so the state-mutation path pays at most two send attempts.
pub async fn publish_state(state: &SharedState, table_id: &str, snapshot: &Value) {
    let registry = state.channels();

    let Some(channel) = registry.acquire(table_id).await else {
        debug!(table_id, "push transport unavailable; skipping broadcast");
        return;
    };

    match channel.publish_state(snapshot).await {
        Ok(()) => return,
        Err(err) => {
            warn!(table_id, error = %err, "broadcast failed on cached channel; recreating");
        }
    }

    // The cached channel died between uses despite its confirmed
    // subscription. Tear it down and retry once on a fresh one; a second
    // failure waits for the next state change.
    registry.release(table_id).await;
    let Some(channel) = registry.acquire(table_id).await else {
        debug!(table_id, "channel recreation unavailable; dropping broadcast");
        return;
    };

    if let Err(err) = channel.publish_state(snapshot).await {
        warn!(table_id, error = %err, "broadcast retry failed; dropping");
        registry.release(table_id).await;
    }
}
