use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::transport::{BroadcastEnvelope, PushChannel, PushTransport, TransportResult};

/// A cached channel construction, shared by every concurrent acquire for the
/// same table. The entry is inserted before the subscribe handshake
/// completes, so first-use races coalesce onto one in-flight setup instead
/// of opening duplicate channels.
type PendingChannel = Shared<BoxFuture<'static, Option<Arc<ChannelHandle>>>>;

/// One live pub/sub channel bound to a table, owned by the registry.
pub struct ChannelHandle {
    table_id: String,
    channel: Arc<dyn PushChannel>,
}

impl ChannelHandle {
    /// Identifier of the table this channel serves.
    pub fn table_id(&self) -> &str {
        &self.table_id
    }

    /// Publish a `game_state` broadcast carrying `snapshot`.
    pub async fn publish_state(&self, snapshot: &Value) -> TransportResult<()> {
        let envelope = BroadcastEnvelope::game_state(snapshot.clone());
        let payload = serde_json::to_string(&envelope)
            .map_err(|err| crate::transport::TransportError::publish(self.table_id.clone(), err))?;
        self.channel.publish(payload).await
    }
}

/// Process-wide cache of live pub/sub channels, keyed by table id.
///
/// Constructed once per server process and injected into the broadcaster,
/// so tests can swap in a fresh registry. Entries are created lazily on
/// first publish demand and evicted on failure or release; at most one
/// resolved [`ChannelHandle`] exists per table id at any instant.
pub struct ChannelRegistry {
    transport: Option<Arc<dyn PushTransport>>,
    entries: DashMap<String, PendingChannel>,
    namespace: String,
    subscribe_timeout: Duration,
}

impl ChannelRegistry {
    /// Build a registry over the configured transport. `None` means no push
    /// credentials exist: every acquisition resolves to unavailable.
    pub fn new(
        transport: Option<Arc<dyn PushTransport>>,
        namespace: impl Into<String>,
        subscribe_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            entries: DashMap::new(),
            namespace: namespace.into(),
            subscribe_timeout,
        }
    }

    /// Whether a push transport was configured at startup.
    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Obtain the channel for `table_id`, constructing it on first use.
    ///
    /// Concurrent callers for the same table observe the same in-flight
    /// setup and therefore the same eventual result. `None` means the push
    /// transport is unavailable; callers degrade to the REST pull path.
    pub async fn acquire(&self, table_id: &str) -> Option<Arc<ChannelHandle>> {
        let pending = match self.entries.entry(table_id.to_owned()) {
            Entry::Occupied(entry) => entry.get().clone(),
            Entry::Vacant(slot) => {
                let setup = open_channel(
                    self.transport.clone(),
                    format!("{}:{}", self.namespace, table_id),
                    table_id.to_owned(),
                    self.subscribe_timeout,
                )
                .boxed()
                .shared();
                slot.insert(setup.clone());
                setup
            }
        };

        let resolved = pending.clone().await;
        if resolved.is_none() {
            // Failed constructions are evicted so the next publish retries
            // from scratch. ptr_eq guards against clobbering a fresh entry
            // that raced in behind this one.
            self.entries
                .remove_if(table_id, |_, entry| entry.ptr_eq(&pending));
        }
        resolved
    }

    /// Drop the cache entry for `table_id`, tearing the channel down if the
    /// construction had already resolved to one.
    pub async fn release(&self, table_id: &str) {
        if let Some((_, pending)) = self.entries.remove(table_id) {
            if let Some(Some(handle)) = pending.peek() {
                handle.channel.close().await;
                debug!(table_id, "released table channel");
            }
        }
    }
}

/// Construct one channel: open, then race the subscribe confirmation
/// against the bounded wait. Any non-confirmed outcome tears the channel
/// down and resolves to unavailable.
async fn open_channel(
    transport: Option<Arc<dyn PushTransport>>,
    channel_name: String,
    table_id: String,
    subscribe_timeout: Duration,
) -> Option<Arc<ChannelHandle>> {
    let transport = transport?;

    let channel = match transport.open(&channel_name).await {
        Ok(channel) => channel,
        Err(err) => {
            warn!(table_id, error = %err, "failed to open table channel");
            return None;
        }
    };

    match timeout(subscribe_timeout, channel.subscribed()).await {
        Ok(Ok(())) => Some(Arc::new(ChannelHandle { table_id, channel })),
        Ok(Err(err)) => {
            warn!(table_id, error = %err, "table channel subscription failed");
            channel.close().await;
            None
        }
        Err(_elapsed) => {
            warn!(
                table_id,
                timeout_ms = subscribe_timeout.as_millis() as u64,
                "table channel subscription timed out"
            );
            channel.close().await;
            None
        }
    }
}
