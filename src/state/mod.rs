pub mod channels;

use std::sync::Arc;

use tokio::sync::{RwLock, watch};

use crate::{
    config::AppConfig, dao::live_store::LiveStore, error::ServiceError,
    transport::PushTransport,
};

pub use self::channels::{ChannelHandle, ChannelRegistry};

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Central application state: the backing-store slot, the table channel
/// registry, and the degraded-mode flag.
pub struct AppState {
    live_store: RwLock<Option<Arc<dyn LiveStore>>>,
    channels: ChannelRegistry,
    degraded: watch::Sender<bool>,
    config: AppConfig,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts degraded until a backing store is installed.
    /// `transport` is `None` when no push credentials were configured.
    pub fn new(config: AppConfig, transport: Option<Arc<dyn PushTransport>>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        let channels = ChannelRegistry::new(
            transport,
            config.channel_namespace.clone(),
            config.subscribe_timeout,
        );

        Arc::new(Self {
            live_store: RwLock::new(None),
            channels,
            degraded: degraded_tx,
            config,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Registry of live table channels.
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// Obtain a handle to the current backing store, if one is installed.
    pub async fn live_store(&self) -> Option<Arc<dyn LiveStore>> {
        let guard = self.live_store.read().await;
        guard.as_ref().cloned()
    }

    /// Backing store handle, or [`ServiceError::Degraded`] when absent.
    pub async fn require_live_store(&self) -> Result<Arc<dyn LiveStore>, ServiceError> {
        self.live_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new backing store and leave degraded mode.
    pub async fn set_live_store(&self, store: Arc<dyn LiveStore>) {
        {
            let mut guard = self.live_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current backing store and enter degraded mode.
    pub async fn clear_live_store(&self) {
        {
            let mut guard = self.live_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current != value {
                *current = value;
                true
            } else {
                false
            }
        });
    }
}
