use std::{future::Future, sync::Arc, time::Duration};

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    dao::{live_store::LiveStore, storage::StorageError},
    state::SharedState,
};

const INITIAL_DELAY: Duration = Duration::from_secs(1);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);
const MAX_RECONNECT_ATTEMPTS: u32 = 3;

/// Keep a backing store installed, flipping degraded mode as connectivity
/// comes and goes.
pub async fn run<F, Fut>(state: SharedState, mut connect: F)
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = Result<Arc<dyn LiveStore>, StorageError>> + Send,
{
    let mut delay = INITIAL_DELAY;

    loop {
        match connect().await {
            Ok(store) => {
                state.set_live_store(store.clone()).await;
                info!("storage connection established; leaving degraded mode");
                delay = INITIAL_DELAY;

                monitor(&state, store).await;
                state.clear_live_store().await;
            }
            Err(err) => {
                warn!(error = %err, "storage connection attempt failed");
            }
        }

        sleep(delay).await;
        delay = (delay * 2).min(MAX_DELAY);
    }
}

/// Health-check the installed store until in-place reconnection attempts are
/// exhausted, then hand control back so [`run`] rebuilds it from scratch.
async fn monitor(state: &SharedState, store: Arc<dyn LiveStore>) {
    loop {
        match store.health_check().await {
            Ok(()) => {
                state.update_degraded(false);
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, "storage health check failed; entering degraded mode");
                state.update_degraded(true);

                let mut attempt = 0;
                let mut reconnect_delay = INITIAL_DELAY;
                loop {
                    match store.try_reconnect().await {
                        Ok(()) => {
                            info!("storage reconnection succeeded");
                            state.update_degraded(false);
                            break;
                        }
                        Err(reconnect_err) => {
                            attempt += 1;
                            warn!(attempt, error = %reconnect_err, "storage reconnect attempt failed");
                            if attempt >= MAX_RECONNECT_ATTEMPTS {
                                warn!("exhausted storage reconnect attempts; rebuilding connection");
                                return;
                            }
                            sleep(reconnect_delay).await;
                            reconnect_delay = (reconnect_delay * 2).min(MAX_DELAY);
                        }
                    }
                }
            }
        }
    }
}
