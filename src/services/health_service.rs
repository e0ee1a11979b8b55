use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the current health snapshot while logging connectivity issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.require_live_store().await {
        Ok(store) => {
            if let Err(err) = store.health_check().await {
                warn!(error = %err, "storage health check failed");
            }
        }
        Err(_) => warn!("storage unavailable (degraded mode)"),
    }

    let push_configured = state.channels().has_transport();
    if state.is_degraded() {
        HealthResponse::degraded(push_configured)
    } else {
        HealthResponse::ok(push_configured)
    }
}
