use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a push transport is configured for realtime broadcasts.
    pub push_configured: bool,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(push_configured: bool) -> Self {
        Self {
            status: "ok".to_string(),
            push_configured,
        }
    }

    /// Create a health response indicating the system is in degraded mode.
    pub fn degraded(push_configured: bool) -> Self {
        Self {
            status: "degraded".to_string(),
            push_configured,
        }
    }
}
