use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Cardroom Live.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::chat::room_stream,
        crate::routes::table::table_state,
        crate::routes::table::broadcast_state,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::stream::ChatStreamEvent,
            crate::dto::stream::ChatMessagePayload,
            crate::dto::stream::ChatSenderPayload,
            crate::dto::table::TableStateResponse,
            crate::dto::table::BroadcastRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "chat", description = "Chat room event streams"),
        (name = "table", description = "Table state sync and broadcast"),
    )
)]
pub struct ApiDoc;
