use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::{Event, Sse},
    routing::get,
};
use futures::{Stream, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::validation::validate_resource_id, error::AppError, services::chat_stream_service,
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/rooms/{room_id}/stream",
    tag = "chat",
    params(("room_id" = String, Path, description = "Identifier of the chat room to tail")),
    responses((status = 200, description = "Chat event stream", content_type = "text/event-stream", body = String))
)]
/// Stream chat events for one room to a single subscriber.
pub async fn room_stream(
    State(state): State<SharedState>,
    Path(room_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    validate_resource_id(&room_id)
        .map_err(|err| AppError::BadRequest(format!("invalid room id: {err}")))?;

    let connection_id = Uuid::new_v4().simple().to_string();
    info!(room_id = %room_id, connection_id = %connection_id, "new chat stream connection");
    let events = chat_stream_service::open_room_stream(state, room_id);

    // In-band heartbeats make a transport-level keep-alive redundant.
    let stream = events.filter_map(|event| async move {
        match Event::default().json_data(&event) {
            Ok(rendered) => Some(Ok::<_, Infallible>(rendered)),
            Err(err) => {
                warn!(error = %err, "failed to encode chat stream event");
                None
            }
        }
    });

    Ok(Sse::new(stream))
}

/// Configure the chat streaming endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/rooms/{room_id}/stream", get(room_stream))
}
