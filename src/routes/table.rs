use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};

use crate::{
    dto::table::{BroadcastRequest, TableStateResponse},
    dto::validation::validate_resource_id,
    error::AppError,
    services::{broadcast_service, table_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/tables/{table_id}/state",
    tag = "table",
    params(("table_id" = String, Path, description = "Identifier of the table")),
    responses(
        (status = 200, description = "Current authoritative snapshot", body = TableStateResponse),
        (status = 404, description = "Table has no stored state"),
        (status = 503, description = "Backing store unavailable"),
    )
)]
/// Pull the current table snapshot; the fallback for clients without a push channel.
pub async fn table_state(
    State(state): State<SharedState>,
    Path(table_id): Path<String>,
) -> Result<Json<TableStateResponse>, AppError> {
    let response = table_service::current_state(&state, &table_id).await?;
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/tables/{table_id}/broadcast",
    tag = "table",
    request_body = BroadcastRequest,
    params(("table_id" = String, Path, description = "Identifier of the table")),
    responses((status = 202, description = "Broadcast accepted; delivery is best effort"))
)]
/// Accept a snapshot from the game engine and broadcast it to viewers.
pub async fn broadcast_state(
    State(state): State<SharedState>,
    Path(table_id): Path<String>,
    Json(request): Json<BroadcastRequest>,
) -> Result<StatusCode, AppError> {
    validate_resource_id(&table_id)
        .map_err(|err| AppError::BadRequest(format!("invalid table id: {err}")))?;

    broadcast_service::publish_state(&state, &table_id, &request.snapshot).await;
    Ok(StatusCode::ACCEPTED)
}

/// Configure the table state routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/tables/{table_id}/state", get(table_state))
        .route("/tables/{table_id}/broadcast", post(broadcast_state))
}
