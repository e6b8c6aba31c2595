use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use bytes::Bytes;
use tracing::{debug, info};

use placehub_protocol::{
    HealthResponse, PendingScriptDto, PlaceHeartbeat, PlacesResponse, QueuedResponse,
    ScriptSubmission,
};

use crate::error::ApiError;
use crate::state::AppState;

type Result<T> = std::result::Result<T, ApiError>;

/// POST /api/addPlace
pub async fn add_place(State(state): State<Arc<AppState>>, body: Bytes) -> Result<StatusCode> {
    let heartbeat = PlaceHeartbeat::from_json(&body)?;
    state
        .places
        .upsert(&heartbeat.place_id, heartbeat.display_name.as_deref())?;

    debug!(place_id = %heartbeat.place_id, "heartbeat recebido");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/options
pub async fn list_places(State(state): State<Arc<AppState>>) -> Json<PlacesResponse> {
    Json(state.places.snapshot_visible())
}

/// POST /api/execute
pub async fn execute(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<(StatusCode, Json<QueuedResponse>)> {
    let submission = ScriptSubmission::from_json(&body)?;
    state
        .scripts
        .submit(&submission.unique_id, &submission.script)?;

    info!(unique_id = %submission.unique_id, "script enfileirado");
    Ok((
        StatusCode::CREATED,
        Json(QueuedResponse::queued(submission.unique_id)),
    ))
}

/// GET /api/pendingScripts
pub async fn pending_scripts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<PendingScriptDto>>> {
    let list = state
        .scripts
        .list_all()?
        .into_iter()
        .map(|info| PendingScriptDto {
            unique_id: info.unique_id,
            script: info.script,
            expires_in_ms: info.expires_in_ms,
        })
        .collect();
    Ok(Json(list))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "ok".into(),
        places: state.places.len(),
        pending_scripts: state.scripts.len()?,
    }))
}
