//! Session lifecycle endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::SessionSummary;

/// POST /api/sessions
pub async fn create_session(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>)> {
    let session = state.sessions().create().await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "session_id": session.id() })),
    ))
}

/// GET /api/sessions/:id
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSummary>> {
    let session = state.sessions().get(id)?;
    Ok(Json(session.summary().await))
}

/// DELETE /api/sessions/:id
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.sessions().remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
