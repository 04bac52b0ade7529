//! Question answering endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{QueryRequest, QueryResponse};

/// POST /api/sessions/:id/query
pub async fn ask(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    tracing::info!(session = %id, "Query: \"{}\"", request.question);

    let session = state.sessions().get(id)?;
    let response = session.ask(&request).await?;

    tracing::info!(
        session = %id,
        "Answered with {} sources in {}ms",
        response.sources.len(),
        response.processing_time_ms
    );

    Ok(Json(response))
}
