//! Document upload endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::session::UploadedFile;
use crate::types::{FileSummary, IngestResponse};

/// POST /api/sessions/:id/documents - replace the session's batch and rebuild its index
pub async fn upload_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>> {
    let session = state.sessions().get(id)?;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidRequest(format!("Failed to read multipart field: {}", e)))?
    {
        // Non-file fields carry no documents
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::InvalidRequest(format!("Failed to read '{}': {}", filename, e)))?;

        tracing::info!("Received file: {} ({} bytes)", filename, data.len());
        files.push(UploadedFile::new(filename, data));
    }

    let response = session.process_upload(files).await?;

    tracing::info!(
        session = %id,
        "Processed {} files: {} pages, {} nodes in {}ms",
        response.files.len(),
        response.total_pages,
        response.total_nodes,
        response.processing_time_ms
    );

    Ok(Json(response))
}

/// GET /api/sessions/:id/documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<FileSummary>>> {
    let session = state.sessions().get(id)?;
    Ok(Json(session.documents().await))
}
