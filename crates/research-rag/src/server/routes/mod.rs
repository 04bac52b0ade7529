//! API routes for the research RAG server

pub mod ingest;
pub mod metrics;
pub mod query;
pub mod sessions;

use axum::{
    extract::{DefaultBodyLimit, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .route("/sessions", post(sessions::create_session))
        .route(
            "/sessions/:id",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        // Uploads get the larger body limit
        .route(
            "/sessions/:id/documents",
            post(ingest::upload_documents)
                .layer(DefaultBodyLimit::max(max_upload_size))
                .get(ingest::list_documents),
        )
        .route("/sessions/:id/query", post(query::ask))
        .route("/sessions/:id/metrics", post(metrics::extract_metrics))
        .route("/info", get(info))
}

/// API info endpoint
async fn info(State(state): State<AppState>) -> Json<Value> {
    let models = state.models();
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Research paper RAG with cited answers and metric extraction",
        "llm": {"provider": models.llm.name(), "model": models.llm.model()},
        "embeddings": {"provider": models.embedder.name(), "dimensions": models.embedder.dimensions()},
        "collection": state.config().index.collection_name,
        "similarity_top_k": state.config().index.similarity_top_k,
        "active_sessions": state.sessions().len(),
        "endpoints": {
            "POST /api/sessions": "Create a session",
            "GET /api/sessions/:id": "Session summary",
            "DELETE /api/sessions/:id": "Remove a session and its staged files",
            "POST /api/sessions/:id/documents": "Upload PDFs (multipart) and rebuild the index",
            "GET /api/sessions/:id/documents": "List loaded files and pages",
            "POST /api/sessions/:id/query": "Ask a question with sources",
            "POST /api/sessions/:id/metrics": "Extract metrics and charts from all pages"
        }
    }))
}
