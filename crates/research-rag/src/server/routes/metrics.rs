//! Metric extraction endpoint

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::analysis::RenderedReport;
use crate::error::Result;
use crate::server::state::AppState;
use crate::types::MetricsRequest;

/// POST /api/sessions/:id/metrics
///
/// The body is optional; an empty body uses the configured fallback year.
/// The response is the report plus Vega-Lite specs under `vega_lite`.
pub async fn extract_metrics(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    request: Option<Json<MetricsRequest>>,
) -> Result<Json<RenderedReport>> {
    let session = state.sessions().get(id)?;
    let fallback_year = request.and_then(|Json(r)| r.fallback_year);

    let report = session.extract_metrics(fallback_year).await?;

    tracing::info!(
        session = %id,
        "Extracted {} rows from {} pages ({} failed)",
        report.rows.len(),
        report.pages_processed,
        report.pages_failed.len()
    );

    Ok(Json(report.with_vega_lite()))
}
