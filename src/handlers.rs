use crate::errors::AppError;
use crate::gamertag::GamertagResolver;
use crate::models::{ReportRequest, ReportResponse};
use crate::render::render_report;
use crate::report::ReportAssembler;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::json;
use std::sync::Arc;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Turns identifiers into gamertags.
    pub resolver: GamertagResolver,
    /// Builds reports for a gamertag.
    pub assembler: ReportAssembler,
}

/// Health check endpoint.
///
/// Returns the service status and version.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "gamertag-report",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}

/// POST /api/v1/report
///
/// Derives a gamertag from the identifier and returns the assembled report
/// together with its text rendering.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `payload` - `{"identifier": "<email>"}`. Other fields are rejected.
///
/// # Returns
///
/// * `Result<Json<ReportResponse>, AppError>` - The report, or an error with no partial report.
pub async fn create_report(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReportRequest>, JsonRejection>,
) -> Result<Json<ReportResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    if request.identifier.trim().is_empty() {
        return Err(AppError::BadRequest("identifier is required".to_string()));
    }

    let handle = state.resolver.derive(&request.identifier).await?;
    tracing::info!("POST /report - derived gamertag: {}", handle);

    // A panic inside assembly surfaces as AssemblyError instead of a dropped connection.
    let assembler = state.assembler.clone();
    let task_handle = handle.clone();
    let report = tokio::spawn(async move { assembler.assemble(&task_handle).await }).await??;

    let text = render_report(&report);
    Ok(Json(ReportResponse { report, text }))
}
