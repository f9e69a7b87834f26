//! Route handlers

use crate::error::ApiError;
use crate::state::AppState;
use crate::store::{Outcome, RequestEntry, RequestStatus};
use crate::tracker::TrackerError;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

pub const SERVICE_NAME: &str = "Multi-Agent Financial Analyst API";

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub symbol: Option<String>,
    #[serde(default)]
    pub company_name: Option<String>,
}

/// POST /analyze
pub async fn submit_analysis(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = body.map_err(|e| {
        warn!(error = %e, "Rejected analysis request body");
        ApiError::from(TrackerError::MissingFields)
    })?;
    let (Some(symbol), Some(company_name)) = (request.symbol, request.company_name) else {
        return Err(TrackerError::MissingFields.into());
    };

    info!(%symbol, %company_name, "POST /analyze");
    let entry = state.tracker.submit(&symbol, &company_name).await?;
    Ok(Json(json!({
        "request_id": entry.id,
        "status": RequestStatus::Processing,
        "message": "Analysis started in background",
    })))
}

/// GET /analyze/:request_id
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let entry = state.tracker.poll(&request_id).await?;
    Ok(Json(entry_body(entry)?))
}

/// DELETE /analyze/:request_id
pub async fn cancel_analysis(
    State(state): State<AppState>,
    Path(request_id): Path<String>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let entry = state.tracker.cancel(&request_id).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({
            "request_id": entry.id,
            "status": RequestStatus::Processing,
            "message": "Cancellation requested",
        })),
    ))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "service": SERVICE_NAME }))
}

fn entry_body(entry: RequestEntry) -> Result<Value, ApiError> {
    let status = entry.status();
    Ok(match entry.outcome {
        None => json!({
            "request_id": entry.id,
            "status": status,
            "message": "Analysis still in progress",
        }),
        Some(Outcome::Completed(report)) => {
            let report = serde_json::to_value(&report)
                .map_err(|e| ApiError::Internal(format!("Failed to serialize report: {e}")))?;
            json!({
                "request_id": entry.id,
                "report": report,
                "success": true,
                "status": status,
            })
        }
        Some(Outcome::Failed(error)) => json!({
            "request_id": entry.id,
            "error": error,
            "success": false,
            "status": status,
        }),
    })
}
