//! Duplicate review endpoints
//!
//! The report is recomputed on every GET. Verify and delete act on the
//! store only; clients fetch a new report to see their effect.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::review::{DuplicateReport, ReviewError};
use crate::store::{CatalogStore, WriteOutcome};
use crate::AppState;

/// Response for verify and delete
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub id: i64,
    pub outcome: WriteOutcome,
}

/// GET /api/duplicates
///
/// Never fails: an unreadable catalog yields an empty report with
/// `degraded: true`.
pub async fn list_duplicates<S: CatalogStore>(
    State(state): State<AppState<S>>,
) -> Json<DuplicateReport> {
    Json(state.review.find_duplicates().await)
}

/// POST /api/products/:id/verify
pub async fn verify_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<WriteResponse>, ApiError> {
    let outcome = state.review.mark_verified(id).await?;
    Ok(Json(WriteResponse { id, outcome }))
}

/// DELETE /api/products/:id
pub async fn delete_product<S: CatalogStore>(
    State(state): State<AppState<S>>,
    Path(id): Path<i64>,
) -> Result<Json<WriteResponse>, ApiError> {
    let outcome = state.review.delete(id).await?;
    Ok(Json(WriteResponse { id, outcome }))
}

/// API errors
#[derive(Debug)]
pub enum ApiError {
    /// The store rejected or timed out a write; the client may retry
    StoreUnavailable(String),
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        ApiError::StoreUnavailable(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::StoreUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        let body = Json(json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}
