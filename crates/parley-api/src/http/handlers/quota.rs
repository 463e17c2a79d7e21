//! Quota HTTP handlers.
//!
//! Endpoints:
//! - GET /api/v1/quota/{token} - Check the message limit for a token

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use parley_types::quota::QuotaStatus;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/quota/{token} - Check the message limit for a token.
///
/// A token never seen before gets a quota record with count 0 as a side
/// effect.
pub async fn check_message_limit(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<QuotaStatus>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let status = state.session_service.check_quota(&token).await?;
    let elapsed = start.elapsed().as_millis() as u64;

    Ok(Json(ApiResponse::success(status, request_id, elapsed)))
}
