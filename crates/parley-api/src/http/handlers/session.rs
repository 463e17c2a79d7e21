//! Session HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/anonymous-sessions - Register an anonymous session token
//! - POST /api/v1/sessions           - Create a chat session
//! - GET  /api/v1/sessions           - List sessions for a user or token

use std::time::Instant;

use axum::Json;
use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use parley_types::quota::AnonymousQuota;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for chat session creation.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// Query parameters for session listing.
#[derive(Debug, Deserialize)]
pub struct SessionListQuery {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Response body for anonymous session registration.
#[derive(Debug, Serialize)]
pub struct AnonymousSessionResponse {
    pub session_token: String,
    pub quota: AnonymousQuota,
}

/// POST /api/v1/anonymous-sessions - Register a fresh anonymous token.
pub async fn create_anonymous_session(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AnonymousSessionResponse>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let quota = state.session_service.create_anonymous_session().await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let body = AnonymousSessionResponse {
        session_token: quota.session_token.clone(),
        quota,
    };

    Ok(Json(ApiResponse::success(body, request_id, elapsed)))
}

/// POST /api/v1/sessions - Create a chat session.
pub async fn create_chat_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let session = state
        .session_service
        .create_session(body.user_id, body.session_token.as_deref(), body.title)
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let session_json =
        serde_json::to_value(&session).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ApiResponse::success(session_json, request_id, elapsed)))
}

/// GET /api/v1/sessions - List sessions for a user or an anonymous token.
pub async fn list_sessions(
    State(state): State<AppState>,
    Query(query): Query<SessionListQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sessions = state
        .history_service
        .list_sessions(query.user_id, query.session_token.as_deref())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let sessions_json = sessions
        .iter()
        .map(|s| serde_json::to_value(s).map_err(|e| AppError::Internal(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ApiResponse::success(sessions_json, request_id, elapsed)))
}
