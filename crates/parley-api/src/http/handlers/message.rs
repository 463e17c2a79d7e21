//! Message HTTP handlers.
//!
//! Endpoints:
//! - POST /api/v1/sessions/{id}/messages - Send a message, receive the pair
//! - GET  /api/v1/sessions/{id}/messages - Get chat history for a session

use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::handlers::parse_uuid;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// Request body for sending a message.
#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub content: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// Query parameters for history access.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    #[serde(default)]
    pub session_token: Option<String>,
}

/// POST /api/v1/sessions/{id}/messages - Send a message.
///
/// Returns the persisted user message and the synthesized assistant reply.
pub async fn send_message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<ApiResponse<serde_json::Value>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    let exchange = state
        .messaging_service
        .send(sid, &body.content, body.session_token.as_deref())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let exchange_json =
        serde_json::to_value(&exchange).map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(Json(ApiResponse::success(exchange_json, request_id, elapsed)))
}

/// GET /api/v1/sessions/{id}/messages - Get messages for a session.
pub async fn get_chat_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<ApiResponse<Vec<serde_json::Value>>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let sid = parse_uuid(&session_id)?;

    let messages = state
        .history_service
        .get_history(sid, query.user_id, query.session_token.as_deref())
        .await?;
    let elapsed = start.elapsed().as_millis() as u64;

    let messages_json = messages
        .iter()
        .map(|m| serde_json::to_value(m).map_err(|e| AppError::Internal(e.to_string())))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Json(ApiResponse::success(messages_json, request_id, elapsed)))
}
