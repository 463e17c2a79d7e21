//! Axum router configuration with middleware.
//!
//! All routes are under `/api/v1/`.
//! Middleware: CORS, tracing.

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        // Anonymous session registration
        .route(
            "/anonymous-sessions",
            post(handlers::session::create_anonymous_session),
        )
        // Chat sessions
        .route("/sessions", post(handlers::session::create_chat_session))
        .route("/sessions", get(handlers::session::list_sessions))
        // Messages
        .route(
            "/sessions/{id}/messages",
            post(handlers::message::send_message),
        )
        .route(
            "/sessions/{id}/messages",
            get(handlers::message::get_chat_history),
        )
        // Quota
        .route("/quota/{token}", get(handlers::quota::check_message_limit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(health_check))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - Simple health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
