//! # API Module
//!
//! HTTP surface of the agent server.
//!
//! ## Available Endpoints
//!
//! - `GET /` and `GET /health` - Liveness check
//! - `POST /chat` - Send an instruction to the agent
//! - `OPTIONS /chat` - CORS preflight
//!
//! Every route is also served under the `/ai` prefix.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub mod chat;
pub mod health;

fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(health::health_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/chat",
            post(chat::chat_handler).options(chat::preflight_handler),
        )
}

/// Full application router with tracing and permissive CORS.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(routes())
        .nest("/ai", routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
