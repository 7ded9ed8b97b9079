use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{agent::memory::Message, AppState};

// Defines the structure of the JSON body accepted by POST /chat.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
    pub thread_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
    pub thread_id: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub async fn preflight_handler() -> impl IntoResponse {
    StatusCode::OK
}

// The handler function for the POST /chat endpoint.
pub async fn chat_handler(State(state): State<AppState>, body: Bytes) -> Response {
    let dispatcher = match state.agent() {
        Some(dispatcher) => dispatcher,
        None => {
            warn!("Chat request rejected: agent is not ready");
            return error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Agent system is not initialized or failed to load. Check server logs.",
            );
        }
    };

    // An empty body is treated like an empty object.
    let request: ChatRequest = if body.is_empty() {
        ChatRequest::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(request) => request,
            Err(e) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid JSON in request body: {}", e),
                )
            }
        }
    };

    let message = match request.message {
        Some(message) => message,
        None => {
            return error_response(StatusCode::BAD_REQUEST, "Missing 'message' in request body")
        }
    };

    let thread_id = request
        .thread_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    info!(thread_id = %thread_id, "Handling chat request");

    // A panic inside the dispatch task surfaces as a 500.
    let task = {
        let dispatcher = dispatcher.clone();
        let thread_id = thread_id.clone();
        tokio::spawn(async move { dispatcher.handle(&thread_id, &message).await })
    };

    match task.await {
        Ok(response) => (StatusCode::OK, Json(ChatResponse { response, thread_id })).into_response(),
        Err(e) => {
            let error = format!("Agent execution failed: {}", e);
            error!(thread_id = %thread_id, "{}", error);
            // Close the turn so the thread never ends on an unanswered message.
            dispatcher
                .memory()
                .append(&thread_id, Message::agent(error.clone()))
                .await;
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "error": error,
                    "thread_id": thread_id,
                })),
            )
                .into_response()
        }
    }
}
