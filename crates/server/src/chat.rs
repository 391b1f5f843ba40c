use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tripcover_agent::Orchestrator;
use tripcover_core::SessionId;

#[derive(Clone)]
pub struct ChatState {
    orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub response: String,
}

#[derive(Debug, Serialize)]
pub struct ChatError {
    pub error: String,
}

pub fn router(orchestrator: Arc<Orchestrator>) -> Router {
    Router::new().route("/api/v1/chat", post(chat)).with_state(ChatState { orchestrator })
}

/// Every accepted message gets a 200, including turns that failed inside the
/// conversation runtime. Only an empty message is rejected.
pub async fn chat(State(state): State<ChatState>, Json(request): Json<ChatRequest>) -> Response {
    if request.message.trim().is_empty() {
        warn!(event_name = "http.chat.rejected", "chat request without a message");
        return (
            StatusCode::BAD_REQUEST,
            Json(ChatError { error: "message must not be empty".to_string() }),
        )
            .into_response();
    }

    let session_id = request
        .session_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("sess_{}", uuid::Uuid::new_v4()));
    info!(event_name = "http.chat.received", session_id = %session_id, "chat message received");

    let response = state
        .orchestrator
        .handle_message_isolated(request.message, SessionId::from(session_id.clone()))
        .await;

    Json(ChatResponse { session_id, response }).into_response()
}
