use axum::{extract::State, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;
use tripcover_agent::QuoteApiMode;

#[derive(Clone, Copy)]
pub struct HealthState {
    quote_api_mode: QuoteApiMode,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub quote_api_mode: &'static str,
    pub checked_at: String,
}

pub fn router(quote_api_mode: QuoteApiMode) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { quote_api_mode })
}

/// Sessions live in process memory and the quotation client is built at
/// startup, so a running server is always ready.
pub async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ready",
        quote_api_mode: state.quote_api_mode.as_str(),
        checked_at: Utc::now().to_rfc3339(),
    })
}
