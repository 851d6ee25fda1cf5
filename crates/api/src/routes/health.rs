use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Health check routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/v1/ping", get(ping))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "documents": state.registry().list().await.len(),
        "subscribers": state.event_bus().subscriber_count(),
    }))
}

async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
