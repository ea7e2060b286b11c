use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// Liveness plus a probe of the document store.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.genres.get_all().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "store": "ok" })),
        ),
        Err(e) => {
            tracing::warn!("Health check: document store unavailable: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "store": e.to_string() })),
            )
        }
    }
}
