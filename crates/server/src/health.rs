use axum::{routing::get, Json, Router};
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

pub fn router() -> Router {
    Router::new().route("/health", get(health))
}

/// Liveness only. The model provider is not probed.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
