//! Chat HTTP surface.
//!
//! - `POST /chat`  - one conversation turn, `{message, session_id?}`
//! - `POST /clear` - forget a session; id from the query string or JSON body
//! - `GET  /`      - static landing page from the configured directory

use std::path::Path;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use brewbot_agent::AgentRuntime;
use brewbot_core::{ApplicationError, InterfaceError, SessionId};
use serde::{Deserialize, Serialize};
use tower_http::services::ServeFile;
use tracing::error;
use uuid::Uuid;

#[derive(Clone)]
pub struct ChatState {
    runtime: Arc<AgentRuntime>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub session_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClearParams {
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub correlation_id: String,
}

pub fn router(runtime: Arc<AgentRuntime>, static_dir: &Path) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/clear", post(clear))
        .route_service("/", ServeFile::new(static_dir.join("index.html")))
        .with_state(ChatState { runtime })
}

pub async fn chat(
    State(state): State<ChatState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let session_id = request.session_id.map(SessionId::from);

    let turn = state
        .runtime
        .handle_turn(session_id, &request.message)
        .await
        .map_err(|error| ApiError::from(ApplicationError::from(error)))?;

    Ok(Json(ChatResponse { response: turn.reply, session_id: turn.session_id.0 }))
}

/// Always answers ok; a missing, malformed or unknown id is a no-op.
pub async fn clear(
    State(state): State<ChatState>,
    query: Result<Query<ClearParams>, QueryRejection>,
    body: Bytes,
) -> Json<StatusResponse> {
    let query = query.map(|Query(params)| params).unwrap_or_default();
    let session_id = query.session_id.or_else(|| {
        serde_json::from_slice::<ClearParams>(&body).ok().and_then(|params| params.session_id)
    });

    if let Some(session_id) = session_id.filter(|id| !id.trim().is_empty()) {
        state.runtime.clear_session(&SessionId(session_id));
    }

    Json(StatusResponse { status: "ok" })
}

#[derive(Debug)]
pub struct ApiError(InterfaceError);

impl ApiError {
    fn bad_request(message: String) -> Self {
        Self(InterfaceError::BadRequest { message, correlation_id: new_correlation_id() })
    }
}

impl From<ApplicationError> for ApiError {
    fn from(error: ApplicationError) -> Self {
        Self(error.into_interface(new_correlation_id()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            InterfaceError::UpstreamFailure { .. } => StatusCode::BAD_GATEWAY,
            InterfaceError::UpstreamTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error!(
            event_name = "system.http.error",
            correlation_id = self.0.correlation_id(),
            status = status.as_u16(),
            error = %self.0,
            "request failed"
        );

        let body = ErrorResponse {
            error: self.0.user_message(),
            correlation_id: self.0.correlation_id().to_string(),
        };
        (status, Json(body)).into_response()
    }
}

fn new_correlation_id() -> String {
    format!("req-{}", Uuid::new_v4())
}
