//! HTTP Endpoints
//!
//! REST API consumed by the web client.

use std::time::Duration;

use axum::{
    error_handling::HandleErrorLayer,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower::{timeout::error::Elapsed, BoxError, ServiceBuilder};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voice_support_agent::AskOutcome;
use voice_support_core::Message;

use crate::metrics::{metrics_handler, record_error, record_request};
use crate::state::AppState;
use crate::ServerError;

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let cors_layer = build_cors_layer(&state.config.server.cors_origins);
    let timeout = Duration::from_secs(state.config.server.timeout_seconds);

    Router::new()
        .route("/start-conversation", post(start_conversation))
        .route("/ask", post(ask))
        .route("/get-audio/:session_id", get(get_audio))
        .route("/get-history/:session_id", get(get_history))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(handle_middleware_error))
                .timeout(timeout),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(state)
}

/// Turn middleware failures into the JSON error body
async fn handle_middleware_error(err: BoxError) -> ServerError {
    if err.is::<Elapsed>() {
        record_error("timeout");
        ServerError::Timeout("Request timed out".to_string())
    } else {
        record_error("middleware");
        ServerError::Internal(format!("Unhandled internal error: {}", err))
    }
}

/// Build CORS layer from configured origins
///
/// An empty list allows any origin, which is what the browser client
/// served from another port needs in development.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::error!("All configured CORS origins are invalid, allowing any origin");
        return CorsLayer::permissive();
    }

    tracing::info!("CORS configured with {} origins", parsed_origins.len());
    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Serialize)]
struct StartConversationResponse {
    session_id: String,
}

async fn start_conversation(
    State(state): State<AppState>,
) -> Result<Json<StartConversationResponse>, ServerError> {
    record_request("start_conversation");
    let session_id = state.orchestrator.start_session()?;
    Ok(Json(StartConversationResponse { session_id }))
}

#[derive(Deserialize)]
struct AskRequest {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    session_id: Option<String>,
}

#[derive(Serialize)]
struct AskResponse {
    reply: String,
    session_id: String,
    detected_language: &'static str,
    audio_available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
}

impl From<AskOutcome> for AskResponse {
    fn from(outcome: AskOutcome) -> Self {
        Self {
            reply: outcome.reply,
            session_id: outcome.session_id,
            detected_language: outcome.detected_language.code(),
            audio_available: outcome.audio_available,
            warning: outcome.warning,
        }
    }
}

async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<AskResponse>, ServerError> {
    record_request("ask");

    let Json(request) = payload.map_err(|rejection| {
        record_error("bad_request");
        ServerError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    })?;

    let text = request.text.unwrap_or_default();
    let session_id = request.session_id.unwrap_or_default();

    let outcome = state.orchestrator.ask(&session_id, &text).await?;
    Ok(Json(outcome.into()))
}

async fn get_audio(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Response, ServerError> {
    record_request("get_audio");

    let path = state
        .orchestrator
        .audio_file(&session_id)
        .await
        .map_err(|_| ServerError::NotFound("Audio not found".to_string()))?;

    let bytes = tokio::fs::read(&path).await.map_err(|e| {
        tracing::warn!(session_id = %session_id, error = %e, "Audio file unreadable");
        ServerError::NotFound("Audio not found".to_string())
    })?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], bytes).into_response())
}

#[derive(Serialize)]
struct HistoryResponse {
    history: Vec<Message>,
}

async fn get_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<HistoryResponse>, ServerError> {
    record_request("get_history");
    let history = state.orchestrator.history(&session_id).await?;
    Ok(Json(HistoryResponse { history }))
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn readiness_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let sessions = state.orchestrator.session_count();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ready",
            "sessions": sessions,
            "max_sessions": state.config.sessions.max_sessions,
        })),
    )
}
