//! Voice Support Server
//!
//! HTTP endpoints for starting conversations, asking questions, fetching the
//! spoken reply and reading history, plus health, readiness and metrics.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::{init_metrics, record_error, record_request};
pub use state::AppState;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use voice_support_agent::AgentError;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Timeout(String),

    #[error("{0}")]
    Internal(String),

    #[error("Startup error: {0}")]
    Startup(String),
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServerError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ServerError::Internal(_) | ServerError::Startup(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}

impl From<AgentError> for ServerError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Validation(msg) | AgentError::InvalidSession(msg) => {
                ServerError::BadRequest(msg)
            },
            AgentError::SessionNotFound => ServerError::NotFound(err.to_string()),
            AgentError::Capacity(_) => ServerError::Unavailable(err.to_string()),
            AgentError::Inference(_)
            | AgentError::Synthesis(_)
            | AgentError::Persistence(_)
            | AgentError::DuplicateSession(_) => ServerError::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }
        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}
