//! LLM Integration
//!
//! Features:
//! - Flat prompt assembly from a session transcript
//! - Gemini `generateContent` backend with bounded retry

pub mod backend;
pub mod prompt;

pub use backend::{GeminiBackend, GeminiConfig};
pub use prompt::{assemble, PromptBuilder};

use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Response blocked: {0}")]
    Blocked(String),

    #[error("Timeout")]
    Timeout,

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl LlmError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Network(_) | LlmError::Timeout => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for voice_support_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout => voice_support_core::Error::Timeout,
            other => voice_support_core::Error::Llm(other.to_string()),
        }
    }
}
