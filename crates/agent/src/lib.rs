//! Conversation orchestration
//!
//! This crate owns the live conversation state and the per-turn workflow:
//! - In-memory transcript store with per-session locks and idle eviction
//! - Orchestrator running detection, prompting, generation, mirroring and
//!   speech synthesis for one turn

pub mod orchestrator;
pub mod store;

pub use orchestrator::{AskOutcome, SessionOrchestrator};
pub use store::{
    generate_session_id, is_valid_session_id, Session, SessionManager, TranscriptStore,
};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// Malformed request input
    #[error("{0}")]
    Validation(String),

    /// Missing or unknown session on a turn
    #[error("{0}")]
    InvalidSession(String),

    /// Unknown session on a read
    #[error("Session not found")]
    SessionNotFound,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("Persistence failed: {0}")]
    Persistence(String),

    #[error("Max sessions reached ({0})")]
    Capacity(usize),

    #[error("Session ID collision: {0}")]
    DuplicateSession(String),
}

impl AgentError {
    /// Short label used as the `kind` metric dimension
    pub fn kind(&self) -> &'static str {
        match self {
            AgentError::Validation(_) => "validation",
            AgentError::InvalidSession(_) => "invalid_session",
            AgentError::SessionNotFound => "session_not_found",
            AgentError::Inference(_) => "inference",
            AgentError::Synthesis(_) => "synthesis",
            AgentError::Persistence(_) => "persistence",
            AgentError::Capacity(_) => "capacity",
            AgentError::DuplicateSession(_) => "duplicate_session",
        }
    }
}

impl From<voice_support_pipeline::PipelineError> for AgentError {
    fn from(err: voice_support_pipeline::PipelineError) -> Self {
        AgentError::Synthesis(err.to_string())
    }
}

impl From<voice_support_persistence::PersistenceError> for AgentError {
    fn from(err: voice_support_persistence::PersistenceError) -> Self {
        AgentError::Persistence(err.to_string())
    }
}
