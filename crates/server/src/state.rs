//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use voice_support_agent::{SessionManager, SessionOrchestrator};
use voice_support_config::Settings;
use voice_support_llm::{GeminiBackend, GeminiConfig};
use voice_support_persistence::JsonConversationMirror;
use voice_support_pipeline::{GoogleTts, GoogleTtsConfig, SpeechSynthesizer};

use crate::ServerError;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub orchestrator: Arc<SessionOrchestrator>,
    /// Concrete store, kept for the cleanup task
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    /// Assemble state from prebuilt parts
    pub fn new(
        config: Settings,
        orchestrator: SessionOrchestrator,
        sessions: Arc<SessionManager>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            sessions,
        }
    }

    /// Build production backends from settings
    ///
    /// Creates the audio directory and the history file when missing.
    pub async fn initialize(config: Settings) -> Result<Self, ServerError> {
        let llm = GeminiBackend::new(GeminiConfig::from_settings(&config.llm))
            .map_err(|e| ServerError::Startup(e.to_string()))?;
        tracing::info!(model = %config.llm.model, "Gemini backend ready");

        let tts = GoogleTts::new(GoogleTtsConfig::from_settings(&config.tts))
            .map_err(|e| ServerError::Startup(e.to_string()))?;
        let synthesizer = SpeechSynthesizer::new(Arc::new(tts), &config.tts.audio_dir);
        synthesizer
            .ensure_dir()
            .await
            .map_err(|e| ServerError::Startup(format!("audio directory: {}", e)))?;
        tracing::info!(
            endpoint = %config.tts.endpoint_url(),
            audio_dir = %config.tts.audio_dir,
            "Speech synthesizer ready"
        );

        let mirror = JsonConversationMirror::open(&config.storage.history_file)
            .await
            .map_err(|e| ServerError::Startup(e.to_string()))?;

        let sessions = Arc::new(SessionManager::from_config(&config.sessions));
        let orchestrator = SessionOrchestrator::new(
            sessions.clone(),
            Arc::new(llm),
            synthesizer,
            Arc::new(mirror),
            config.persona.system_prompt.clone(),
        )
        .with_settings(&config);
        tracing::info!(
            persona = %config.persona.name,
            generation_budget_secs = config.llm.total_timeout_secs,
            synthesis_budget_secs = config.tts.total_timeout_secs,
            "Session orchestrator ready"
        );

        Ok(Self::new(config, orchestrator, sessions))
    }
}
