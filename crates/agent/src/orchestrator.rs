//! Session orchestrator
//!
//! Runs one conversational turn end to end:
//!
//! 1. validate input and resolve the session
//! 2. detect the query language (never fails the turn)
//! 3. record the user message and assemble the prompt
//! 4. generate the reply; on failure the user message stays recorded
//! 5. record the reply and mirror the transcript to disk (best effort)
//! 6. synthesize audio (best effort, reported as a warning)
//!
//! Generation and synthesis each run under their own time budget. Both
//! budgets together must stay below the HTTP request timeout, so a recorded
//! reply is always returned to the caller.
//!
//! All steps after session resolution run while holding the session lock, so
//! concurrent turns on one session are serialized.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use voice_support_config::Settings;
use voice_support_core::{
    ConversationRecord, Language, LanguageDetector, LanguageModel, Message, ScriptLanguageDetector,
};
use voice_support_llm::assemble;
use voice_support_persistence::ConversationMirror;
use voice_support_pipeline::{PipelineError, SpeechSynthesizer};

use crate::store::{is_valid_session_id, TranscriptStore};
use crate::AgentError;

const PREVIEW_CHARS: usize = 50;

/// Default budget for one generation, retries included
pub const DEFAULT_GENERATION_TIMEOUT: Duration = Duration::from_secs(60);
/// Default budget for synthesizing one reply
pub const DEFAULT_SYNTHESIS_TIMEOUT: Duration = Duration::from_secs(45);

/// Result of a successful turn
#[derive(Debug, Clone, PartialEq)]
pub struct AskOutcome {
    pub session_id: String,
    pub reply: String,
    pub detected_language: Language,
    /// Whether the session's audio file holds this reply
    pub audio_available: bool,
    /// Set when the reply was delivered without audio
    pub warning: Option<String>,
}

/// Coordinates store, detector, model, mirror and synthesizer
pub struct SessionOrchestrator {
    store: Arc<dyn TranscriptStore>,
    detector: Arc<dyn LanguageDetector>,
    llm: Arc<dyn LanguageModel>,
    synthesizer: SpeechSynthesizer,
    mirror: Arc<dyn ConversationMirror>,
    persona: String,
    generation_timeout: Duration,
    synthesis_timeout: Duration,
}

impl SessionOrchestrator {
    pub fn new(
        store: Arc<dyn TranscriptStore>,
        llm: Arc<dyn LanguageModel>,
        synthesizer: SpeechSynthesizer,
        mirror: Arc<dyn ConversationMirror>,
        persona: impl Into<String>,
    ) -> Self {
        Self {
            store,
            detector: Arc::new(ScriptLanguageDetector::new()),
            llm,
            synthesizer,
            mirror,
            persona: persona.into(),
            generation_timeout: DEFAULT_GENERATION_TIMEOUT,
            synthesis_timeout: DEFAULT_SYNTHESIS_TIMEOUT,
        }
    }

    /// Set the generation and synthesis budgets
    pub fn with_timeouts(mut self, generation: Duration, synthesis: Duration) -> Self {
        self.generation_timeout = generation;
        self.synthesis_timeout = synthesis;
        self
    }

    /// Apply the budgets from loaded settings
    pub fn with_settings(self, settings: &Settings) -> Self {
        self.with_timeouts(
            Duration::from_secs(settings.llm.total_timeout_secs),
            Duration::from_secs(settings.tts.total_timeout_secs),
        )
    }

    /// Replace the language detector
    pub fn with_detector(mut self, detector: Arc<dyn LanguageDetector>) -> Self {
        self.detector = detector;
        self
    }

    /// Transcript store backing this orchestrator
    pub fn store(&self) -> &Arc<dyn TranscriptStore> {
        &self.store
    }

    /// Start a new conversation seeded with the persona
    pub fn start_session(&self) -> Result<String, AgentError> {
        let session = self.store.create(&self.persona).map_err(|e| {
            metrics::counter!("voice_support_errors_total", "kind" => e.kind()).increment(1);
            e
        })?;
        Ok(session.id.clone())
    }

    /// Process one user turn
    pub async fn ask(&self, session_id: &str, text: &str) -> Result<AskOutcome, AgentError> {
        let result = self.run_turn(session_id, text).await;
        if let Err(e) = &result {
            metrics::counter!("voice_support_errors_total", "kind" => e.kind()).increment(1);
        }
        result
    }

    async fn run_turn(&self, session_id: &str, text: &str) -> Result<AskOutcome, AgentError> {
        let turn_start = Instant::now();

        if text.trim().is_empty() {
            return Err(AgentError::Validation("No input text provided".to_string()));
        }
        if session_id.trim().is_empty() {
            return Err(AgentError::InvalidSession("Invalid session ID".to_string()));
        }
        let session = self
            .store
            .get(session_id)
            .ok_or_else(|| AgentError::InvalidSession("Invalid session ID".to_string()))?;

        let mut transcript = session.lock().await;
        session.touch();

        let language = self.detector.detect_or_default(text);
        tracing::info!(
            session_id,
            language = language.code(),
            "Processing query: {}",
            preview(text)
        );

        transcript.push_user(text);
        let prompt = assemble(&transcript, language);

        let llm_start = Instant::now();
        let reply = match tokio::time::timeout(self.generation_timeout, self.llm.generate(&prompt))
            .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::error!(session_id, model = self.llm.model_name(), error = %e, "Generation failed");
                return Err(AgentError::Inference(e.to_string()));
            },
            Err(_) => {
                tracing::error!(
                    session_id,
                    model = self.llm.model_name(),
                    budget_ms = self.generation_timeout.as_millis() as u64,
                    "Generation timed out"
                );
                return Err(AgentError::Inference(format!(
                    "generation timed out after {:?}",
                    self.generation_timeout
                )));
            },
        };
        metrics::histogram!("voice_support_llm_latency_ms")
            .record(llm_start.elapsed().as_millis() as f64);
        tracing::info!(session_id, "Generated reply: {}", preview(&reply));

        transcript.push_assistant(reply.clone());

        let record = ConversationRecord::snapshot(session_id, &transcript);
        if let Err(e) = self.mirror.save(&record).await {
            let e = AgentError::from(e);
            metrics::counter!("voice_support_errors_total", "kind" => e.kind()).increment(1);
            tracing::warn!(session_id, error = %e, "Failed to mirror conversation");
        }

        let tts_start = Instant::now();
        let synthesis = tokio::time::timeout(
            self.synthesis_timeout,
            self.synthesizer.synthesize_to_file(session_id, &reply, language),
        )
        .await
        .unwrap_or_else(|_| {
            Err(PipelineError::Tts(format!(
                "timed out after {:?}",
                self.synthesis_timeout
            )))
        });
        let (audio_available, warning) = match synthesis {
            Ok(path) => {
                metrics::histogram!("voice_support_tts_latency_ms")
                    .record(tts_start.elapsed().as_millis() as f64);
                tracing::debug!(session_id, path = %path.display(), "Audio ready");
                (true, None)
            },
            Err(e) => {
                // A dropped synthesis can still have renamed its file into place
                if let Err(cleanup) = self.synthesizer.remove_audio(session_id).await {
                    tracing::warn!(session_id, error = %cleanup, "Failed to remove stale audio");
                }
                let e = AgentError::from(e);
                metrics::counter!("voice_support_errors_total", "kind" => e.kind()).increment(1);
                tracing::warn!(session_id, error = %e, "Audio unavailable for this reply");
                (false, Some(e.to_string()))
            },
        };

        drop(transcript);
        session.touch();

        metrics::histogram!("voice_support_turn_latency_ms")
            .record(turn_start.elapsed().as_millis() as f64);

        Ok(AskOutcome {
            session_id: session_id.to_string(),
            reply,
            detected_language: language,
            audio_available,
            warning,
        })
    }

    /// Non-system history of a session
    pub async fn history(&self, session_id: &str) -> Result<Vec<Message>, AgentError> {
        self.store
            .history(session_id)
            .await
            .ok_or(AgentError::SessionNotFound)
    }

    /// Path of the session's latest audio, if one has been written
    ///
    /// Ids that do not look like generated session ids are rejected before
    /// touching the filesystem.
    pub async fn audio_file(&self, session_id: &str) -> Result<PathBuf, AgentError> {
        if !is_valid_session_id(session_id) {
            return Err(AgentError::SessionNotFound);
        }
        let path = self.synthesizer.audio_path(session_id);
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(path),
            _ => Err(AgentError::SessionNotFound),
        }
    }

    /// Live session count
    pub fn session_count(&self) -> usize {
        self.store.count()
    }
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}
