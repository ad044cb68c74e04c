//! Per-session audio files
//!
//! Each session owns exactly one file, `response_<session_id>.mp3`, which is
//! overwritten by every successful turn and removed as soon as a new turn
//! starts synthesizing, so it never holds an older reply. Audio is written to a unique
//! temporary file in the same directory and renamed into place, so readers
//! never observe a partially written file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use voice_support_core::{Language, TextToSpeech};

use super::markup::strip_markup;
use crate::PipelineError;

/// Writes the spoken form of a reply to the session's audio file
#[derive(Clone)]
pub struct SpeechSynthesizer {
    tts: Arc<dyn TextToSpeech>,
    audio_dir: PathBuf,
}

impl SpeechSynthesizer {
    pub fn new(tts: Arc<dyn TextToSpeech>, audio_dir: impl Into<PathBuf>) -> Self {
        Self {
            tts,
            audio_dir: audio_dir.into(),
        }
    }

    /// Audio directory
    pub fn audio_dir(&self) -> &Path {
        &self.audio_dir
    }

    /// Create the audio directory if missing
    pub async fn ensure_dir(&self) -> Result<(), PipelineError> {
        tokio::fs::create_dir_all(&self.audio_dir).await?;
        Ok(())
    }

    /// Location of a session's audio file
    pub fn audio_path(&self, session_id: &str) -> PathBuf {
        self.audio_dir.join(format!("response_{}.mp3", session_id))
    }

    /// Delete a session's audio file; a missing file is not an error
    pub async fn remove_audio(&self, session_id: &str) -> Result<(), PipelineError> {
        match tokio::fs::remove_file(self.audio_path(session_id)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Synthesize `reply` for `language` and replace the session's audio file
    ///
    /// The previous file is deleted first. On failure the session has no audio.
    pub async fn synthesize_to_file(
        &self,
        session_id: &str,
        reply: &str,
        language: Language,
    ) -> Result<PathBuf, PipelineError> {
        self.remove_audio(session_id).await?;

        let text = strip_markup(reply);
        if text.trim().is_empty() {
            return Err(PipelineError::EmptyText);
        }

        let code = language.tts_code();
        if !self.tts.supports_language(code) {
            return Err(PipelineError::UnsupportedLanguage(code.to_string()));
        }

        let start = Instant::now();
        let audio = self.tts.synthesize(&text, code).await?;
        if audio.is_empty() {
            return Err(PipelineError::Tts(format!(
                "{} returned no audio",
                self.tts.model_name()
            )));
        }

        self.ensure_dir().await?;
        let path = self.audio_path(session_id);
        let tmp = self
            .audio_dir
            .join(format!(".response_{}.{}.tmp", session_id, uuid::Uuid::new_v4().simple()));

        if let Err(e) = tokio::fs::write(&tmp, &audio).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        tracing::debug!(
            session_id,
            language = code,
            engine = self.tts.model_name(),
            bytes = audio.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Audio file written"
        );
        Ok(path)
    }
}
