//! Reply-to-speech pipeline
//!
//! This crate turns an assistant reply into an MP3 file on disk:
//! - Markup stripping (bold / italic asterisks)
//! - Sentence-aware chunking for the speech endpoint's length limit
//! - Google Translate speech backend
//! - Per-session audio file management with atomic replacement

pub mod tts;

pub use tts::{
    chunk_text, strip_markup, GoogleTts, GoogleTtsConfig, SpeechSynthesizer, MAX_CHUNK_CHARS,
};

use thiserror::Error;

/// Pipeline errors
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Nothing to synthesize")]
    EmptyText,

    #[error("Timeout")]
    Timeout,

    #[error("IO error: {0}")]
    Io(String),
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<voice_support_core::Error> for PipelineError {
    fn from(err: voice_support_core::Error) -> Self {
        match err {
            voice_support_core::Error::Timeout => PipelineError::Timeout,
            voice_support_core::Error::UnsupportedLanguage(lang) => {
                PipelineError::UnsupportedLanguage(lang)
            },
            voice_support_core::Error::Tts(msg) => PipelineError::Tts(msg),
            other => PipelineError::Tts(other.to_string()),
        }
    }
}

impl From<PipelineError> for voice_support_core::Error {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Timeout => voice_support_core::Error::Timeout,
            PipelineError::UnsupportedLanguage(lang) => {
                voice_support_core::Error::UnsupportedLanguage(lang)
            },
            PipelineError::Tts(msg) => voice_support_core::Error::Tts(msg),
            other => voice_support_core::Error::Tts(other.to_string()),
        }
    }
}
