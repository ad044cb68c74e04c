//! Error types shared by the backend traits

use thiserror::Error;

/// Core errors
///
/// Backend crates keep their own richer error enums and convert into this
/// one at the trait boundary.
#[derive(Error, Debug)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("TTS error: {0}")]
    Tts(String),

    #[error("Language detection error: {0}")]
    LanguageDetection(String),

    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout")]
    Timeout,
}

pub type Result<T> = std::result::Result<T, Error>;
