//! Configuration management for the voice support backend
//!
//! Supports loading configuration from:
//! - YAML/TOML files under `config/`
//! - Environment variables (VOICE_SUPPORT__ prefix)
//! - `GEMINI_API_KEY` for the model credential

pub mod persona;
pub mod settings;

pub use persona::{PersonaConfig, DEFAULT_SYSTEM_PROMPT};
pub use settings::{
    load_settings, LlmSettings, ObservabilityConfig, ServerConfig, SessionConfig, Settings,
    StorageConfig, TtsSettings, API_KEY_ENV,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
