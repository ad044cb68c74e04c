//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::{ConfigError, PersonaConfig};

/// Environment variable consulted when no API key is configured explicitly
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Language model configuration
    #[serde(default)]
    pub llm: LlmSettings,

    /// Speech synthesis configuration
    #[serde(default)]
    pub tts: TtsSettings,

    /// Conversation history file
    #[serde(default)]
    pub storage: StorageConfig,

    /// Session lifecycle limits
    #[serde(default)]
    pub sessions: SessionConfig,

    /// Assistant persona
    #[serde(default)]
    pub persona: PersonaConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Validate the loaded settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "must be non-zero"));
        }
        if self.server.timeout_seconds == 0 {
            return Err(invalid("server.timeout_seconds", "must be non-zero"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(invalid("llm.model", "must not be empty"));
        }
        if self.llm.timeout_secs == 0 {
            return Err(invalid("llm.timeout_secs", "must be non-zero"));
        }
        if self.llm.total_timeout_secs < self.llm.timeout_secs {
            return Err(invalid(
                "llm.total_timeout_secs",
                "must be at least llm.timeout_secs",
            ));
        }
        if self.tts.timeout_secs == 0 {
            return Err(invalid("tts.timeout_secs", "must be non-zero"));
        }
        if self.tts.total_timeout_secs < self.tts.timeout_secs {
            return Err(invalid(
                "tts.total_timeout_secs",
                "must be at least tts.timeout_secs",
            ));
        }
        // A turn must finish inside the request timeout or its reply is lost
        if self.llm.total_timeout_secs + self.tts.total_timeout_secs >= self.server.timeout_seconds {
            return Err(invalid(
                "server.timeout_seconds",
                "must exceed llm.total_timeout_secs + tts.total_timeout_secs",
            ));
        }
        if self.tts.audio_dir.trim().is_empty() {
            return Err(invalid("tts.audio_dir", "must not be empty"));
        }
        if self.storage.history_file.trim().is_empty() {
            return Err(invalid("storage.history_file", "must not be empty"));
        }
        if self.sessions.max_sessions == 0 {
            return Err(invalid("sessions.max_sessions", "must be non-zero"));
        }
        if self.sessions.idle_timeout_secs == 0 {
            return Err(invalid("sessions.idle_timeout_secs", "must be non-zero"));
        }
        if self.sessions.cleanup_interval_secs == 0 {
            return Err(invalid("sessions.cleanup_interval_secs", "must be non-zero"));
        }
        if self.persona.system_prompt.trim().is_empty() {
            return Err(invalid("persona.system_prompt", "must not be empty"));
        }
        if self.llm.api_key().is_none() {
            return Err(ConfigError::MissingField(format!(
                "llm.api_key (set {} or VOICE_SUPPORT__LLM__API_KEY)",
                API_KEY_ENV
            )));
        }
        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        message: message.to_string(),
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP server host
    #[serde(default = "default_host")]
    pub host: String,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_seconds: u64,

    /// CORS allowed origins (empty = any origin)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_request_timeout() -> u64 {
    120
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            timeout_seconds: default_request_timeout(),
            cors_origins: Vec::new(),
        }
    }
}

/// Language model settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmSettings {
    /// API key; falls back to `GEMINI_API_KEY`
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model ID
    #[serde(default = "default_model")]
    pub model: String,

    /// API base URL
    #[serde(default = "default_llm_endpoint")]
    pub endpoint: String,

    /// Per-attempt timeout in seconds
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Budget for one generation including retries and backoff
    #[serde(default = "default_llm_total_timeout")]
    pub total_timeout_secs: u64,

    /// Retries for transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Initial backoff, doubled after each retry
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Sampling temperature (provider default when unset)
    #[serde(default)]
    pub temperature: Option<f32>,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}
fn default_llm_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_llm_timeout() -> u64 {
    25
}
fn default_llm_total_timeout() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}
fn default_initial_backoff_ms() -> u64 {
    250
}

impl LlmSettings {
    /// Resolved API key: explicit setting first, then the environment
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok().filter(|k| !k.trim().is_empty()))
    }
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            endpoint: default_llm_endpoint(),
            timeout_secs: default_llm_timeout(),
            total_timeout_secs: default_llm_total_timeout(),
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            temperature: None,
        }
    }
}

/// Speech synthesis settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TtsSettings {
    /// Base URL of the Google Translate host, without the TLD
    #[serde(default = "default_tts_host")]
    pub host: String,

    /// Top-level domain of the Google host (accent selection)
    #[serde(default = "default_tld")]
    pub tld: String,

    /// Slow speech
    #[serde(default)]
    pub slow: bool,

    /// Per-request timeout in seconds
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// Budget for synthesizing one reply, all chunks included
    #[serde(default = "default_tts_total_timeout")]
    pub total_timeout_secs: u64,

    /// Directory holding one audio file per session
    #[serde(default = "default_audio_dir")]
    pub audio_dir: String,

    /// Full endpoint override (tests and proxies); replaces host + tld
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_tts_host() -> String {
    "https://translate.google".to_string()
}
fn default_tld() -> String {
    "com".to_string()
}
fn default_tts_timeout() -> u64 {
    15
}
fn default_tts_total_timeout() -> u64 {
    45
}
fn default_audio_dir() -> String {
    "audio".to_string()
}

impl TtsSettings {
    /// Resolved `translate_tts` URL
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(url) => url.clone(),
            None => format!("{}.{}/translate_tts", self.host, self.tld),
        }
    }
}

impl Default for TtsSettings {
    fn default() -> Self {
        Self {
            host: default_tts_host(),
            tld: default_tld(),
            slow: false,
            timeout_secs: default_tts_timeout(),
            total_timeout_secs: default_tts_total_timeout(),
            audio_dir: default_audio_dir(),
            endpoint: None,
        }
    }
}

/// Conversation history file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_history_file")]
    pub history_file: String,
}

fn default_history_file() -> String {
    "conversation_history.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            history_file: default_history_file(),
        }
    }
}

/// Session lifecycle limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Maximum live sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Idle time after which a session is evicted
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Interval of the background cleanup task
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
}

fn default_max_sessions() -> usize {
    10_000
}
fn default_idle_timeout() -> u64 {
    86_400
}
fn default_cleanup_interval() -> u64 {
    300
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_sessions: default_max_sessions(),
            idle_timeout_secs: default_idle_timeout(),
            cleanup_interval_secs: default_cleanup_interval(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (VOICE_SUPPORT__ prefix, `__` separator)
/// 2. config/{env}.yaml|toml (if env specified)
/// 3. config/default.yaml|toml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder.add_source(File::with_name("config/default").required(false));

    if let Some(env_name) = env {
        builder =
            builder.add_source(File::with_name(&format!("config/{}", env_name)).required(false));
    }

    builder = builder.add_source(
        Environment::with_prefix("VOICE_SUPPORT")
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.llm.api_key = Some("test-key".to_string());
        settings
    }

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 5000);
        assert_eq!(settings.llm.model, "gemini-2.0-flash");
        assert_eq!(settings.tts.audio_dir, "audio");
        assert_eq!(settings.storage.history_file, "conversation_history.json");
        assert_eq!(settings.persona.name, "Alex");
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = valid_settings();
        assert!(settings.validate().is_ok());

        settings.sessions.max_sessions = 0;
        assert!(settings.validate().is_err());

        settings.sessions.max_sessions = 10;
        settings.llm.model = "  ".to_string();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_session_intervals_must_be_non_zero() {
        let mut settings = valid_settings();
        settings.sessions.cleanup_interval_secs = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "sessions.cleanup_interval_secs"
        ));

        let mut settings = valid_settings();
        settings.sessions.idle_timeout_secs = 0;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "sessions.idle_timeout_secs"
        ));
    }

    #[test]
    fn test_turn_budgets_fit_request_timeout() {
        let mut settings = valid_settings();
        assert!(
            settings.llm.total_timeout_secs + settings.tts.total_timeout_secs
                < settings.server.timeout_seconds
        );

        settings.server.timeout_seconds = 90;
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "server.timeout_seconds"
        ));

        let mut settings = valid_settings();
        settings.llm.total_timeout_secs = settings.llm.timeout_secs - 1;
        assert!(settings.validate().is_err());

        let mut settings = valid_settings();
        settings.tts.total_timeout_secs = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let settings = valid_settings();
        assert_eq!(settings.llm.api_key().as_deref(), Some("test-key"));
    }

    #[test]
    fn test_tts_endpoint_url() {
        let mut tts = TtsSettings::default();
        assert_eq!(tts.endpoint_url(), "https://translate.google.com/translate_tts");

        tts.tld = "co.in".to_string();
        assert_eq!(tts.endpoint_url(), "https://translate.google.co.in/translate_tts");

        tts.endpoint = Some("http://127.0.0.1:9000/tts".to_string());
        assert_eq!(tts.endpoint_url(), "http://127.0.0.1:9000/tts");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "server:\n  port: 8080\nllm:\n  api_key: abc\n";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.llm.max_retries, 2);
        assert!(settings.validate().is_ok());
    }
}
