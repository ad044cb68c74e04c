//! Google Translate speech backend
//!
//! Each chunk is fetched from the public `translate_tts` endpoint as MP3.
//! MP3 frames are self-delimiting, so the chunk payloads are concatenated
//! as-is into one playable stream.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use voice_support_config::TtsSettings;
use voice_support_core::TextToSpeech;

use super::chunker::{chunk_text, MAX_CHUNK_CHARS};
use crate::PipelineError;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/120.0 Safari/537.36";

const NORMAL_SPEED: &str = "1";
const SLOW_SPEED: &str = "0.24";

/// Language tags the endpoint accepts
const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "hi", "mr", "bn", "gu", "kn", "ml", "pa", "ta", "te", "ur", "ne", "ar", "de", "es",
    "fr", "it", "ja", "pt", "ru", "zh-CN",
];

/// Google speech configuration
#[derive(Debug, Clone)]
pub struct GoogleTtsConfig {
    /// Full `translate_tts` URL
    pub endpoint: String,
    /// Slow speech
    pub slow: bool,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for GoogleTtsConfig {
    fn default() -> Self {
        Self::from_settings(&TtsSettings::default())
    }
}

impl GoogleTtsConfig {
    pub fn from_settings(settings: &TtsSettings) -> Self {
        Self {
            endpoint: settings.endpoint_url(),
            slow: settings.slow,
            timeout: Duration::from_secs(settings.timeout_secs),
        }
    }
}

/// Google Translate text-to-speech client
#[derive(Clone)]
pub struct GoogleTts {
    client: Client,
    config: GoogleTtsConfig,
}

impl GoogleTts {
    pub fn new(config: GoogleTtsConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| PipelineError::Tts(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Fetch MP3 audio for `text`, chunk by chunk
    pub async fn fetch_mp3(&self, text: &str, language: &str) -> Result<Vec<u8>, PipelineError> {
        if !SUPPORTED_LANGUAGES.contains(&language) {
            return Err(PipelineError::UnsupportedLanguage(language.to_string()));
        }

        let chunks = chunk_text(text, MAX_CHUNK_CHARS);
        if chunks.is_empty() {
            return Err(PipelineError::EmptyText);
        }

        let total = chunks.len().to_string();
        let speed = if self.config.slow { SLOW_SPEED } else { NORMAL_SPEED };
        let mut audio = Vec::new();

        for (idx, chunk) in chunks.iter().enumerate() {
            let idx = idx.to_string();
            let textlen = chunk.chars().count().to_string();
            let response = self
                .client
                .get(&self.config.endpoint)
                .query(&[
                    ("ie", "UTF-8"),
                    ("q", chunk.as_str()),
                    ("tl", language),
                    ("total", total.as_str()),
                    ("idx", idx.as_str()),
                    ("textlen", textlen.as_str()),
                    ("client", "tw-ob"),
                    ("ttsspeed", speed),
                ])
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        PipelineError::Timeout
                    } else {
                        PipelineError::Tts(format!("request failed: {}", e))
                    }
                })?;

            let status = response.status();
            if !status.is_success() {
                return Err(PipelineError::Tts(format!(
                    "speech endpoint returned {} for chunk {}/{}",
                    status,
                    idx,
                    total
                )));
            }

            let bytes = response
                .bytes()
                .await
                .map_err(|e| PipelineError::Tts(format!("failed to read audio: {}", e)))?;
            if bytes.is_empty() {
                return Err(PipelineError::Tts(format!("empty audio for chunk {}", idx)));
            }
            audio.extend_from_slice(&bytes);
        }

        tracing::debug!(
            language,
            chunks = chunks.len(),
            bytes = audio.len(),
            "Speech synthesized"
        );
        Ok(audio)
    }
}

#[async_trait]
impl TextToSpeech for GoogleTts {
    async fn synthesize(&self, text: &str, language: &str) -> voice_support_core::Result<Vec<u8>> {
        Ok(self.fetch_mp3(text, language).await?)
    }

    fn supported_languages(&self) -> &[&'static str] {
        SUPPORTED_LANGUAGES
    }

    fn model_name(&self) -> &str {
        "google-translate-tts"
    }
}
