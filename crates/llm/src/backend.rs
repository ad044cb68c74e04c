//! Gemini backend
//!
//! Calls the `models/{model}:generateContent` REST endpoint with a single
//! user turn containing the flattened prompt. Transient failures (network,
//! timeout, HTTP 429/5xx) are retried with exponential backoff.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_support_config::LlmSettings;
use voice_support_core::LanguageModel;

use crate::LlmError;

/// Gemini configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// Model ID
    pub model: String,
    /// API base URL (up to and including the version segment)
    pub endpoint: String,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: u32,
    /// Initial backoff duration (doubles each retry)
    pub initial_backoff: Duration,
    /// Sampling temperature
    pub temperature: Option<f32>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self::from_settings(&LlmSettings::default())
    }
}

impl GeminiConfig {
    /// Build from loaded settings; the key is resolved from the environment when unset
    pub fn from_settings(settings: &LlmSettings) -> Self {
        Self {
            api_key: settings.api_key().unwrap_or_default(),
            model: settings.model.clone(),
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(settings.timeout_secs),
            max_retries: settings.max_retries,
            initial_backoff: Duration::from_millis(settings.initial_backoff_ms),
            temperature: settings.temperature,
        }
    }

    /// Set API key
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    /// Set endpoint
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Upper bound on the delay between retries
const MAX_BACKOFF: Duration = Duration::from_secs(10);

fn next_backoff(current: Duration) -> Duration {
    current.saturating_mul(2).min(MAX_BACKOFF)
}

/// Gemini text-generation backend
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    config: GeminiConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend
    ///
    /// Fails when no API key is configured.
    pub fn new(config: GeminiConfig) -> Result<Self, LlmError> {
        if config.api_key.trim().is_empty() {
            return Err(LlmError::Configuration(
                "GEMINI_API_KEY not set. Set it via environment or config.".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn api_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint, self.config.model
        )
    }

    /// Generate a reply, retrying transient failures
    pub async fn generate_text(&self, prompt: &str) -> Result<String, LlmError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: self.config.temperature.map(|t| GenerationConfig {
                temperature: Some(t),
            }),
        };

        let start = Instant::now();
        let mut backoff = self.config.initial_backoff;
        let mut attempt = 0;

        loop {
            match self.execute_request(&request).await {
                Ok(text) => {
                    tracing::debug!(
                        model = %self.config.model,
                        attempts = attempt + 1,
                        latency_ms = start.elapsed().as_millis() as u64,
                        "Gemini generation complete"
                    );
                    return Ok(text);
                },
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        "LLM request failed, retrying in {:?} (attempt {}/{})",
                        backoff,
                        attempt,
                        self.config.max_retries
                    );
                    tokio::time::sleep(backoff).await;
                    backoff = next_backoff(backoff);
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Execute a single request (used by retry logic)
    async fn execute_request(&self, request: &GenerateContentRequest) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.api_url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        extract_text(parsed)
    }
}

#[async_trait]
impl LanguageModel for GeminiBackend {
    async fn generate(&self, prompt: &str) -> voice_support_core::Result<String> {
        Ok(self.generate_text(prompt).await?)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<ContentResponse>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn extract_text(response: GenerateContentResponse) -> Result<String, LlmError> {
    if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::InvalidResponse("no candidates in response".to_string()))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return match candidate.finish_reason {
            Some(reason) if reason != "STOP" => Err(LlmError::Blocked(reason)),
            _ => Err(LlmError::InvalidResponse("empty reply text".to_string())),
        };
    }

    Ok(text)
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .map(|wrapper| {
            let message = wrapper.error.message.unwrap_or_default();
            match wrapper.error.status {
                Some(status) if !status.is_empty() => format!("{}: {}", status, message),
                _ => message,
            }
        })
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string())
}
