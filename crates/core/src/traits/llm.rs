//! Language Model trait

use async_trait::async_trait;

use crate::Result;

/// Language Model interface
///
/// The conversation is flattened into a single prompt by the caller, so the
/// model is a plain text-completion function.
///
/// Implementations:
/// - `GeminiBackend` - Google Gemini `generateContent` API
///
/// # Example
///
/// ```ignore
/// let llm: Arc<dyn LanguageModel> = Arc::new(GeminiBackend::new(config)?);
/// let reply = llm.generate("You are Alex...\n\nUser: hello").await?;
/// ```
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Generate a completion for the prompt
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Get model name for logging
    fn model_name(&self) -> &str;
}
