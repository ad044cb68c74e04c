//! Speech synthesis trait

use async_trait::async_trait;

use crate::Result;

/// Text-to-Speech interface
///
/// Implementations:
/// - `GoogleTts` - Google Translate speech endpoint (MP3 output)
///
/// # Example
///
/// ```ignore
/// let tts: Arc<dyn TextToSpeech> = Arc::new(GoogleTts::new(config)?);
/// let mp3 = tts.synthesize("नमस्ते", "hi").await?;
/// ```
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize plain text into encoded audio bytes
    ///
    /// # Arguments
    /// * `text` - Text without markup
    /// * `language` - ISO 639-1 language tag
    async fn synthesize(&self, text: &str, language: &str) -> Result<Vec<u8>>;

    /// Language tags accepted by `synthesize`
    fn supported_languages(&self) -> &[&'static str];

    /// Get engine name for logging
    fn model_name(&self) -> &str;

    /// Check if a specific language tag is supported
    fn supports_language(&self, language: &str) -> bool {
        self.supported_languages().contains(&language)
    }
}
