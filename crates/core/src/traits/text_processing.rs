//! Text processing traits

use crate::{Language, Result};

/// Language identification interface
///
/// Implementations:
/// - `ScriptLanguageDetector` - Unicode script ratios plus a Marathi lexicon
pub trait LanguageDetector: Send + Sync + 'static {
    /// Detect the language of `text`
    ///
    /// Fails when the input carries no usable signal.
    fn detect(&self, text: &str) -> Result<Language>;

    /// Detector name for logging
    fn name(&self) -> &str;

    /// Detect, falling back to English when detection fails
    fn detect_or_default(&self, text: &str) -> Language {
        match self.detect(text) {
            Ok(language) => language,
            Err(e) => {
                tracing::debug!(detector = self.name(), error = %e, "Language detection failed, defaulting to English");
                Language::default()
            },
        }
    }
}
