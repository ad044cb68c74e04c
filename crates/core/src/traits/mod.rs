//! Core traits for the voice support backend
//!
//! Every external collaborator sits behind one of these traits so that
//! backends can be swapped and mocked in tests.
//!
//! ```text
//! Language Models:
//!   - LanguageModel: prompt → reply text
//!
//! Speech:
//!   - TextToSpeech: text + language → encoded audio
//!
//! Text Processing:
//!   - LanguageDetector: text → language
//! ```

mod llm;
mod speech;
mod text_processing;

pub use llm::LanguageModel;
pub use speech::TextToSpeech;
pub use text_processing::LanguageDetector;
