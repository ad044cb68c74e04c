//! Text-to-speech
//!
//! Features:
//! - `strip_markup` removes emphasis asterisks before synthesis
//! - `chunk_text` splits long replies on sentence and clause boundaries
//! - `GoogleTts` fetches MP3 audio for each chunk
//! - `SpeechSynthesizer` writes one audio file per session

mod chunker;
mod google;
mod markup;
mod synthesizer;

pub use chunker::{chunk_text, MAX_CHUNK_CHARS};
pub use google::{GoogleTts, GoogleTtsConfig};
pub use markup::strip_markup;
pub use synthesizer::SpeechSynthesizer;
