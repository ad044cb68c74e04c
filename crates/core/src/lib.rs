//! Core traits and types for the voice support backend
//!
//! This crate provides foundational types used across all other crates:
//! - Core traits for pluggable backends (LLM, TTS, language detection)
//! - Language definitions and script-based detection
//! - Conversation types (messages, transcripts, persisted records)
//! - Error types

pub mod conversation;
pub mod error;
pub mod language;
pub mod traits;

pub use conversation::{ConversationRecord, Message, Role, Transcript};
pub use error::{Error, Result};
pub use language::{Language, Script, ScriptLanguageDetector};

pub use traits::{LanguageDetector, LanguageModel, TextToSpeech};
