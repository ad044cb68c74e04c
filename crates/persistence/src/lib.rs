//! Persistence layer for voice-support
//!
//! Provides a write-mostly disk mirror of every session transcript:
//! - `ConversationMirror` trait (injectable, mockable)
//! - `JsonConversationMirror`, a single JSON array document

pub mod error;
pub mod mirror;

pub use error::PersistenceError;
pub use mirror::{ConversationMirror, JsonConversationMirror};
