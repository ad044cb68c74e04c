//! Conversation types: roles, messages, transcripts and persisted records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Persona instructions, always the first message of a transcript
    System,
    /// Customer message
    User,
    /// Model reply
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }
}

/// Ordered message list of one session
///
/// Seeded with exactly one system message; every later message is appended
/// in chronological order and nothing is ever removed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Create a transcript holding only the persona message
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(system_prompt)],
        }
    }

    /// Rebuild a transcript from stored messages
    pub fn from_messages(messages: Vec<Message>) -> Self {
        Self { messages }
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.messages.push(Message::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.messages.push(Message::assistant(content));
    }

    /// All messages including the system message
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// First system message, if any
    pub fn system_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.is_system())
    }

    /// Externally visible history (system message excluded)
    pub fn history(&self) -> Vec<Message> {
        self.messages
            .iter()
            .filter(|m| !m.is_system())
            .cloned()
            .collect()
    }

    /// Number of messages with the given role
    pub fn count(&self, role: Role) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// One entry of the on-disk conversation history document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub session_id: String,
    /// Last write time
    pub timestamp: DateTime<Utc>,
    pub messages: Vec<Message>,
}

impl ConversationRecord {
    /// Snapshot a transcript, stamped with the current time
    pub fn snapshot(session_id: impl Into<String>, transcript: &Transcript) -> Self {
        Self {
            session_id: session_id.into(),
            timestamp: Utc::now(),
            messages: transcript.messages().to_vec(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_transcript_has_single_system_message() {
        let transcript = Transcript::new("You are Alex.");
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.count(Role::System), 1);
        assert!(transcript.history().is_empty());
    }

    #[test]
    fn test_history_excludes_system_and_keeps_order() {
        let mut transcript = Transcript::new("persona");
        transcript.push_user("hi");
        transcript.push_assistant("hello");
        transcript.push_user("how are you?");

        let history = transcript.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], Message::user("hi"));
        assert_eq!(history[1], Message::assistant("hello"));
        assert_eq!(history[2].role, Role::User);
        assert_eq!(transcript.system_message().map(|m| m.content.as_str()), Some("persona"));
    }

    #[test]
    fn test_message_serializes_with_lowercase_role() {
        let json = serde_json::to_value(Message::assistant("ok")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "ok"}));
    }

    #[test]
    fn test_record_round_trips_through_json() {
        let mut transcript = Transcript::new("persona");
        transcript.push_user("question");
        let record = ConversationRecord::snapshot("20240101120000-abc", &transcript);

        let json = serde_json::to_string(&record).unwrap();
        let parsed: ConversationRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, record);
        assert!(json.contains("\"session_id\":\"20240101120000-abc\""));
    }
}
