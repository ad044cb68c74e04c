//! Prompt Building
//!
//! The model receives one flat string per turn: persona, a language
//! directive, the rendered history and the latest user query. The whole
//! history is re-sent on every turn, so prompt size grows linearly with the
//! number of turns.

use voice_support_core::{Language, Role, Transcript};

/// Builds the flat prompt for one turn
pub struct PromptBuilder<'a> {
    transcript: &'a Transcript,
    language: Language,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder over a transcript whose last message is the new user query
    pub fn new(transcript: &'a Transcript) -> Self {
        Self {
            transcript,
            language: Language::English,
        }
    }

    /// Set the language the reply must be written in
    pub fn respond_in(mut self, language: Language) -> Self {
        self.language = language.response_language();
        self
    }

    /// Render the prompt
    pub fn build(&self) -> String {
        let query = self.latest_user_text();

        let Some(system) = self.transcript.system_message() else {
            return format!("Respond in {}. User query: {}", self.language.name(), query);
        };

        let history = self
            .transcript
            .messages()
            .iter()
            .filter(|m| !m.is_system())
            .map(|m| format!("{}: {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "{persona}\n\nRespond in {language}.\n\nConversation history:\n{history}\n\nUser: {query}",
            persona = system.content,
            language = self.language.name(),
            history = history,
            query = query,
        )
    }

    fn latest_user_text(&self) -> &str {
        self.transcript
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }
}

/// Shorthand for `PromptBuilder::new(transcript).respond_in(language).build()`
pub fn assemble(transcript: &Transcript, language: Language) -> String {
    PromptBuilder::new(transcript).respond_in(language).build()
}
