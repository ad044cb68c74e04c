//! Assistant persona

use serde::{Deserialize, Serialize};

/// Default persona: a friendly customer support agent
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are a helpful and friendly customer support agent. Your name is Alex.
Your goal is to assist customers with their queries in a natural, conversational manner.
Be empathetic, patient, and thorough in your responses.
Keep your answers concise but complete.
If you don't know something, be honest about it.
Use a friendly, conversational tone throughout the interaction.
Avoid using markdown formatting in your responses.
Your responses should be in a conversational tone, and you should use a friendly, empathetic tone throughout the interaction.
";

/// Persona configuration
///
/// `system_prompt` becomes the first message of every new transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaConfig {
    /// Agent name, used in logs
    #[serde(default = "default_persona_name")]
    pub name: String,

    /// Persona instructions
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

fn default_persona_name() -> String {
    "Alex".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

impl Default for PersonaConfig {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            system_prompt: default_system_prompt(),
        }
    }
}
