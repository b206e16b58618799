use serde::{Deserialize, Serialize};
use std::fmt;

fn default_token_ttl_seconds() -> u64 {
    3600
}

fn default_agent_identity() -> String {
    "form-filler-agent".to_string()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for LiveKit join tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
    /// Participant identity the agent joins rooms under.
    #[serde(default = "default_agent_identity")]
    pub agent_identity: String,
}

impl Default for LiveKitConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            token_ttl_seconds: default_token_ttl_seconds(),
            agent_identity: default_agent_identity(),
        }
    }
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .field("agent_identity", &self.agent_identity)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }
}

const DEFAULT_INSTRUCTIONS: &str = "You are a friendly form filler assistant for an ice cream party. \
Your jobs are to ask for the user's name, phone number, and email. \
You will need to use the tools provided to you to fill out the form. \
After confirming a response, do not say you are setting the value, just move on to the next question.";

const DEFAULT_GREETING: &str =
    "Hello! I'm here to help you sign up for the ice cream party. What's your name?";

fn default_instructions() -> String {
    DEFAULT_INSTRUCTIONS.to_string()
}

fn default_greeting() -> String {
    DEFAULT_GREETING.to_string()
}

fn default_llm_model() -> String {
    "gpt-4.1".to_string()
}

fn default_stt_model() -> String {
    "nova-3".to_string()
}

fn default_stt_language() -> String {
    "multi".to_string()
}

fn default_tts_voice() -> String {
    "ash".to_string()
}

fn default_vad() -> String {
    "silero".to_string()
}

fn default_max_tool_steps() -> usize {
    5
}

/// The agent's persona and the hosted pipeline it runs on.
///
/// Model names are passed through to the external agent runtime; nothing
/// here runs speech or language models locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// System instructions for the language model.
    #[serde(default = "default_instructions")]
    pub instructions: String,
    /// What the agent says when it enters the room.
    #[serde(default = "default_greeting")]
    pub greeting: String,
    #[serde(default = "default_llm_model")]
    pub llm_model: String,
    #[serde(default = "default_stt_model")]
    pub stt_model: String,
    #[serde(default = "default_stt_language")]
    pub stt_language: String,
    #[serde(default = "default_tts_voice")]
    pub tts_voice: String,
    #[serde(default = "default_vad")]
    pub vad: String,
    /// Maximum number of tool calls executed in one model turn.
    #[serde(default = "default_max_tool_steps")]
    pub max_tool_steps: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            greeting: default_greeting(),
            llm_model: default_llm_model(),
            stt_model: default_stt_model(),
            stt_language: default_stt_language(),
            tts_voice: default_tts_voice(),
            vad: default_vad(),
            max_tool_steps: default_max_tool_steps(),
        }
    }
}
