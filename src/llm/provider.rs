use std::fmt;
use std::str::FromStr;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ChatSettings, ConfigError};
use crate::llm::anthropic::AnthropicChat;
use crate::llm::ollama::OllamaChat;
use crate::llm::openai_compat::ChatCompletions;

/// Sampling temperature sent to every hosted provider.
pub const TEMPERATURE: f32 = 0.7;
/// Output token cap sent to every hosted provider.
pub const MAX_TOKENS: u32 = 2000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Groq,
    Openai,
    Anthropic,
    Ollama,
}

impl ProviderId {
    pub const ALL: [ProviderId; 4] = [Self::Groq, Self::Openai, Self::Anthropic, Self::Ollama];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::Openai => "openai",
            Self::Anthropic => "anthropic",
            Self::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == normalized)
            .ok_or_else(|| ConfigError::UnsupportedProvider {
                value: value.to_string(),
            })
    }
}

/// Environment variable holding the credential, `None` for local providers.
pub fn api_key_env(provider: ProviderId) -> Option<&'static str> {
    match provider {
        ProviderId::Groq => Some("GROQ_API_KEY"),
        ProviderId::Openai => Some("OPENAI_API_KEY"),
        ProviderId::Anthropic => Some("ANTHROPIC_API_KEY"),
        ProviderId::Ollama => None,
    }
}

pub fn model_env(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Groq => "GROQ_MODEL",
        ProviderId::Openai => "OPENAI_MODEL",
        ProviderId::Anthropic => "ANTHROPIC_MODEL",
        ProviderId::Ollama => "OLLAMA_MODEL",
    }
}

pub fn default_model(provider: ProviderId) -> &'static str {
    match provider {
        ProviderId::Groq => "llama3-8b-8192",
        ProviderId::Openai => "gpt-4o-mini",
        ProviderId::Anthropic => "claude-3-5-sonnet-latest",
        ProviderId::Ollama => "llama3.1",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One transcript entry, sent verbatim to chat-style APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FailureCause {
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: StatusCode, body: String },
    #[error("response did not contain {0}")]
    MissingField(&'static str),
}

#[derive(Debug, Error)]
#[error("{provider} request failed: {cause}")]
pub struct ProviderError {
    pub provider: ProviderId,
    #[source]
    pub cause: FailureCause,
}

impl ProviderError {
    pub fn new(provider: ProviderId, cause: impl Into<FailureCause>) -> Self {
        Self {
            provider,
            cause: cause.into(),
        }
    }
}

/// Translates a normalized transcript into one provider's wire call.
pub trait ProviderAdapter: fmt::Debug {
    fn provider(&self) -> ProviderId;

    fn model(&self) -> &str;

    /// Sends the whole transcript and returns the assistant reply text.
    fn send_chat(&self, transcript: &[Message]) -> Result<String, ProviderError>;
}

/// Picks the adapter for `settings.provider`. Hosted providers need a key.
pub fn build_adapter(settings: &ChatSettings) -> Result<Box<dyn ProviderAdapter>, ConfigError> {
    let provider = settings.provider;
    let model = settings.model.clone();

    let adapter: Box<dyn ProviderAdapter> = match provider {
        ProviderId::Groq => Box::new(ChatCompletions::groq(model, required_key(settings)?)),
        ProviderId::Openai => Box::new(ChatCompletions::openai(model, required_key(settings)?)),
        ProviderId::Anthropic => Box::new(AnthropicChat::new(model, required_key(settings)?)),
        ProviderId::Ollama => Box::new(OllamaChat::new(model)),
    };
    Ok(adapter)
}

fn required_key(settings: &ChatSettings) -> Result<String, ConfigError> {
    let key_env = api_key_env(settings.provider).ok_or(ConfigError::NotApplicable {
        provider: settings.provider,
    })?;
    settings
        .api_key
        .clone()
        .ok_or(ConfigError::MissingCredential {
            provider: settings.provider,
            key_env,
        })
}
