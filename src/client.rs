//! Conversation state bound to one provider adapter.

use crate::config::{ChatSettings, ConfigError, Overrides};
use crate::llm::provider::{Message, ProviderAdapter, ProviderError, ProviderId, build_adapter};

/// Owns the transcript and the provider adapter chosen at construction.
///
/// The transcript always starts with one system message. `send` takes
/// `&mut self`, so calls are serialized by ownership; sharing a client across
/// threads requires wrapping it in a `Mutex`.
#[derive(Debug)]
pub struct ChatClient {
    adapter: Box<dyn ProviderAdapter>,
    system_prompt: String,
    transcript: Vec<Message>,
}

impl ChatClient {
    /// Builds a client from the process environment with no command-line overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(&ChatSettings::resolve(&Overrides::default())?)
    }

    pub fn new(settings: &ChatSettings) -> Result<Self, ConfigError> {
        let adapter = build_adapter(settings)?;
        Ok(Self::with_adapter(adapter, settings.system_prompt.clone()))
    }

    /// Binds an already-built adapter, e.g. a mocked transport.
    pub fn with_adapter(adapter: Box<dyn ProviderAdapter>, system_prompt: impl Into<String>) -> Self {
        let system_prompt = system_prompt.into();
        Self {
            transcript: vec![Message::system(system_prompt.clone())],
            adapter,
            system_prompt,
        }
    }

    pub fn provider(&self) -> ProviderId {
        self.adapter.provider()
    }

    pub fn model(&self) -> &str {
        self.adapter.model()
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// Appends `text` as a user turn, sends the whole transcript, and records the reply.
    ///
    /// On failure the user turn stays in the transcript, so the next
    /// successful call also carries the unanswered question.
    pub fn send(&mut self, text: &str) -> Result<String, ProviderError> {
        self.transcript.push(Message::user(text));
        let reply = self.adapter.send_chat(&self.transcript)?;
        self.transcript.push(Message::assistant(reply.clone()));
        Ok(reply)
    }

    /// Drops every turn, leaving only a fresh system message.
    pub fn clear_history(&mut self) {
        self.transcript.clear();
        self.transcript.push(Message::system(self.system_prompt.clone()));
    }
}
