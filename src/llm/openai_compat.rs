use std::fmt;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::http::post_json;
use crate::llm::provider::{
    FailureCause, MAX_TOKENS, Message, ProviderAdapter, ProviderError, ProviderId, TEMPERATURE,
};

const GROQ_ORIGIN: &str = "https://api.groq.com/openai";
const OPENAI_ORIGIN: &str = "https://api.openai.com";
const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<AssistantMessage>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    content: Option<String>,
}

/// Chat-completions adapter shared by Groq and OpenAI, whose APIs have the same shape.
#[derive(Clone)]
pub struct ChatCompletions {
    provider: ProviderId,
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl fmt::Debug for ChatCompletions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatCompletions")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ChatCompletions {
    pub fn groq(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new(ProviderId::Groq, GROQ_ORIGIN, model.into(), api_key.into())
    }

    pub fn openai(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::new(ProviderId::Openai, OPENAI_ORIGIN, model.into(), api_key.into())
    }

    fn new(provider: ProviderId, origin: &str, model: String, api_key: String) -> Self {
        Self {
            provider,
            model,
            api_key,
            base_url: origin.to_string(),
            client: Client::new(),
        }
    }

    /// Points the adapter at another origin; `/v1/chat/completions` is appended.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}{CHAT_COMPLETIONS_PATH}",
            self.base_url.trim_end_matches('/')
        )
    }
}

impl ProviderAdapter for ChatCompletions {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn send_chat(&self, transcript: &[Message]) -> Result<String, ProviderError> {
        let payload = ChatCompletionRequest {
            model: &self.model,
            messages: transcript,
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };
        debug!(
            provider = %self.provider,
            model = %self.model,
            messages = transcript.len(),
            "sending chat completion request"
        );

        let body: ChatCompletionResponse =
            post_json(&self.client, &self.endpoint(), &payload, |request| {
                request.bearer_auth(&self.api_key)
            })
            .map_err(|cause| ProviderError::new(self.provider, cause))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ProviderError::new(
                    self.provider,
                    FailureCause::MissingField("choices[0].message.content"),
                )
            })
    }
}
