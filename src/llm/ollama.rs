use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::http::post_json;
use crate::llm::provider::{FailureCause, Message, ProviderAdapter, ProviderError, ProviderId};

const OLLAMA_ORIGIN: &str = "http://localhost:11434";
const CHAT_PATH: &str = "/api/chat";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

/// Local Ollama server, non-streaming. No credential and no sampling knobs.
#[derive(Debug, Clone)]
pub struct OllamaChat {
    model: String,
    base_url: String,
    client: Client,
}

impl OllamaChat {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            base_url: OLLAMA_ORIGIN.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{CHAT_PATH}", self.base_url.trim_end_matches('/'))
    }
}

impl ProviderAdapter for OllamaChat {
    fn provider(&self) -> ProviderId {
        ProviderId::Ollama
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn send_chat(&self, transcript: &[Message]) -> Result<String, ProviderError> {
        let payload = ChatRequest {
            model: &self.model,
            messages: transcript,
            stream: false,
        };
        debug!(
            provider = "ollama",
            model = %self.model,
            messages = transcript.len(),
            "sending local chat request"
        );

        let body: ChatResponse = post_json(&self.client, &self.endpoint(), &payload, |request| request)
            .map_err(|cause| ProviderError::new(ProviderId::Ollama, cause))?;

        body.message
            .and_then(|message| message.content)
            .ok_or_else(|| {
                ProviderError::new(ProviderId::Ollama, FailureCause::MissingField("message.content"))
            })
    }
}
