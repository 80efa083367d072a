use std::fmt;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::http::post_json;
use crate::llm::provider::{
    FailureCause, MAX_TOKENS, Message, ProviderAdapter, ProviderError, ProviderId, Role,
    TEMPERATURE,
};

const ANTHROPIC_ORIGIN: &str = "https://api.anthropic.com";
const MESSAGES_PATH: &str = "/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Body for `POST /v1/messages`. System text travels outside `messages`.
#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<&'a Message>,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

#[derive(Clone)]
pub struct AnthropicChat {
    model: String,
    api_key: String,
    base_url: String,
    client: Client,
}

impl fmt::Debug for AnthropicChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicChat")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl AnthropicChat {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: api_key.into(),
            base_url: ANTHROPIC_ORIGIN.to_string(),
            client: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}{MESSAGES_PATH}", self.base_url.trim_end_matches('/'))
    }
}

fn build_request<'a>(model: &'a str, transcript: &'a [Message]) -> MessagesRequest<'a> {
    let (system, turns): (Vec<&Message>, Vec<&Message>) = transcript
        .iter()
        .partition(|message| message.role == Role::System);

    let system = (!system.is_empty()).then(|| {
        system
            .iter()
            .map(|message| message.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    });

    MessagesRequest {
        model,
        max_tokens: MAX_TOKENS,
        temperature: TEMPERATURE,
        system,
        messages: turns,
    }
}

impl ProviderAdapter for AnthropicChat {
    fn provider(&self) -> ProviderId {
        ProviderId::Anthropic
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn send_chat(&self, transcript: &[Message]) -> Result<String, ProviderError> {
        let payload = build_request(&self.model, transcript);
        debug!(
            provider = "anthropic",
            model = %self.model,
            messages = payload.messages.len(),
            has_system = payload.system.is_some(),
            "sending messages request"
        );

        let body: MessagesResponse =
            post_json(&self.client, &self.endpoint(), &payload, |request| {
                request
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", ANTHROPIC_VERSION)
            })
            .map_err(|cause| ProviderError::new(ProviderId::Anthropic, cause))?;

        body.content
            .into_iter()
            .next()
            .and_then(|block| block.text)
            .ok_or_else(|| {
                ProviderError::new(
                    ProviderId::Anthropic,
                    FailureCause::MissingField("content[0].text"),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_message_is_lifted_out_of_turns() {
        let transcript = [
            Message::system("You are terse."),
            Message::user("Hi"),
            Message::assistant("Hello"),
            Message::user("Bye"),
        ];
        let json = serde_json::to_value(build_request("claude", &transcript)).unwrap();

        assert_eq!(json["system"], "You are terse.");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[2]["content"], "Bye");
        assert_eq!(json["max_tokens"], 2000);
    }

    #[test]
    fn system_is_omitted_when_transcript_has_none() {
        let transcript = [Message::user("Hi")];
        let json = serde_json::to_value(build_request("claude", &transcript)).unwrap();
        assert!(json.get("system").is_none());
    }
}
