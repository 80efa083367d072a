use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use reqwest::StatusCode;

use crate::llm::provider::{FailureCause, Message, ProviderAdapter, ProviderError, ProviderId};

/// Adapter that replays queued replies and records each transcript it was sent.
#[derive(Debug, Clone)]
pub(crate) struct ScriptedAdapter {
    provider: ProviderId,
    replies: Rc<RefCell<VecDeque<Result<String, StatusCode>>>>,
    pub(crate) seen: Rc<RefCell<Vec<Vec<Message>>>>,
}

impl ScriptedAdapter {
    pub(crate) fn new(provider: ProviderId) -> Self {
        Self {
            provider,
            replies: Rc::default(),
            seen: Rc::default(),
        }
    }

    pub(crate) fn reply(self, text: &str) -> Self {
        self.replies.borrow_mut().push_back(Ok(text.to_string()));
        self
    }

    pub(crate) fn fail(self, status: StatusCode) -> Self {
        self.replies.borrow_mut().push_back(Err(status));
        self
    }
}

impl ProviderAdapter for ScriptedAdapter {
    fn provider(&self) -> ProviderId {
        self.provider
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    fn send_chat(&self, transcript: &[Message]) -> Result<String, ProviderError> {
        self.seen.borrow_mut().push(transcript.to_vec());
        match self.replies.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(status)) => Err(ProviderError::new(
                self.provider,
                FailureCause::Api {
                    status,
                    body: "scripted failure".to_string(),
                },
            )),
            None => Err(ProviderError::new(
                self.provider,
                FailureCause::MissingField("scripted reply"),
            )),
        }
    }
}
