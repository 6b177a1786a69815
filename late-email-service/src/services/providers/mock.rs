//! Mock provider for tests and local runs without network access.

use super::{ChatProvider, CompletionParams, ProviderError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};

enum MockReply {
    Raw(String),
    Fail(String),
    /// Wrap the user prompt in a valid email object.
    Echo,
}

pub struct MockChatProvider {
    reply: MockReply,
    calls: AtomicUsize,
}

impl MockChatProvider {
    /// Always return `raw` as the model output.
    pub fn replying(raw: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Raw(raw.into()))
    }

    /// Always fail with an API error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_reply(MockReply::Fail(message.into()))
    }

    /// Return `{"subject": "Echo", "body": <user prompt>}`.
    pub fn echoing() -> Self {
        Self::with_reply(MockReply::Echo)
    }

    fn with_reply(reply: MockReply) -> Self {
        Self {
            reply,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _params: &CompletionParams,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.reply {
            MockReply::Raw(raw) => Ok(raw.clone()),
            MockReply::Fail(message) => Err(ProviderError::Api {
                status: 500,
                body: message.clone(),
            }),
            MockReply::Echo => Ok(serde_json::json!({
                "subject": "Echo",
                "body": user_prompt,
            })
            .to_string()),
        }
    }
}
