//! Chat-completion provider abstraction.
//!
//! The handler only sees [`ChatProvider`], so the OpenAI client and the mock
//! used by tests are interchangeable.

pub mod mock;
pub mod openai;

use async_trait::async_trait;
use thiserror::Error;

pub use mock::MockChatProvider;
pub use openai::{OpenAiChatConfig, OpenAiChatProvider};

use crate::services::prompt::{MAX_TOKENS, TEMPERATURE};

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Rate limited")]
    RateLimited,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

/// Sampling settings for one completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionParams {
    pub temperature: f64,
    pub max_tokens: u32,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }
}

#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send one system/user message pair in JSON mode and return the raw text reply.
    async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        params: &CompletionParams,
    ) -> Result<String, ProviderError>;
}
