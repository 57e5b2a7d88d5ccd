//! Provider trait — the abstraction over chat-completion backends.
//!
//! A Provider knows how to send an assembled message list to an LLM and get
//! the reply text back. The platform is multi-tenant: every owner brings
//! their own API key, so the key travels with each call rather than living
//! on the provider instance.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ChatMessage;

/// Configuration for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// The model to use (e.g., "deepseek/deepseek-chat")
    pub model: String,

    /// The assembled conversation messages
    pub messages: Vec<ChatMessage>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens to generate
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

/// The core Provider trait.
///
/// The response pipeline calls `complete()` without knowing which backend is
/// in use — pure polymorphism. Implementations normalize the provider's wire
/// format and error shapes into `ProviderError`.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a request under the given owner's API key and return the reply
    /// text (`choices[0].message.content` for OpenAI-compatible backends).
    async fn complete(
        &self,
        api_key: &str,
        request: CompletionRequest,
    ) -> std::result::Result<String, ProviderError>;
}
