//! The AI response pipeline — one request/response cycle per inbound message.
//!
//! Every channel funnels through [`ResponsePipeline::respond`]: dashboard
//! chat, the Telegram webhook, and all WhatsApp provider webhooks share the
//! identical code path, so business-context and memory behavior is
//! channel-independent.
//!
//! The pipeline never returns an error to its caller. Configuration gaps and
//! upstream failures resolve to pre-written advisory strings: the end
//! customer on a messaging channel must always receive *some* reply.

pub mod context;

use std::sync::Arc;

use chrono::Utc;
use deskhand_core::provider::{CompletionRequest, Provider};
use deskhand_core::turn::{ConversationTurn, Direction};
use deskhand_core::{ChannelKind, ProviderError};
use deskhand_store::Store;
use tracing::{debug, warn};

/// Service name under which the LLM key is stored in api_keys.
pub const LLM_KEY_SERVICE: &str = "OpenRouter";

/// Advisory shown when the owner has not stored an LLM API key.
pub const MISSING_KEY_REPLY: &str = "Bot Not Active Yet 🚫 The bot is missing a required setup \
     key to work properly. Please add your OpenRouter API key in the API Settings.";

/// Advisory shown when the agent record cannot be found.
pub const MISSING_AGENT_REPLY: &str = "Error: AI configuration not found.";

/// Advisory shown when the LLM provider fails or misbehaves.
pub const TROUBLE_REPLY: &str = "Sorry, I'm having trouble connecting right now. \
     Please try again in a moment.";

/// Tunables for the LLM call and history window.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// How many recent turns the assembler pulls in.
    pub history_depth: usize,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            model: "deepseek/deepseek-chat".into(),
            temperature: 0.7,
            max_tokens: 2000,
            history_depth: 5,
        }
    }
}

/// The orchestrator tying store, context assembler, and provider together.
pub struct ResponsePipeline {
    store: Store,
    provider: Arc<dyn Provider>,
    settings: PipelineSettings,
}

impl ResponsePipeline {
    pub fn new(store: Store, provider: Arc<dyn Provider>, settings: PipelineSettings) -> Self {
        Self {
            store,
            provider,
            settings,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Generate a reply for one inbound message.
    ///
    /// Always returns a displayable, non-empty string. Persistence of the
    /// turn is best-effort: a failed history write is logged and never
    /// blocks the reply.
    pub async fn respond(
        &self,
        inbound_text: &str,
        owner_id: &str,
        agent_id: &str,
        channel: ChannelKind,
        sender_id: &str,
    ) -> String {
        // 1. The owner's LLM key. Missing key is a configuration state, not
        //    an error — the customer still gets an answer.
        let api_key = match self.store.api_key(owner_id, LLM_KEY_SERVICE).await {
            Ok(Some(key)) if !key.is_empty() => key,
            Ok(_) => return MISSING_KEY_REPLY.to_string(),
            Err(e) => {
                warn!(owner_id, error = %e, "API key lookup failed");
                return TROUBLE_REPLY.to_string();
            }
        };

        // 2. The agent's business context. Fails closed with an advisory.
        let agent = match self.store.agent(owner_id, agent_id).await {
            Ok(Some(agent)) => agent,
            Ok(None) => return MISSING_AGENT_REPLY.to_string(),
            Err(e) => {
                warn!(owner_id, agent_id, error = %e, "Agent lookup failed");
                return TROUBLE_REPLY.to_string();
            }
        };

        // 3. Datasets and history are additive context: failures degrade to
        //    empty, they never abort the reply.
        let datasets = match self.store.datasets_for_owner(owner_id).await {
            Ok(datasets) => datasets,
            Err(e) => {
                warn!(owner_id, error = %e, "Dataset fetch failed, continuing without");
                Vec::new()
            }
        };
        let recent = match self
            .store
            .recent_turns(
                owner_id,
                agent_id,
                channel,
                sender_id,
                self.settings.history_depth,
            )
            .await
        {
            Ok(turns) => turns,
            Err(e) => {
                warn!(owner_id, agent_id, error = %e, "History fetch failed, continuing without");
                Vec::new()
            }
        };

        let messages = context::assemble(&agent.business_info, &datasets, &recent, inbound_text);
        debug!(
            owner_id,
            agent_id,
            channel = %channel,
            message_count = messages.len(),
            "Context assembled"
        );

        // 4. The LLM call. Every failure resolves to an advisory string.
        let reply = match self
            .provider
            .complete(
                &api_key,
                CompletionRequest {
                    model: self.settings.model.clone(),
                    messages,
                    temperature: self.settings.temperature,
                    max_tokens: self.settings.max_tokens,
                },
            )
            .await
        {
            Ok(text) if !text.is_empty() => text,
            Ok(_) => {
                warn!(owner_id, agent_id, "Provider returned empty content");
                TROUBLE_REPLY.to_string()
            }
            Err(ProviderError::NotConfigured(reason)) => {
                warn!(owner_id, %reason, "Provider not configured");
                MISSING_KEY_REPLY.to_string()
            }
            Err(e) => {
                warn!(owner_id, agent_id, error = %e, "Provider call failed");
                TROUBLE_REPLY.to_string()
            }
        };

        // 5. Persist the exchange. Reply delivery wins over durability.
        let turn = ConversationTurn {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: owner_id.to_string(),
            agent_id: agent_id.to_string(),
            channel,
            sender_id: sender_id.to_string(),
            direction: Direction::Incoming,
            inbound_text: inbound_text.to_string(),
            outbound_text: reply.clone(),
            created_at: Utc::now(),
        };
        if let Err(e) = self.store.append_turn(&turn).await {
            warn!(owner_id, agent_id, error = %e, "Failed to persist turn; reply still delivered");
        }

        reply
    }
}
