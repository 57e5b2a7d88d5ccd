//! Telegram channel adapter.
//!
//! Setup validates the bot token against the Bot API's getMe endpoint, then
//! stores the credential (replacing any prior one for the agent) and
//! registers a webhook URL that encodes owner and agent ids as
//! `{owner_id}_{agent_id}`.
//!
//! The inbound webhook handler silently ignores anything that is not a plain
//! text message, and the webhook endpoint always answers 200 so Telegram
//! never retry-storms a broken bot.

use std::time::Duration;

use deskhand_core::error::{ChannelError, Error};
use deskhand_core::ChannelKind;
use deskhand_pipeline::ResponsePipeline;
use deskhand_store::Store;
use serde::Deserialize;
use tracing::{info, warn};

/// Timeout applied to the setup-time verification calls only; regular
/// outbound sends use the client default.
const VERIFY_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a successful bot setup.
#[derive(Debug, Clone)]
pub struct TelegramSetup {
    pub bot_username: String,
    pub webhook_url: String,
}

// --- Bot API wire types ---

/// An inbound update. Everything is optional: non-message updates
/// (edits, callbacks, joins) arrive on the same webhook.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub chat: Option<TelegramChat>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
struct GetMeResponse {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<BotInfo>,
}

#[derive(Debug, Deserialize)]
struct BotInfo {
    username: String,
}

/// Parse the `{owner_id}_{agent_id}` path segment from a webhook URL.
pub fn parse_bot_ref(segment: &str) -> Option<(String, String)> {
    let (owner, agent) = segment.split_once('_')?;
    if owner.is_empty() || agent.is_empty() {
        return None;
    }
    Some((owner.to_string(), agent.to_string()))
}

/// Thin Bot API client. The base URL is injectable for tests.
pub struct TelegramClient {
    http: reqwest::Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Validate a bot token and return the bot's username.
    pub async fn get_me(&self, bot_token: &str) -> Result<String, ChannelError> {
        let url = format!("{}/bot{bot_token}/getMe", self.base_url);
        let response = self
            .http
            .get(&url)
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ChannelError::InvalidCredential(
                "Invalid Telegram bot token".into(),
            ));
        }

        let body: GetMeResponse =
            response
                .json()
                .await
                .map_err(|e| ChannelError::InvalidPayload(format!("getMe response: {e}")))?;

        match body.result {
            Some(info) if body.ok => Ok(info.username),
            _ => Err(ChannelError::InvalidCredential(
                "Invalid Telegram bot token".into(),
            )),
        }
    }

    /// Register the webhook callback URL for a bot.
    pub async fn set_webhook(&self, bot_token: &str, webhook_url: &str) -> Result<(), ChannelError> {
        let url = format!("{}/bot{bot_token}/setWebhook", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("url", webhook_url)])
            .timeout(VERIFY_TIMEOUT)
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: format!("setWebhook returned {}", response.status()),
            });
        }
        Ok(())
    }

    /// Deliver a reply to a chat.
    pub async fn send_message(
        &self,
        bot_token: &str,
        chat_id: i64,
        text: &str,
    ) -> Result<(), ChannelError> {
        let url = format!("{}/bot{bot_token}/sendMessage", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": chat_id,
                "text": text,
                "parse_mode": "HTML",
            }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ChannelError::DeliveryFailed {
                channel: "telegram".into(),
                reason: format!("sendMessage returned {}", response.status()),
            });
        }
        Ok(())
    }
}

/// The Telegram adapter: setup handshake plus webhook translation.
pub struct TelegramChannel {
    client: TelegramClient,
    store: Store,
}

impl TelegramChannel {
    pub fn new(client: TelegramClient, store: Store) -> Self {
        Self { client, store }
    }

    /// Validate the token, store the credential (replacing any prior one),
    /// and register the webhook.
    pub async fn setup(
        &self,
        owner_id: &str,
        agent_id: &str,
        bot_token: &str,
        public_url: &str,
    ) -> Result<TelegramSetup, Error> {
        let bot_username = self.client.get_me(bot_token).await?;

        self.store
            .replace_telegram_bot(owner_id, agent_id, bot_token, &bot_username)
            .await?;

        let webhook_url = format!(
            "{}/webhook/telegram/{owner_id}_{agent_id}",
            public_url.trim_end_matches('/')
        );
        self.client.set_webhook(bot_token, &webhook_url).await?;

        info!(owner_id, agent_id, %bot_username, "Telegram bot configured");
        Ok(TelegramSetup {
            bot_username,
            webhook_url,
        })
    }

    /// Process one inbound update.
    ///
    /// Non-text or malformed updates are silently ignored; send failures are
    /// logged and swallowed. The caller answers 200 regardless.
    pub async fn handle_update(
        &self,
        pipeline: &ResponsePipeline,
        owner_id: &str,
        agent_id: &str,
        update: TelegramUpdate,
    ) {
        let Some(message) = update.message else {
            return;
        };
        let Some(text) = message.text.filter(|t| !t.is_empty()) else {
            return;
        };
        let (Some(from), Some(chat)) = (message.from, message.chat) else {
            return;
        };

        let sender_id = from.id.to_string();
        let reply = pipeline
            .respond(&text, owner_id, agent_id, ChannelKind::Telegram, &sender_id)
            .await;

        match self.store.telegram_bot_by_agent(owner_id, agent_id).await {
            Ok(Some(cred)) => {
                if let Err(e) = self
                    .client
                    .send_message(&cred.bot_token, chat.id, &reply)
                    .await
                {
                    warn!(owner_id, agent_id, error = %e, "Telegram send failed");
                }
            }
            Ok(None) => {
                // Webhook still registered but credential gone; nothing to send with.
                warn!(owner_id, agent_id, "No Telegram credential stored, reply dropped");
            }
            Err(e) => warn!(owner_id, agent_id, error = %e, "Credential lookup failed"),
        }
    }

    /// Send an arbitrary test message through a configured bot.
    pub async fn send_test(
        &self,
        owner_id: &str,
        agent_id: &str,
        chat_id: i64,
        text: &str,
    ) -> Result<(), Error> {
        let cred = self
            .store
            .telegram_bot_by_agent(owner_id, agent_id)
            .await?
            .ok_or_else(|| {
                Error::Channel(ChannelError::NotConfigured(
                    "Telegram bot not configured".into(),
                ))
            })?;
        self.client
            .send_message(&cred.bot_token, chat_id, text)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_ref_splits_on_underscore() {
        let (owner, agent) = parse_bot_ref("u-123_a-456").unwrap();
        assert_eq!(owner, "u-123");
        assert_eq!(agent, "a-456");
    }

    #[test]
    fn malformed_bot_refs_rejected() {
        assert!(parse_bot_ref("no-separator").is_none());
        assert!(parse_bot_ref("_agent-only").is_none());
        assert!(parse_bot_ref("owner-only_").is_none());
        assert!(parse_bot_ref("").is_none());
    }

    #[test]
    fn text_update_parses() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{"update_id":1,"message":{"message_id":7,"text":"hello",
                "from":{"id":555,"is_bot":false},"chat":{"id":555,"type":"private"}}}"#,
        )
        .unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.text.as_deref(), Some("hello"));
        assert_eq!(message.from.unwrap().id, 555);
        assert_eq!(message.chat.unwrap().id, 555);
    }

    #[test]
    fn non_text_update_parses_without_text() {
        // A photo message: no text field
        let update: TelegramUpdate = serde_json::from_str(
            r#"{"update_id":2,"message":{"message_id":8,"photo":[],
                "from":{"id":9},"chat":{"id":9}}}"#,
        )
        .unwrap();
        assert!(update.message.unwrap().text.is_none());
    }

    #[test]
    fn non_message_update_parses_empty() {
        let update: TelegramUpdate =
            serde_json::from_str(r#"{"update_id":3,"edited_message":{"message_id":1}}"#).unwrap();
        assert!(update.message.is_none());
    }

    #[test]
    fn get_me_response_parses() {
        let body: GetMeResponse = serde_json::from_str(
            r#"{"ok":true,"result":{"id":42,"is_bot":true,"first_name":"Shop","username":"shop_bot"}}"#,
        )
        .unwrap();
        assert!(body.ok);
        assert_eq!(body.result.unwrap().username, "shop_bot");
    }

    #[test]
    fn get_me_failure_shape() {
        let body: GetMeResponse =
            serde_json::from_str(r#"{"ok":false,"error_code":401,"description":"Unauthorized"}"#)
                .unwrap();
        assert!(!body.ok);
        assert!(body.result.is_none());
    }

    #[tokio::test]
    async fn handle_update_ignores_non_text() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let channel = TelegramChannel::new(TelegramClient::new("http://127.0.0.1:1"), store.clone());
        let pipeline = test_pipeline(store.clone()).await;

        // No message at all
        channel
            .handle_update(&pipeline, "u1", "a1", TelegramUpdate { message: None })
            .await;
        // Message without text
        channel
            .handle_update(
                &pipeline,
                "u1",
                "a1",
                TelegramUpdate {
                    message: Some(TelegramMessage {
                        text: None,
                        from: Some(TelegramUser { id: 1 }),
                        chat: Some(TelegramChat { id: 1 }),
                    }),
                },
            )
            .await;

        // Nothing persisted
        let turns = store.chat_history("u1", None, None, 10).await.unwrap();
        assert!(turns.is_empty());
    }

    async fn test_pipeline(store: Store) -> ResponsePipeline {
        use async_trait::async_trait;
        use deskhand_core::provider::{CompletionRequest, Provider};
        use deskhand_core::ProviderError;
        use std::sync::Arc;

        struct Canned;

        #[async_trait]
        impl Provider for Canned {
            fn name(&self) -> &str {
                "canned"
            }
            async fn complete(
                &self,
                _api_key: &str,
                _request: CompletionRequest,
            ) -> Result<String, ProviderError> {
                Ok("canned reply".into())
            }
        }

        ResponsePipeline::new(store, Arc::new(Canned), deskhand_pipeline::PipelineSettings::default())
    }
}
