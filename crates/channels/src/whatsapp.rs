//! WhatsApp channel adapter.
//!
//! One webhook URL serves three API providers; the stored credential's
//! provider field picks the wire shape:
//!
//! - **Meta Cloud API** — JSON webhook with a GET verification handshake;
//!   replies go out through the Graph API messages endpoint.
//! - **Twilio** — form-encoded webhook; the reply is the HTTP response
//!   itself, as a TwiML `text/xml` body with an escaped `<Message>`.
//! - **WATI** — JSON `{text, waId}` webhook; replies POST to the tenant's
//!   configured WATI base URL.
//!
//! A credential whose provider value falls outside the closed set is a
//! no-op: the webhook answers 200 and nothing else happens.

use deskhand_core::credential::WhatsAppCredential;
use deskhand_core::error::{ChannelError, Error};
use deskhand_core::{ChannelKind, WhatsAppProvider};
use deskhand_pipeline::ResponsePipeline;
use deskhand_store::Store;
use serde::Deserialize;
use tracing::{debug, warn};

// --- XML escaping (Twilio inline replies) ---

const XML_ENTITIES: [&str; 5] = ["&amp;", "&lt;", "&gt;", "&apos;", "&quot;"];

/// Escape `< > & ' "` for embedding in a TwiML body.
///
/// Idempotent: an already-escaped entity is left alone, so escaping twice
/// never produces `&amp;lt;`.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (idx, ch) in text.char_indices() {
        match ch {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            '&' => {
                let rest = &text[idx..];
                if XML_ENTITIES.iter().any(|entity| rest.starts_with(entity)) {
                    out.push('&');
                } else {
                    out.push_str("&amp;");
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Wrap a reply in a TwiML response document.
pub fn twiml(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Response>\n  <Message>{}</Message>\n</Response>",
        escape_xml(body)
    )
}

// --- Meta verification handshake ---

/// Evaluate the Meta GET verification handshake.
///
/// Returns the challenge to echo back iff mode is "subscribe" and the token
/// matches the configured shared secret.
pub fn meta_verification(
    mode: Option<&str>,
    token: Option<&str>,
    challenge: Option<&str>,
    expected_token: &str,
) -> Option<String> {
    if mode == Some("subscribe") && token == Some(expected_token) {
        Some(challenge.unwrap_or_default().to_string())
    } else {
        None
    }
}

// --- Inbound wire types ---

#[derive(Debug, Deserialize)]
struct MetaWebhook {
    #[serde(default)]
    entry: Vec<MetaEntry>,
}

#[derive(Debug, Deserialize)]
struct MetaEntry {
    #[serde(default)]
    changes: Vec<MetaChange>,
}

#[derive(Debug, Deserialize)]
struct MetaChange {
    #[serde(default)]
    value: Option<MetaChangeValue>,
}

#[derive(Debug, Deserialize)]
struct MetaChangeValue {
    #[serde(default)]
    messages: Vec<MetaMessage>,
}

#[derive(Debug, Deserialize)]
struct MetaMessage {
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default)]
    from: String,
    #[serde(default)]
    text: Option<MetaText>,
}

#[derive(Debug, Deserialize)]
struct MetaText {
    #[serde(default)]
    body: String,
}

/// Extract (text, sender) from a Meta webhook payload. Only `type == "text"`
/// messages are handled; anything else is a silent no-op.
pub fn parse_meta_text(payload: &serde_json::Value) -> Option<(String, String)> {
    let webhook: MetaWebhook = serde_json::from_value(payload.clone()).ok()?;
    let message = webhook
        .entry
        .into_iter()
        .next()?
        .changes
        .into_iter()
        .next()?
        .value?
        .messages
        .into_iter()
        .next()?;

    if message.kind != "text" {
        return None;
    }
    let body = message.text?.body;
    if body.is_empty() || message.from.is_empty() {
        return None;
    }
    Some((body, message.from))
}

/// Twilio's form-encoded inbound payload.
#[derive(Debug, Deserialize)]
pub struct TwilioForm {
    #[serde(default, rename = "Body")]
    pub body: String,
    #[serde(default, rename = "From")]
    pub from: String,
}

/// WATI's JSON inbound payload.
#[derive(Debug, Deserialize)]
pub struct WatiInbound {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "waId")]
    pub wa_id: String,
}

// --- Outbound clients ---

/// Meta Graph API client. Base URL injectable for tests.
pub struct MetaClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn send(
        &self,
        phone_number_id: &str,
        access_token: &str,
        to: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        let url = format!("{}/{phone_number_id}/messages", self.base_url);
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {access_token}"))
            .json(&serde_json::json!({
                "messaging_product": "whatsapp",
                "to": to,
                "type": "text",
                "text": { "body": text },
            }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "whatsapp-meta".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::DeliveryFailed {
                channel: "whatsapp-meta".into(),
                reason: format!("{status}: {body}"),
            });
        }
        Ok(())
    }
}

/// WATI session-message client. The base URL comes from the tenant's
/// credential, not from configuration.
pub struct WatiClient {
    http: reqwest::Client,
}

impl Default for WatiClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WatiClient {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    pub async fn send(
        &self,
        base_url: &str,
        api_key: &str,
        to: &str,
        text: &str,
    ) -> Result<(), ChannelError> {
        let url = format!(
            "{}/v1/sendSessionMessage/{to}",
            base_url.trim_end_matches('/')
        );
        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await
            .map_err(|e| ChannelError::DeliveryFailed {
                channel: "whatsapp-wati".into(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::DeliveryFailed {
                channel: "whatsapp-wati".into(),
                reason: format!("{status}: {body}"),
            });
        }
        Ok(())
    }
}

// --- Webhook handling ---

/// What the HTTP layer should answer a WhatsApp webhook with.
#[derive(Debug, PartialEq, Eq)]
pub enum WhatsAppWebhookReply {
    /// Plain 200 OK — the reply (if any) went out via an API call.
    Ok,
    /// Inline `text/xml` TwiML body (Twilio's reply transport).
    Twiml(String),
    /// No credential matches the bot id in the URL.
    NotFound,
}

/// Outcome of the Meta GET verification handshake.
#[derive(Debug, PartialEq, Eq)]
pub enum VerifyOutcome {
    Challenge(String),
    Forbidden,
    NotFound,
}

/// The WhatsApp adapter: provider dispatch plus the verification handshake.
pub struct WhatsAppChannel {
    meta: MetaClient,
    wati: WatiClient,
    store: Store,
}

impl WhatsAppChannel {
    pub fn new(meta: MetaClient, wati: WatiClient, store: Store) -> Self {
        Self { meta, wati, store }
    }

    /// GET verification handshake, keyed by the bot id in the webhook URL.
    pub async fn verify(
        &self,
        bot_id: &str,
        mode: Option<&str>,
        token: Option<&str>,
        challenge: Option<&str>,
        expected_token: &str,
    ) -> VerifyOutcome {
        match self.store.whatsapp_bot(bot_id).await {
            Ok(Some(_)) => match meta_verification(mode, token, challenge, expected_token) {
                Some(challenge) => VerifyOutcome::Challenge(challenge),
                None => VerifyOutcome::Forbidden,
            },
            Ok(None) => VerifyOutcome::NotFound,
            Err(e) => {
                warn!(bot_id, error = %e, "Credential lookup failed during verification");
                VerifyOutcome::NotFound
            }
        }
    }

    /// Process one inbound webhook POST. The raw body is parsed according to
    /// the credential's provider; internal failures never bubble out as
    /// transport errors.
    pub async fn handle_webhook(
        &self,
        pipeline: &ResponsePipeline,
        bot_id: &str,
        body: &[u8],
    ) -> WhatsAppWebhookReply {
        let cred = match self.store.whatsapp_bot(bot_id).await {
            Ok(Some(cred)) => cred,
            Ok(None) => return WhatsAppWebhookReply::NotFound,
            Err(e) => {
                warn!(bot_id, error = %e, "Credential lookup failed");
                return WhatsAppWebhookReply::Ok;
            }
        };

        match cred.provider_kind() {
            Some(WhatsAppProvider::Meta) => self.handle_meta(pipeline, &cred, body).await,
            Some(WhatsAppProvider::Twilio) => self.handle_twilio(pipeline, &cred, body).await,
            Some(WhatsAppProvider::Wati) => self.handle_wati(pipeline, &cred, body).await,
            None => {
                debug!(bot_id, provider = %cred.provider, "Unrecognized provider, ignoring webhook");
                WhatsAppWebhookReply::Ok
            }
        }
    }

    async fn handle_meta(
        &self,
        pipeline: &ResponsePipeline,
        cred: &WhatsAppCredential,
        body: &[u8],
    ) -> WhatsAppWebhookReply {
        let Ok(payload) = serde_json::from_slice::<serde_json::Value>(body) else {
            return WhatsAppWebhookReply::Ok;
        };
        let Some((text, sender)) = parse_meta_text(&payload) else {
            return WhatsAppWebhookReply::Ok;
        };

        let reply = pipeline
            .respond(&text, &cred.owner_id, &cred.agent_id, ChannelKind::Whatsapp, &sender)
            .await;

        match (cred.phone_number_id.as_deref(), cred.access_token.as_deref()) {
            (Some(phone_number_id), Some(access_token)) => {
                if let Err(e) = self.meta.send(phone_number_id, access_token, &sender, &reply).await
                {
                    warn!(bot_id = %cred.id, error = %e, "Meta send failed");
                }
            }
            _ => warn!(bot_id = %cred.id, "Meta credential incomplete, reply dropped"),
        }
        WhatsAppWebhookReply::Ok
    }

    async fn handle_twilio(
        &self,
        pipeline: &ResponsePipeline,
        cred: &WhatsAppCredential,
        body: &[u8],
    ) -> WhatsAppWebhookReply {
        let form: TwilioForm = serde_urlencoded::from_bytes(body).unwrap_or(TwilioForm {
            body: String::new(),
            from: String::new(),
        });

        if form.body.is_empty() {
            return WhatsAppWebhookReply::Twiml(twiml("No message received"));
        }

        let reply = pipeline
            .respond(
                &form.body,
                &cred.owner_id,
                &cred.agent_id,
                ChannelKind::Whatsapp,
                &form.from,
            )
            .await;

        // Twilio's reply transport is the HTTP response itself.
        WhatsAppWebhookReply::Twiml(twiml(&reply))
    }

    async fn handle_wati(
        &self,
        pipeline: &ResponsePipeline,
        cred: &WhatsAppCredential,
        body: &[u8],
    ) -> WhatsAppWebhookReply {
        let Ok(inbound) = serde_json::from_slice::<WatiInbound>(body) else {
            return WhatsAppWebhookReply::Ok;
        };
        if inbound.text.is_empty() || inbound.wa_id.is_empty() {
            return WhatsAppWebhookReply::Ok;
        }

        let reply = pipeline
            .respond(
                &inbound.text,
                &cred.owner_id,
                &cred.agent_id,
                ChannelKind::Whatsapp,
                &inbound.wa_id,
            )
            .await;

        let base_url = cred.wati_url.as_deref().unwrap_or("https://api.wati.io");
        match cred.api_key.as_deref() {
            Some(api_key) => {
                if let Err(e) = self.wati.send(base_url, api_key, &inbound.wa_id, &reply).await {
                    warn!(bot_id = %cred.id, error = %e, "WATI send failed");
                }
            }
            None => warn!(bot_id = %cred.id, "WATI credential incomplete, reply dropped"),
        }
        WhatsAppWebhookReply::Ok
    }

    /// Send a test message through a configured bot (owner-facing API).
    pub async fn send_test(
        &self,
        owner_id: &str,
        agent_id: &str,
        to: &str,
        text: &str,
    ) -> Result<(), Error> {
        let cred = self
            .store
            .whatsapp_bot_by_agent(owner_id, agent_id)
            .await?
            .ok_or_else(|| {
                Error::Channel(ChannelError::NotConfigured(
                    "WhatsApp bot not configured".into(),
                ))
            })?;

        match cred.provider_kind() {
            Some(WhatsAppProvider::Meta) => {
                let (Some(phone_number_id), Some(access_token)) =
                    (cred.phone_number_id.as_deref(), cred.access_token.as_deref())
                else {
                    return Err(Error::Channel(ChannelError::InvalidCredential(
                        "Meta credential missing access token or phone number id".into(),
                    )));
                };
                self.meta.send(phone_number_id, access_token, to, text).await?;
                Ok(())
            }
            Some(WhatsAppProvider::Wati) => {
                let base_url = cred.wati_url.as_deref().unwrap_or("https://api.wati.io");
                let Some(api_key) = cred.api_key.as_deref() else {
                    return Err(Error::Channel(ChannelError::InvalidCredential(
                        "WATI credential missing API key".into(),
                    )));
                };
                self.wati.send(base_url, api_key, to, text).await?;
                Ok(())
            }
            Some(WhatsAppProvider::Twilio) => Err(Error::Channel(ChannelError::NotConfigured(
                "Twilio replies inline to its webhook; outbound test sends are not supported"
                    .into(),
            ))),
            None => Err(Error::Channel(ChannelError::InvalidCredential(format!(
                "Unsupported provider: {}",
                cred.provider
            )))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // --- XML escaping ---

    #[test]
    fn escapes_all_five_characters() {
        let escaped = escape_xml(r#"a < b > c & d ' e " f"#);
        assert_eq!(escaped, "a &lt; b &gt; c &amp; d &apos; e &quot; f");
    }

    #[test]
    fn escaping_is_idempotent() {
        let raw = r#"<price> "5 & 6" isn't much"#;
        let once = escape_xml(raw);
        let twice = escape_xml(&once);
        assert_eq!(once, twice);
        assert!(!twice.contains("&amp;lt;"));
        assert!(!twice.contains("&amp;amp;"));
    }

    #[test]
    fn bare_ampersand_still_escaped() {
        assert_eq!(escape_xml("fish & chips"), "fish &amp; chips");
        // "&ampersand" is not an entity prefix match on the full token list
        assert_eq!(escape_xml("&x"), "&amp;x");
    }

    #[test]
    fn twiml_is_well_formed() {
        let xml = twiml(r#"We sell <rye> & "spelt""#);
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Response>"));
        assert!(xml.contains("<Message>We sell &lt;rye&gt; &amp; &quot;spelt&quot;</Message>"));
        assert!(xml.ends_with("</Response>"));
    }

    // --- Verification handshake ---

    #[test]
    fn verification_echoes_challenge() {
        let result = meta_verification(
            Some("subscribe"),
            Some("secret-token"),
            Some("abc123"),
            "secret-token",
        );
        assert_eq!(result.as_deref(), Some("abc123"));
    }

    #[test]
    fn verification_rejects_wrong_token() {
        assert!(meta_verification(Some("subscribe"), Some("wrong"), Some("abc"), "right").is_none());
    }

    #[test]
    fn verification_rejects_wrong_mode() {
        assert!(meta_verification(Some("unsubscribe"), Some("tok"), Some("abc"), "tok").is_none());
        assert!(meta_verification(None, Some("tok"), Some("abc"), "tok").is_none());
    }

    // --- Payload parsing ---

    fn meta_payload(kind: &str, body: &str, from: &str) -> serde_json::Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "messages": [{
                            "type": kind,
                            "from": from,
                            "text": { "body": body },
                        }],
                    },
                }],
            }],
        })
    }

    #[test]
    fn meta_text_message_parses() {
        let (text, from) = parse_meta_text(&meta_payload("text", "hello", "4477123")).unwrap();
        assert_eq!(text, "hello");
        assert_eq!(from, "4477123");
    }

    #[test]
    fn meta_non_text_message_ignored() {
        assert!(parse_meta_text(&meta_payload("image", "", "447")).is_none());
    }

    #[test]
    fn meta_status_update_ignored() {
        // Delivery receipts have no messages array
        let payload = json!({
            "entry": [{"changes": [{"value": {"statuses": [{"status": "delivered"}]}}]}]
        });
        assert!(parse_meta_text(&payload).is_none());
    }

    #[test]
    fn meta_empty_payload_ignored() {
        assert!(parse_meta_text(&json!({})).is_none());
        assert!(parse_meta_text(&json!({"entry": []})).is_none());
    }

    #[test]
    fn twilio_form_parses() {
        let form: TwilioForm =
            serde_urlencoded::from_str("Body=Do+you+deliver%3F&From=whatsapp%3A%2B4477").unwrap();
        assert_eq!(form.body, "Do you deliver?");
        assert_eq!(form.from, "whatsapp:+4477");
    }

    #[test]
    fn wati_inbound_parses() {
        let inbound: WatiInbound =
            serde_json::from_str(r#"{"text":"opening hours?","waId":"4477999"}"#).unwrap();
        assert_eq!(inbound.text, "opening hours?");
        assert_eq!(inbound.wa_id, "4477999");
    }

    // --- Webhook dispatch (no outbound network: unreachable clients) ---

    use deskhand_core::provider::{CompletionRequest, Provider};
    use deskhand_core::ProviderError;
    use deskhand_pipeline::PipelineSettings;
    use deskhand_store::WhatsAppSetup;
    use std::sync::Arc;

    struct Canned;

    #[async_trait::async_trait]
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

    async fn fixture() -> (WhatsAppChannel, ResponsePipeline, Store) {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let channel = WhatsAppChannel::new(
            MetaClient::new("http://127.0.0.1:1"),
            WatiClient::new(),
            store.clone(),
        );
        let pipeline =
            ResponsePipeline::new(store.clone(), Arc::new(Canned), PipelineSettings::default());
        (channel, pipeline, store)
    }

    async fn seed_twilio_bot(store: &Store) -> String {
        store
            .upsert_api_key("u1", deskhand_pipeline::LLM_KEY_SERVICE, "sk")
            .await
            .unwrap();
        let agent = store
            .insert_agent("u1", "whatsapp", "Bot", "", "ctx", "WhatsApp AI Assistant")
            .await
            .unwrap();
        store
            .replace_whatsapp_bot(
                "u1",
                &agent.id,
                "twilio",
                WhatsAppSetup {
                    account_sid: Some("AC123".into()),
                    auth_token: Some("tok".into()),
                    whatsapp_number: Some("+1555".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn unknown_bot_id_is_not_found() {
        let (channel, pipeline, _store) = fixture().await;
        let reply = channel.handle_webhook(&pipeline, "ghost", b"{}").await;
        assert_eq!(reply, WhatsAppWebhookReply::NotFound);
    }

    #[tokio::test]
    async fn twilio_reply_is_inline_twiml() {
        let (channel, pipeline, store) = fixture().await;
        let bot_id = seed_twilio_bot(&store).await;

        let reply = channel
            .handle_webhook(&pipeline, &bot_id, b"Body=hi&From=whatsapp%3A%2B4477")
            .await;
        match reply {
            WhatsAppWebhookReply::Twiml(xml) => {
                assert!(xml.contains("<Message>canned reply</Message>"));
            }
            other => panic!("expected TwiML, got {other:?}"),
        }

        // The exchange was persisted under the Twilio sender id
        let turns = store.chat_history("u1", None, None, 10).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].sender_id, "whatsapp:+4477");
    }

    #[tokio::test]
    async fn twilio_empty_body_gets_placeholder_twiml() {
        let (channel, pipeline, store) = fixture().await;
        let bot_id = seed_twilio_bot(&store).await;

        let reply = channel.handle_webhook(&pipeline, &bot_id, b"From=whatsapp%3A%2B1").await;
        match reply {
            WhatsAppWebhookReply::Twiml(xml) => {
                assert!(xml.contains("No message received"));
            }
            other => panic!("expected TwiML, got {other:?}"),
        }
        // No pipeline call, nothing persisted
        assert!(store.chat_history("u1", None, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_provider_is_noop() {
        let (channel, pipeline, store) = fixture().await;
        let agent = store
            .insert_agent("u1", "whatsapp", "Bot", "", "", "WhatsApp AI Assistant")
            .await
            .unwrap();
        let cred = store
            .replace_whatsapp_bot("u1", &agent.id, "vonage", WhatsAppSetup::default())
            .await
            .unwrap();

        let reply = channel
            .handle_webhook(&pipeline, &cred.id, br#"{"text":"hi","waId":"1"}"#)
            .await;
        assert_eq!(reply, WhatsAppWebhookReply::Ok);
        assert!(store.chat_history("u1", None, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn meta_non_text_webhook_is_silent_ok() {
        let (channel, pipeline, store) = fixture().await;
        let agent = store
            .insert_agent("u1", "whatsapp", "Bot", "", "", "WhatsApp AI Assistant")
            .await
            .unwrap();
        let cred = store
            .replace_whatsapp_bot(
                "u1",
                &agent.id,
                "meta",
                WhatsAppSetup {
                    access_token: Some("tok".into()),
                    phone_number_id: Some("100".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let payload = serde_json::to_vec(&meta_payload("image", "", "447")).unwrap();
        let reply = channel.handle_webhook(&pipeline, &cred.id, &payload).await;
        assert_eq!(reply, WhatsAppWebhookReply::Ok);
        assert!(store.chat_history("u1", None, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn verification_requires_existing_bot() {
        let (channel, _pipeline, store) = fixture().await;
        let outcome = channel
            .verify("ghost", Some("subscribe"), Some("tok"), Some("abc"), "tok")
            .await;
        assert_eq!(outcome, VerifyOutcome::NotFound);

        let agent = store
            .insert_agent("u1", "whatsapp", "Bot", "", "", "WhatsApp AI Assistant")
            .await
            .unwrap();
        let cred = store
            .replace_whatsapp_bot("u1", &agent.id, "meta", WhatsAppSetup::default())
            .await
            .unwrap();

        let outcome = channel
            .verify(&cred.id, Some("subscribe"), Some("tok"), Some("abc123"), "tok")
            .await;
        assert_eq!(outcome, VerifyOutcome::Challenge("abc123".into()));

        let outcome = channel
            .verify(&cred.id, Some("subscribe"), Some("wrong"), Some("abc123"), "tok")
            .await;
        assert_eq!(outcome, VerifyOutcome::Forbidden);
    }
}
