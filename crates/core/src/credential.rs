//! Channel credential records.
//!
//! A credential is the provider-specific secret/config bundle needed to send
//! and receive on a channel. Each (owner, agent) pair holds at most one
//! active credential per channel kind; a new setup replaces the old row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::WhatsAppProvider;

/// Telegram bot credential for one agent.
#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramCredential {
    pub id: String,
    pub owner_id: String,
    pub agent_id: String,
    pub bot_token: String,
    pub bot_username: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for TelegramCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramCredential")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("agent_id", &self.agent_id)
            .field("bot_token", &"[REDACTED]")
            .field("bot_username", &self.bot_username)
            .finish()
    }
}

/// WhatsApp bot credential for one agent.
///
/// Which fields are populated depends on the provider:
/// - Meta:   `access_token` + `phone_number_id`
/// - Twilio: `account_sid` + `auth_token` + `whatsapp_number`
/// - WATI:   `api_key` + `wati_url`
///
/// The provider is stored as its raw string; webhook dispatch parses it into
/// the closed [`WhatsAppProvider`] set and treats anything else as a no-op.
#[derive(Clone, Serialize, Deserialize)]
pub struct WhatsAppCredential {
    pub id: String,
    pub owner_id: String,
    pub agent_id: String,
    pub provider: String,
    #[serde(default)]
    pub account_sid: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub phone_number_id: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub wati_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl WhatsAppCredential {
    /// Parse the stored provider value into the closed provider set.
    pub fn provider_kind(&self) -> Option<WhatsAppProvider> {
        WhatsAppProvider::parse(&self.provider)
    }
}

impl std::fmt::Debug for WhatsAppCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WhatsAppCredential")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("agent_id", &self.agent_id)
            .field("provider", &self.provider)
            .field("secrets", &"[REDACTED]")
            .field("phone_number", &self.phone_number)
            .field("wati_url", &self.wati_url)
            .finish()
    }
}
