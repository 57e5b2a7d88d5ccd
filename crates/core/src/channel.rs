//! Channel kinds and WhatsApp provider selection.
//!
//! A channel kind identifies the messaging surface a conversation turn came
//! through. WhatsApp is sub-typed by provider: the same webhook contract is
//! served by Meta's Cloud API, Twilio, or WATI, each with its own wire shape.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// The messaging surface an agent is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// The owner-facing dashboard chat
    Dashboard,
    Telegram,
    Whatsapp,
    Facebook,
    Instagram,
}

impl ChannelKind {
    /// Stable string form used in storage and webhook routing.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Telegram => "telegram",
            Self::Whatsapp => "whatsapp",
            Self::Facebook => "facebook",
            Self::Instagram => "instagram",
        }
    }
}

impl std::fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dashboard" => Ok(Self::Dashboard),
            "telegram" => Ok(Self::Telegram),
            "whatsapp" => Ok(Self::Whatsapp),
            "facebook" => Ok(Self::Facebook),
            "instagram" => Ok(Self::Instagram),
            other => Err(format!("unknown channel kind: {other}")),
        }
    }
}

/// The closed set of supported WhatsApp API providers.
///
/// Dispatch over this enum is exhaustive: adding or removing a provider is a
/// compile-time-checked change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WhatsAppProvider {
    Meta,
    Twilio,
    Wati,
}

impl WhatsAppProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Meta => "meta",
            Self::Twilio => "twilio",
            Self::Wati => "wati",
        }
    }

    /// Parse a stored provider value. Returns `None` for anything outside
    /// the closed set — webhook dispatch treats that as a no-op.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "meta" => Some(Self::Meta),
            "twilio" => Some(Self::Twilio),
            "wati" => Some(Self::Wati),
            _ => None,
        }
    }
}

impl std::fmt::Display for WhatsAppProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
