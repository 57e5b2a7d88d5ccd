//! Conversation turn records.
//!
//! One turn = one inbound customer message plus the generated reply,
//! persisted as a single append-only row.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::channel::ChannelKind;

/// Informational direction marker on a stored turn.
///
/// Every save writes `Incoming` (both texts live on the same row), so this
/// field must never be used to distinguish inbound from outbound rows —
/// context reconstruction reads the text columns instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

/// One persisted inbound/reply exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub id: String,
    pub owner_id: String,
    pub agent_id: String,
    pub channel: ChannelKind,
    /// Platform-specific end-customer identifier.
    pub sender_id: String,
    pub direction: Direction,
    /// What the customer sent.
    pub inbound_text: String,
    /// What the agent replied.
    pub outbound_text: String,
    pub created_at: DateTime<Utc>,
}
