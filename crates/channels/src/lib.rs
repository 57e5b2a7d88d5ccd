//! Messaging channel adapters for Deskhand.
//!
//! Each adapter is a pair of translations plus one provider-specific
//! handshake: it turns a channel's inbound payload into the pipeline's
//! canonical input, and the pipeline's text reply into that channel's
//! outbound call (Telegram, Meta, WATI) or inline response body (Twilio).
//!
//! Available channels:
//! - **Telegram** — Bot API webhook mode with getMe-validated setup
//! - **WhatsApp** — Meta Cloud API, Twilio (TwiML inline replies), WATI

pub mod telegram;
pub mod whatsapp;

pub use telegram::{TelegramChannel, TelegramClient, TelegramSetup};
pub use whatsapp::{MetaClient, VerifyOutcome, WatiClient, WhatsAppChannel, WhatsAppWebhookReply};
