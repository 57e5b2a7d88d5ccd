//! # Deskhand Core
//!
//! Domain types, traits, and error definitions for the Deskhand AI workforce
//! backend. This crate has **zero framework dependencies** — it defines the
//! domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem seam is defined as a trait or plain data here.
//! Implementations live in their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod agent;
pub mod channel;
pub mod credential;
pub mod dataset;
pub mod error;
pub mod identity;
pub mod message;
pub mod provider;
pub mod sales;
pub mod turn;
pub mod user;

// Re-export key types at crate root for ergonomics
pub use agent::{Agent, ServiceDescriptor, service_catalog};
pub use channel::{ChannelKind, WhatsAppProvider};
pub use credential::{TelegramCredential, WhatsAppCredential};
pub use dataset::{Dataset, DatasetQuery, FilterCondition, PageSpec, SortDirection, SortSpec};
pub use error::{ChannelError, Error, ProviderError, Result, StoreError};
pub use identity::{PartnerContext, RequestContext};
pub use message::{ChatMessage, Role};
pub use provider::{CompletionRequest, Provider};
pub use sales::{SaleRecord, SalesAnalytics};
pub use turn::{ConversationTurn, Direction};
pub use user::{Partner, PartnerClient, PartnerEarnings, User};
