//! Agent records and the service catalog.
//!
//! An agent is a configured AI persona tied to one owner and one messaging
//! channel kind. Its `business_info` free text is the primary context the
//! pipeline hands to the LLM.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured AI workforce agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Agent {
    pub id: String,

    /// Owning business account.
    pub owner_id: String,

    /// Which catalog service this agent instantiates (e.g. "whatsapp").
    pub service_id: String,

    pub display_name: String,

    #[serde(default)]
    pub description: String,

    /// Free-text business context injected into the system prompt.
    #[serde(default)]
    pub business_info: String,

    /// Human-readable catalog service name.
    pub service_name: String,

    pub status: String,

    pub created_at: DateTime<Utc>,
}

/// A service the platform offers in its catalog.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceDescriptor {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The fixed catalog of AI services an owner can add.
pub fn service_catalog() -> &'static [ServiceDescriptor] {
    const CATALOG: &[ServiceDescriptor] = &[
        ServiceDescriptor {
            id: "whatsapp",
            name: "WhatsApp AI Assistant",
            description: "AI-powered customer support for WhatsApp",
        },
        ServiceDescriptor {
            id: "telegram",
            name: "Telegram AI Assistant",
            description: "AI assistant for Telegram messaging",
        },
        ServiceDescriptor {
            id: "facebook",
            name: "Facebook AI Manager",
            description: "AI for Facebook content and engagement",
        },
        ServiceDescriptor {
            id: "instagram",
            name: "Instagram Manager",
            description: "AI-powered Instagram content and engagement management",
        },
        ServiceDescriptor {
            id: "website",
            name: "Website AI Agent",
            description: "AI chatbot with appointment scheduling for websites",
        },
        ServiceDescriptor {
            id: "ecommerce",
            name: "E-Commerce Store Bot",
            description: "AI-powered e-commerce chatbot with product catalog and order management",
        },
    ];
    CATALOG
}

/// Look up a catalog service by id.
pub fn find_service(id: &str) -> Option<&'static ServiceDescriptor> {
    service_catalog().iter().find(|s| s.id == id)
}
