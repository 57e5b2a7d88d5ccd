//! Account records: business owners, partners, and partner clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A business owner account.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    /// bcrypt hash, never the raw password.
    pub password_hash: String,
    pub business_name: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub whatsapp_number: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .field("business_name", &self.business_name)
            .finish()
    }
}

/// A reseller partner account.
#[derive(Clone, Serialize, Deserialize)]
pub struct Partner {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for Partner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Partner")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password_hash", &"[REDACTED]")
            .finish()
    }
}

/// Commission split applied to every partner client: 60% partner / 40% platform.
pub const PARTNER_SHARE: f64 = 0.6;

/// A client a partner has signed and bills on the platform's behalf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerClient {
    pub id: String,
    pub partner_id: String,
    pub client_name: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub client_phone: String,
    #[serde(default)]
    pub client_company: String,
    pub billing_amount: f64,
    /// "monthly", "quarterly", or "yearly".
    pub billing_period: String,
    pub partner_earnings: f64,
    pub platform_earnings: f64,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub preferences: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl PartnerClient {
    /// Split a billing amount into (partner, platform) earnings.
    pub fn split_earnings(billing_amount: f64) -> (f64, f64) {
        let partner = billing_amount * PARTNER_SHARE;
        (partner, billing_amount - partner)
    }
}

/// Partner earnings grouped by billing period.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PartnerEarnings {
    pub monthly: f64,
    pub quarterly: f64,
    pub yearly: f64,
    pub total: f64,
}

impl PartnerEarnings {
    /// Sum the partner's 60% share across their client book.
    pub fn compute(clients: &[PartnerClient]) -> Self {
        let mut earnings = Self::default();
        for client in clients {
            match client.billing_period.as_str() {
                "monthly" => earnings.monthly += client.partner_earnings,
                "quarterly" => earnings.quarterly += client.partner_earnings,
                "yearly" => earnings.yearly += client.partner_earnings,
                _ => {}
            }
        }
        earnings.total = earnings.monthly + earnings.quarterly + earnings.yearly;
        earnings
    }
}
