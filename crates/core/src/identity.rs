//! Request-scoped identity values.
//!
//! The authenticated identity is resolved once per request by an auth-check
//! step and threaded explicitly into every operation as a typed value. No
//! handler reads ambient mutable request state.

use serde::{Deserialize, Serialize};

/// The authenticated business owner behind an API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// Owner (user) id — scopes every read and write.
    pub user_id: String,
    pub email: String,
    pub business_name: String,
}

/// The authenticated partner behind a partner-portal API call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartnerContext {
    pub partner_id: String,
    pub name: String,
    pub email: String,
}
