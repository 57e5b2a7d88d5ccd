//! Owner authentication and the dashboard endpoint.
//!
//! The bearer token is the bare user id, kept for wire compatibility with
//! existing dashboard clients. The auth-check step resolves it once into a
//! typed [`RequestContext`] that handlers receive as an extractor argument —
//! no ambient mutable request state.

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::response::Json;
use chrono::{Duration, Utc};
use deskhand_core::identity::{PartnerContext, RequestContext};
use serde::Deserialize;
use serde_json::json;

use crate::{ApiError, SharedState};

/// The authenticated owner, resolved from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthedUser(pub RequestContext);

/// The authenticated partner, resolved from the Authorization header.
#[derive(Debug, Clone)]
pub struct AuthedPartner(pub PartnerContext);

fn bearer_token(parts: &Parts) -> Result<&str, ApiError> {
    parts
        .headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))
}

impl FromRequestParts<SharedState> for AuthedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state
            .store
            .user_by_id(token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

        Ok(AuthedUser(RequestContext {
            user_id: user.id,
            email: user.email,
            business_name: user.business_name,
        }))
    }
}

impl FromRequestParts<SharedState> for AuthedPartner {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let partner = state
            .store
            .partner_by_id(token)
            .await?
            .ok_or_else(|| ApiError::unauthorized("Invalid token"))?;

        Ok(AuthedPartner(PartnerContext {
            partner_id: partner.id,
            name: partner.name,
            email: partner.email,
        }))
    }
}

// --- Handlers ---

#[derive(Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub country_code: String,
    #[serde(default)]
    pub whatsapp_number: String,
}

pub async fn signup_handler(
    State(state): State<SharedState>,
    Json(request): Json<SignupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }
    if request.password != request.confirm_password {
        return Err(ApiError::bad_request("Passwords do not match"));
    }
    if request.whatsapp_number.is_empty()
        || !request.whatsapp_number.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ApiError::bad_request(
            "WhatsApp number must contain only digits",
        ));
    }
    if state.store.user_by_email(&request.email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let password_hash = bcrypt::hash(&request.password, bcrypt::DEFAULT_COST)
        .map_err(|e| ApiError::internal(format!("Password hashing failed: {e}")))?;

    let user = state
        .store
        .create_user(
            &request.email,
            &password_hash,
            &request.business_name,
            &request.country_code,
            &request.whatsapp_number,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Account created successfully",
        "token": user.id,
        "user": {
            "id": user.id,
            "email": user.email,
            "business_name": user.business_name,
        },
    })))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login_handler(
    State(state): State<SharedState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let user = state
        .store
        .user_by_email(&request.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;

    let valid = bcrypt::verify(&request.password, &user.password_hash).unwrap_or(false);
    if !valid {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": user.id,
        "user": {
            "id": user.id,
            "email": user.email,
            "business_name": user.business_name,
        },
    })))
}

pub async fn dashboard_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let agents = state.store.agents_for_owner(&ctx.user_id).await?;
    let datasets = state.store.datasets_for_owner(&ctx.user_id).await?;

    let cutoff = Utc::now() - Duration::hours(24);
    let history = state.store.chat_history(&ctx.user_id, None, None, 100).await?;
    let today_chats = history.iter().filter(|t| t.created_at > cutoff).count();

    Ok(Json(json!({
        "success": true,
        "dashboard": {
            "user": {
                "id": ctx.user_id,
                "email": ctx.email,
                "business_name": ctx.business_name,
            },
            "statistics": {
                "database_count": datasets.len(),
                "chat_count": today_chats,
                "active_ai_count": agents.len(),
            },
        },
    })))
}
