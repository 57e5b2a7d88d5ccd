//! Agent CRUD, API key settings, and the dashboard chat entry point.

use axum::extract::{Path, State};
use axum::response::Json;
use deskhand_core::agent::find_service;
use deskhand_core::ChannelKind;
use serde::Deserialize;
use serde_json::json;

use crate::auth::AuthedUser;
use crate::{ApiError, SharedState};

#[derive(Deserialize)]
pub struct AddAiRequest {
    pub ai_id: String,
}

/// Catalog lookup — validates the requested service exists before the
/// client proceeds to the configuration step.
pub async fn add_ai_handler(
    _user: AuthedUser,
    Json(request): Json<AddAiRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let service =
        find_service(&request.ai_id).ok_or_else(|| ApiError::bad_request("AI service not found"))?;
    Ok(Json(json!({ "success": true, "ai_service": service })))
}

#[derive(Deserialize)]
pub struct SaveAiRequest {
    pub ai_id: String,
    pub ai_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub business_info: String,
}

pub async fn save_ai_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<SaveAiRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let service =
        find_service(&request.ai_id).ok_or_else(|| ApiError::bad_request("AI service not found"))?;

    let agent = state
        .store
        .insert_agent(
            &ctx.user_id,
            &request.ai_id,
            &request.ai_name,
            &request.description,
            &request.business_info,
            service.name,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": format!("{} added successfully!", service.name),
        "ai_id": agent.id,
    })))
}

pub async fn delete_ai_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Path(agent_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_agent(&ctx.user_id, &agent_id).await?;
    Ok(Json(json!({ "success": true, "message": "AI deleted successfully!" })))
}

#[derive(Deserialize)]
pub struct BusinessContextRequest {
    pub ai_id: String,
    #[serde(default)]
    pub business_info: String,
}

pub async fn business_context_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<BusinessContextRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let updated = state
        .store
        .update_business_info(&ctx.user_id, &request.ai_id, &request.business_info)
        .await?;
    if !updated {
        return Err(ApiError::not_found("AI configuration not found"));
    }
    Ok(Json(json!({
        "success": true,
        "message": "Business context updated successfully!",
    })))
}

#[derive(Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub ai_id: String,
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_sender")]
    pub sender_id: String,
}

fn default_platform() -> String {
    "dashboard".into()
}
fn default_sender() -> String {
    "user".into()
}

/// Dashboard chat — the same pipeline path every channel webhook uses.
pub async fn chat_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let channel = request
        .platform
        .parse::<ChannelKind>()
        .unwrap_or(ChannelKind::Dashboard);

    let response = state
        .pipeline
        .respond(
            &request.message,
            &ctx.user_id,
            &request.ai_id,
            channel,
            &request.sender_id,
        )
        .await;

    Ok(Json(json!({ "success": true, "response": response })))
}

#[derive(Deserialize)]
pub struct SaveKeyRequest {
    pub service_name: String,
    pub api_key: String,
}

pub async fn save_key_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<SaveKeyRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.service_name.is_empty() || request.api_key.is_empty() {
        return Err(ApiError::bad_request("Service name and API key are required"));
    }
    let key_id = state
        .store
        .upsert_api_key(&ctx.user_id, &request.service_name, &request.api_key)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "API key saved successfully!",
        "key_id": key_id,
    })))
}

pub async fn delete_key_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Path(key_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state.store.delete_api_key(&ctx.user_id, &key_id).await?;
    Ok(Json(json!({ "success": true, "message": "API key deleted successfully!" })))
}
