//! Channel setup endpoints and provider webhooks.
//!
//! Webhook handlers answer success to the provider even when internal
//! processing failed — a deliberate policy to avoid provider-side retry
//! storms, not an omission.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use deskhand_channels::telegram::{parse_bot_ref, TelegramUpdate};
use deskhand_channels::{VerifyOutcome, WhatsAppWebhookReply};
use deskhand_core::WhatsAppProvider;
use deskhand_store::WhatsAppSetup;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::auth::AuthedUser;
use crate::{ApiError, SharedState};

// --- Telegram ---

#[derive(Deserialize)]
pub struct TelegramSetupRequest {
    pub ai_id: String,
    #[serde(default)]
    pub bot_token: String,
}

pub async fn telegram_setup_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<TelegramSetupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if request.bot_token.is_empty() {
        return Err(ApiError::bad_request("Bot token is required"));
    }

    let setup = state
        .telegram
        .setup(
            &ctx.user_id,
            &request.ai_id,
            &request.bot_token,
            &state.config.gateway.public_url,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "message": "Telegram bot configured successfully!",
        "bot_username": setup.bot_username,
        "webhook_url": setup.webhook_url,
    })))
}

#[derive(Deserialize)]
pub struct TelegramTestRequest {
    pub ai_id: String,
    pub chat_id: i64,
    pub message: String,
}

pub async fn telegram_test_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<TelegramTestRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .telegram
        .send_test(&ctx.user_id, &request.ai_id, request.chat_id, &request.message)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Test message sent successfully",
    })))
}

/// Inbound Telegram updates. Always answers 200 once the URL itself is
/// well-formed, regardless of payload shape or internal failures.
pub async fn telegram_webhook_handler(
    State(state): State<SharedState>,
    Path(bot_ref): Path<String>,
    body: Bytes,
) -> Response {
    let Some((owner_id, agent_id)) = parse_bot_ref(&bot_ref) else {
        return (StatusCode::BAD_REQUEST, "Invalid webhook URL").into_response();
    };

    match serde_json::from_slice::<TelegramUpdate>(&body) {
        Ok(update) => {
            state
                .telegram
                .handle_update(&state.pipeline, &owner_id, &agent_id, update)
                .await;
        }
        Err(e) => {
            // Unparseable update: acknowledge anyway, Telegram would retry.
            warn!(bot_ref = %bot_ref, error = %e, "Ignoring malformed Telegram update");
        }
    }

    (StatusCode::OK, "OK").into_response()
}

// --- WhatsApp ---

#[derive(Deserialize)]
pub struct WhatsAppSetupRequest {
    pub ai_id: String,
    pub provider: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    #[serde(default)]
    pub wati_url: Option<String>,
}

pub async fn whatsapp_setup_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Json(request): Json<WhatsAppSetupRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let provider = WhatsAppProvider::parse(&request.provider)
        .ok_or_else(|| ApiError::bad_request(format!("Unsupported provider: {}", request.provider)))?;

    let has_key = request.api_key.as_deref().is_some_and(|k| !k.is_empty());
    let has_auth = request.auth_token.as_deref().is_some_and(|t| !t.is_empty());
    match provider {
        WhatsAppProvider::Twilio if !(has_key && has_auth) => {
            return Err(ApiError::bad_request(
                "Account SID and Auth Token are required for Twilio",
            ));
        }
        WhatsAppProvider::Meta if !(has_key && has_auth) => {
            return Err(ApiError::bad_request(
                "Access Token and Phone Number ID are required for Meta",
            ));
        }
        WhatsAppProvider::Wati if !has_key => {
            return Err(ApiError::bad_request("API Key is required for WATI"));
        }
        _ => {}
    }

    // The generic api_key/auth_token fields map to provider-specific slots.
    let setup = WhatsAppSetup {
        account_sid: matches!(provider, WhatsAppProvider::Twilio)
            .then(|| request.api_key.clone())
            .flatten(),
        access_token: matches!(provider, WhatsAppProvider::Meta)
            .then(|| request.api_key.clone())
            .flatten(),
        api_key: matches!(provider, WhatsAppProvider::Wati)
            .then(|| request.api_key.clone())
            .flatten(),
        auth_token: request.auth_token.clone(),
        phone_number: request.phone_number.clone(),
        phone_number_id: matches!(provider, WhatsAppProvider::Meta)
            .then(|| request.auth_token.clone())
            .flatten(),
        whatsapp_number: request.whatsapp_number.clone().or(request.phone_number.clone()),
        wati_url: Some(
            request
                .wati_url
                .clone()
                .unwrap_or_else(|| "https://api.wati.io".to_string()),
        ),
    };

    let cred = state
        .store
        .replace_whatsapp_bot(&ctx.user_id, &request.ai_id, provider.as_str(), setup)
        .await?;

    let webhook_url = format!(
        "{}/webhook/whatsapp/{}",
        state.config.gateway.public_url.trim_end_matches('/'),
        cred.id
    );

    Ok(Json(json!({
        "success": true,
        "message": "WhatsApp bot configured successfully!",
        "bot_id": cred.id,
        "webhook_url": webhook_url,
    })))
}

#[derive(Deserialize)]
pub struct WhatsAppTestRequest {
    pub test_number: String,
    pub test_message: String,
}

pub async fn whatsapp_test_handler(
    State(state): State<SharedState>,
    AuthedUser(ctx): AuthedUser,
    Path(agent_id): Path<String>,
    Json(request): Json<WhatsAppTestRequest>,
) -> Result<Json<serde_json::Value>, ApiError> {
    state
        .whatsapp
        .send_test(&ctx.user_id, &agent_id, &request.test_number, &request.test_message)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Test message sent successfully",
    })))
}

/// Meta webhook verification handshake (GET).
pub async fn whatsapp_verify_handler(
    State(state): State<SharedState>,
    Path(bot_id): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let outcome = state
        .whatsapp
        .verify(
            &bot_id,
            params.get("hub.mode").map(String::as_str),
            params.get("hub.verify_token").map(String::as_str),
            params.get("hub.challenge").map(String::as_str),
            &state.config.channels.whatsapp_verify_token,
        )
        .await;

    match outcome {
        VerifyOutcome::Challenge(challenge) => (StatusCode::OK, challenge).into_response(),
        VerifyOutcome::Forbidden => (StatusCode::FORBIDDEN, "Verification failed").into_response(),
        VerifyOutcome::NotFound => (StatusCode::NOT_FOUND, "Bot not found").into_response(),
    }
}

/// Inbound WhatsApp messages (POST), dispatched by the stored credential's
/// provider. Twilio replies inline as TwiML; everyone else gets a plain OK.
pub async fn whatsapp_webhook_handler(
    State(state): State<SharedState>,
    Path(bot_id): Path<String>,
    body: Bytes,
) -> Response {
    match state
        .whatsapp
        .handle_webhook(&state.pipeline, &bot_id, &body)
        .await
    {
        WhatsAppWebhookReply::Ok => (StatusCode::OK, "OK").into_response(),
        WhatsAppWebhookReply::Twiml(xml) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/xml")],
            xml,
        )
            .into_response(),
        WhatsAppWebhookReply::NotFound => (StatusCode::NOT_FOUND, "Bot not found").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use crate::auth::tests::{body_json, json_request, signup};
    use crate::build_router;
    use crate::test_support::test_state;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use deskhand_store::WhatsAppSetup;
    use http_body_util::BodyExt;
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn telegram_setup_requires_token() {
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;

        let response = build_router(state)
            .oneshot(json_request(
                "POST",
                "/api/telegram/setup",
                Some(&token),
                json!({"ai_id": "a1", "bot_token": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Bot token is required");
    }

    #[tokio::test]
    async fn telegram_webhook_message_scenario() {
        // Spec scenario: text "hello" from 555 on an agent with no business
        // info -> 200 and exactly one stored turn with sender "555".
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;
        let agent = state
            .store
            .insert_agent(&token, "telegram", "Bot", "", "", "Telegram AI Assistant")
            .await
            .unwrap();
        state
            .store
            .upsert_api_key(&token, deskhand_pipeline::LLM_KEY_SERVICE, "sk")
            .await
            .unwrap();

        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                &format!("/webhook/telegram/{}_{}", token, agent.id),
                None,
                json!({"message": {"text": "hello", "from": {"id": 555}, "chat": {"id": 555}}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let turns = state.store.chat_history(&token, None, None, 10).await.unwrap();
        assert_eq!(turns.len(), 1);
        assert_eq!(turns[0].sender_id, "555");
        assert_eq!(turns[0].inbound_text, "hello");
        assert_eq!(turns[0].outbound_text, "canned reply");
    }

    #[tokio::test]
    async fn telegram_webhook_tolerates_garbage() {
        let state = test_state().await;

        // Malformed bot ref → 400 (the URL itself is wrong)
        let response = build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/telegram/no-separator")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unparseable body on a well-formed URL → still 200
        let response = build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/telegram/u1_a1")
                    .header("content-type", "application/json")
                    .body(Body::from("this is not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Non-text update → 200, nothing stored
        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/webhook/telegram/u1_a1",
                None,
                json!({"message": {"photo": [], "from": {"id": 1}, "chat": {"id": 1}}}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(state.store.chat_history("u1", None, None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn whatsapp_setup_validation_per_provider() {
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;

        // Twilio without auth_token
        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/whatsapp/setup",
                Some(&token),
                json!({"ai_id": "a1", "provider": "twilio", "api_key": "AC123"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // WATI without api_key
        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/whatsapp/setup",
                Some(&token),
                json!({"ai_id": "a1", "provider": "wati"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        // Unknown provider
        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/whatsapp/setup",
                Some(&token),
                json!({"ai_id": "a1", "provider": "vonage", "api_key": "k"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn whatsapp_setup_maps_meta_fields() {
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;

        let response = build_router(state.clone())
            .oneshot(json_request(
                "POST",
                "/api/whatsapp/setup",
                Some(&token),
                json!({
                    "ai_id": "a1",
                    "provider": "meta",
                    "api_key": "EAATOKEN",
                    "auth_token": "109876",
                    "phone_number": "15550001111",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let bot_id = body["bot_id"].as_str().unwrap();
        assert!(body["webhook_url"].as_str().unwrap().ends_with(bot_id));

        let cred = state.store.whatsapp_bot(bot_id).await.unwrap().unwrap();
        assert_eq!(cred.access_token.as_deref(), Some("EAATOKEN"));
        assert_eq!(cred.phone_number_id.as_deref(), Some("109876"));
        assert!(cred.account_sid.is_none());
    }

    #[tokio::test]
    async fn whatsapp_setup_replaces_credential() {
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;

        for key in ["first-key", "second-key"] {
            let response = build_router(state.clone())
                .oneshot(json_request(
                    "POST",
                    "/api/whatsapp/setup",
                    Some(&token),
                    json!({"ai_id": "a1", "provider": "wati", "api_key": key}),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        assert_eq!(state.store.whatsapp_bot_count(&token, "a1").await.unwrap(), 1);
        let cred = state.store.whatsapp_bot_by_agent(&token, "a1").await.unwrap().unwrap();
        assert_eq!(cred.api_key.as_deref(), Some("second-key"));
    }

    #[tokio::test]
    async fn meta_verification_handshake() {
        let state = test_state().await;
        let verify_token = state.config.channels.whatsapp_verify_token.clone();

        // Seed a bot so the URL resolves
        let cred = state
            .store
            .replace_whatsapp_bot("u1", "a1", "meta", WhatsAppSetup::default())
            .await
            .unwrap();

        // Correct token echoes the challenge
        let uri = format!(
            "/webhook/whatsapp/{}?hub.mode=subscribe&hub.verify_token={}&hub.challenge=abc123",
            cred.id, verify_token
        );
        let response = build_router(state.clone())
            .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"abc123");

        // Wrong token → 403
        let uri = format!(
            "/webhook/whatsapp/{}?hub.mode=subscribe&hub.verify_token=wrong&hub.challenge=abc123",
            cred.id
        );
        let response = build_router(state)
            .oneshot(Request::builder().uri(&uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn twilio_webhook_replies_inline_xml() {
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;
        let agent = state
            .store
            .insert_agent(&token, "whatsapp", "Bot", "", "ctx", "WhatsApp AI Assistant")
            .await
            .unwrap();
        state
            .store
            .upsert_api_key(&token, deskhand_pipeline::LLM_KEY_SERVICE, "sk")
            .await
            .unwrap();
        let cred = state
            .store
            .replace_whatsapp_bot(
                &token,
                &agent.id,
                "twilio",
                WhatsAppSetup {
                    account_sid: Some("AC1".into()),
                    auth_token: Some("tok".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let response = build_router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(format!("/webhook/whatsapp/{}", cred.id))
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("Body=hello&From=whatsapp%3A%2B4477"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "text/xml");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        let xml = String::from_utf8_lossy(&body);
        assert!(xml.contains("<Message>canned reply</Message>"));
    }

    #[tokio::test]
    async fn whatsapp_webhook_unknown_bot_is_404() {
        let state = test_state().await;
        let response = build_router(state)
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/webhook/whatsapp/ghost")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn whatsapp_test_requires_configured_bot() {
        let state = test_state().await;
        let token = signup(state.clone(), "o@example.com").await;

        let response = build_router(state)
            .oneshot(json_request(
                "POST",
                "/api/whatsapp/test/ghost-agent",
                Some(&token),
                json!({"test_number": "4477", "test_message": "ping"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
