//! HTTP API gateway for Deskhand.
//!
//! Exposes the owner-facing REST API, partner portal, channel setup
//! endpoints, provider webhooks, and static dashboard assets.
//!
//! Built on Axum. Error responses use a `{"error": "..."}` JSON payload
//! with a 4xx/5xx status; webhook endpoints deliberately answer success to
//! the provider even when internal processing failed, to avoid provider-side
//! retry storms.

pub mod assets;
pub mod auth;
mod agents_api;
mod channels_api;
mod datasets_api;
mod partners_api;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use serde::Serialize;
use serde_json::json;
use tracing::info;

use deskhand_channels::{MetaClient, TelegramChannel, TelegramClient, WatiClient, WhatsAppChannel};
use deskhand_config::AppConfig;
use deskhand_pipeline::{PipelineSettings, ResponsePipeline};
use deskhand_providers::OpenRouterProvider;
use deskhand_store::Store;

use assets::StaticCache;

/// Shared application state for the gateway.
pub struct AppState {
    pub store: Store,
    pub pipeline: Arc<ResponsePipeline>,
    pub telegram: Arc<TelegramChannel>,
    pub whatsapp: Arc<WhatsAppChannel>,
    pub config: AppConfig,
    pub assets: StaticCache,
}

pub type SharedState = Arc<AppState>;

/// JSON error payload with a status code.
///
/// Mirrors the error taxonomy: validation problems surface as 4xx with a
/// message; unexpected internal failures as 500 with a generic message.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<deskhand_core::StoreError> for ApiError {
    fn from(err: deskhand_core::StoreError) -> Self {
        tracing::error!(error = %err, "Store operation failed");
        match err {
            deskhand_core::StoreError::Duplicate(message) => Self::bad_request(message),
            deskhand_core::StoreError::NotFound(message) => Self::not_found(message),
            _ => Self::internal("Internal storage error"),
        }
    }
}

impl From<deskhand_core::Error> for ApiError {
    fn from(err: deskhand_core::Error) -> Self {
        match err {
            deskhand_core::Error::Store(store) => store.into(),
            deskhand_core::Error::Channel(channel) => Self::bad_request(channel.to_string()),
            other => {
                tracing::error!(error = %other, "Request failed");
                Self::internal("Internal error")
            }
        }
    }
}

/// Build the full application router.
pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        // Auth + dashboard
        .route("/api/auth/signup", post(auth::signup_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/dashboard", get(auth::dashboard_handler))
        // Agents
        .route("/api/ai/add", post(agents_api::add_ai_handler))
        .route("/api/ai/save", post(agents_api::save_ai_handler))
        .route("/api/ai/{id}", delete(agents_api::delete_ai_handler))
        .route(
            "/api/ai/business-context",
            post(agents_api::business_context_handler),
        )
        .route("/api/ai/chat", post(agents_api::chat_handler))
        // API keys
        .route("/api/keys", post(agents_api::save_key_handler))
        .route("/api/keys/{id}", delete(agents_api::delete_key_handler))
        // Datasets + sales
        .route("/api/databases", post(datasets_api::create_dataset_handler))
        .route("/api/databases", get(datasets_api::list_datasets_handler))
        .route("/api/databases/{id}", get(datasets_api::get_dataset_handler))
        .route(
            "/api/databases/{id}/query",
            post(datasets_api::query_dataset_handler),
        )
        .route("/api/sales", post(datasets_api::add_sale_handler))
        .route(
            "/api/sales/{db_id}/analytics",
            get(datasets_api::sales_analytics_handler),
        )
        // Partner portal
        .route("/api/partners/signup", post(partners_api::signup_handler))
        .route("/api/partners/login", post(partners_api::login_handler))
        .route("/api/partners/clients", post(partners_api::add_client_handler))
        .route("/api/partners/clients", get(partners_api::list_clients_handler))
        .route("/api/partners/earnings", get(partners_api::earnings_handler))
        // Channel setup + webhooks
        .route("/api/telegram/setup", post(channels_api::telegram_setup_handler))
        .route("/api/telegram/test", post(channels_api::telegram_test_handler))
        .route(
            "/webhook/telegram/{bot_ref}",
            post(channels_api::telegram_webhook_handler),
        )
        .route("/api/whatsapp/setup", post(channels_api::whatsapp_setup_handler))
        .route(
            "/api/whatsapp/test/{agent_id}",
            post(channels_api::whatsapp_test_handler),
        )
        .route(
            "/webhook/whatsapp/{bot_id}",
            get(channels_api::whatsapp_verify_handler)
                .post(channels_api::whatsapp_webhook_handler),
        )
        // Static dashboard assets
        .fallback(static_handler)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Wire up state from config and start serving.
pub async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let store = Store::new(&config.database.url).await?;

    let provider = Arc::new(OpenRouterProvider::new("openrouter", &config.llm.base_url));
    let pipeline = Arc::new(ResponsePipeline::new(
        store.clone(),
        provider,
        PipelineSettings {
            model: config.llm.model.clone(),
            temperature: config.llm.temperature,
            max_tokens: config.llm.max_tokens,
            history_depth: config.llm.history_depth,
        },
    ));

    let telegram = Arc::new(TelegramChannel::new(
        TelegramClient::new(&config.channels.telegram_api_url),
        store.clone(),
    ));
    let whatsapp = Arc::new(WhatsAppChannel::new(
        MetaClient::new(&config.channels.meta_api_url),
        WatiClient::new(),
        store.clone(),
    ));

    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let assets = StaticCache::new(&config.gateway.assets_dir);

    let state = Arc::new(AppState {
        store,
        pipeline,
        telegram,
        whatsapp,
        config,
        assets,
    });
    let app = build_router(state);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn static_handler(
    axum::extract::State(state): axum::extract::State<SharedState>,
    uri: axum::http::Uri,
) -> Response {
    match state.assets.get_or_load(uri.path()).await {
        Some(asset) => (
            StatusCode::OK,
            [(axum::http::header::CONTENT_TYPE, asset.content_type)],
            asset.body,
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}
