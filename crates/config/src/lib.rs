//! Configuration loading, validation, and management for Deskhand.
//!
//! Loads configuration from a TOML file (default `deskhand.toml`) with
//! environment variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Gateway (HTTP server) settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// SQLite database location
    #[serde(default)]
    pub database: DatabaseConfig,

    /// LLM provider settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// Channel webhook settings
    #[serde(default)]
    pub channels: ChannelsConfig,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("gateway", &self.gateway)
            .field("database", &self.database)
            .field("llm", &self.llm)
            .field("channels", &self.channels)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayConfig::default(),
            database: DatabaseConfig::default(),
            llm: LlmConfig::default(),
            channels: ChannelsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Public base URL providers call back to, e.g. "https://bots.example.com".
    /// Webhook registration needs this to be externally reachable.
    #[serde(default = "default_public_url")]
    pub public_url: String,

    /// Directory of static dashboard assets.
    #[serde(default = "default_assets_dir")]
    pub assets_dir: String,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8787
}
fn default_public_url() -> String {
    "http://localhost:8787".into()
}
fn default_assets_dir() -> String {
    "public".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            assets_dir: default_assets_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite connection string (`sqlite:deskhand.db` or `sqlite::memory:`).
    #[serde(default = "default_database_url")]
    pub url: String,
}

fn default_database_url() -> String {
    "sqlite:deskhand.db".into()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// OpenAI-compatible chat-completions base URL.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// How many recent turns the context assembler pulls in.
    #[serde(default = "default_history_depth")]
    pub history_depth: usize,
}

fn default_llm_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "deepseek/deepseek-chat".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    2000
}
fn default_history_depth() -> usize {
    5
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            history_depth: default_history_depth(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ChannelsConfig {
    /// Shared secret echoed back during the Meta webhook verification
    /// handshake.
    #[serde(default = "default_verify_token")]
    pub whatsapp_verify_token: String,

    /// Telegram Bot API base URL (overridable for tests).
    #[serde(default = "default_telegram_api")]
    pub telegram_api_url: String,

    /// Meta Graph API base URL.
    #[serde(default = "default_graph_api")]
    pub meta_api_url: String,
}

impl std::fmt::Debug for ChannelsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelsConfig")
            .field("whatsapp_verify_token", &"[REDACTED]")
            .field("telegram_api_url", &self.telegram_api_url)
            .field("meta_api_url", &self.meta_api_url)
            .finish()
    }
}

fn default_verify_token() -> String {
    "obeksai123".into()
}
fn default_telegram_api() -> String {
    "https://api.telegram.org".into()
}
fn default_graph_api() -> String {
    "https://graph.facebook.com/v19.0".into()
}

impl Default for ChannelsConfig {
    fn default() -> Self {
        Self {
            whatsapp_verify_token: default_verify_token(),
            telegram_api_url: default_telegram_api(),
            meta_api_url: default_graph_api(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: AppConfig = toml::from_str(&raw)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from the given path if it exists, otherwise fall back to defaults
    /// plus environment overrides.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }

    /// Environment variables win over file values.
    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("DESKHAND_HOST") {
            self.gateway.host = host;
        }
        if let Ok(port) = std::env::var("DESKHAND_PORT") {
            if let Ok(port) = port.parse() {
                self.gateway.port = port;
            }
        }
        if let Ok(url) = std::env::var("DESKHAND_PUBLIC_URL") {
            self.gateway.public_url = url;
        }
        if let Ok(url) = std::env::var("DESKHAND_DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(token) = std::env::var("DESKHAND_WHATSAPP_VERIFY_TOKEN") {
            self.channels.whatsapp_verify_token = token;
        }
        if let Ok(model) = std::env::var("DESKHAND_MODEL") {
            self.llm.model = model;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.public_url.is_empty() {
            return Err(ConfigError::Invalid("gateway.public_url is empty".into()));
        }
        if self.llm.history_depth == 0 {
            return Err(ConfigError::Invalid(
                "llm.history_depth must be at least 1".into(),
            ));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::Invalid(format!(
                "llm.temperature {} outside 0.0..=2.0",
                self.llm.temperature
            )));
        }
        Ok(())
    }

    /// Serialize the default config as a starter TOML file.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).expect("default config serializes")
    }
}
