//! SQLite persistence adapter for Deskhand.
//!
//! One database file, one table per entity. Migrations run in code at
//! startup — no external migration files to ship. Every query is scoped by
//! owner identity: no method exposes a cross-owner read or write.
//!
//! Pass `"sqlite::memory:"` for an in-process ephemeral database (tests).

mod accounts;
mod agents;
mod bots;
mod datasets;
mod turns;

pub use accounts::NewPartnerClient;
pub use bots::WhatsAppSetup;
pub use datasets::NewSale;

use chrono::{DateTime, Utc};
use deskhand_core::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use tracing::{debug, info};

/// The persistence adapter. Cheap to clone (pool handle inside).
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (or create) the database and run migrations.
    pub async fn new(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| StoreError::Storage(format!("Invalid SQLite url: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite store initialized at {url}");
        Ok(store)
    }

    pub(crate) fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create all tables and indexes if they do not exist.
    async fn run_migrations(&self) -> Result<(), StoreError> {
        let statements: &[(&str, &str)] = &[
            (
                "users",
                r#"
                CREATE TABLE IF NOT EXISTS users (
                    id              TEXT PRIMARY KEY,
                    email           TEXT UNIQUE NOT NULL,
                    password_hash   TEXT NOT NULL,
                    business_name   TEXT NOT NULL DEFAULT '',
                    country_code    TEXT NOT NULL DEFAULT '',
                    whatsapp_number TEXT NOT NULL DEFAULT '',
                    created_at      TEXT NOT NULL
                )
                "#,
            ),
            (
                "agents",
                r#"
                CREATE TABLE IF NOT EXISTS agents (
                    id            TEXT PRIMARY KEY,
                    owner_id      TEXT NOT NULL,
                    service_id    TEXT NOT NULL,
                    display_name  TEXT NOT NULL,
                    description   TEXT NOT NULL DEFAULT '',
                    business_info TEXT NOT NULL DEFAULT '',
                    service_name  TEXT NOT NULL,
                    status        TEXT NOT NULL DEFAULT 'active',
                    created_at    TEXT NOT NULL
                )
                "#,
            ),
            (
                "api_keys",
                r#"
                CREATE TABLE IF NOT EXISTS api_keys (
                    id           TEXT PRIMARY KEY,
                    owner_id     TEXT NOT NULL,
                    service_name TEXT NOT NULL,
                    api_key      TEXT NOT NULL,
                    created_at   TEXT NOT NULL,
                    updated_at   TEXT NOT NULL,
                    UNIQUE(owner_id, service_name)
                )
                "#,
            ),
            (
                "chat_turns",
                r#"
                CREATE TABLE IF NOT EXISTS chat_turns (
                    iid           INTEGER PRIMARY KEY AUTOINCREMENT,
                    id            TEXT UNIQUE NOT NULL,
                    owner_id      TEXT NOT NULL,
                    agent_id      TEXT NOT NULL,
                    channel       TEXT NOT NULL,
                    sender_id     TEXT NOT NULL,
                    direction     TEXT NOT NULL,
                    inbound_text  TEXT NOT NULL,
                    outbound_text TEXT NOT NULL,
                    created_at    TEXT NOT NULL
                )
                "#,
            ),
            (
                "telegram_bots",
                r#"
                CREATE TABLE IF NOT EXISTS telegram_bots (
                    id           TEXT PRIMARY KEY,
                    owner_id     TEXT NOT NULL,
                    agent_id     TEXT NOT NULL,
                    bot_token    TEXT NOT NULL,
                    bot_username TEXT NOT NULL,
                    created_at   TEXT NOT NULL
                )
                "#,
            ),
            (
                "whatsapp_bots",
                r#"
                CREATE TABLE IF NOT EXISTS whatsapp_bots (
                    id              TEXT PRIMARY KEY,
                    owner_id        TEXT NOT NULL,
                    agent_id        TEXT NOT NULL,
                    provider        TEXT NOT NULL,
                    account_sid     TEXT,
                    access_token    TEXT,
                    api_key         TEXT,
                    auth_token      TEXT,
                    phone_number    TEXT,
                    phone_number_id TEXT,
                    whatsapp_number TEXT,
                    wati_url        TEXT,
                    created_at      TEXT NOT NULL
                )
                "#,
            ),
            (
                "datasets",
                r#"
                CREATE TABLE IF NOT EXISTS datasets (
                    id              TEXT PRIMARY KEY,
                    owner_id        TEXT NOT NULL,
                    name            TEXT NOT NULL,
                    description     TEXT NOT NULL DEFAULT '',
                    source_filename TEXT NOT NULL DEFAULT '',
                    source_type     TEXT NOT NULL DEFAULT '',
                    records         TEXT NOT NULL DEFAULT '[]',
                    record_count    INTEGER NOT NULL DEFAULT 0,
                    created_at      TEXT NOT NULL
                )
                "#,
            ),
            (
                "sales_records",
                r#"
                CREATE TABLE IF NOT EXISTS sales_records (
                    id               TEXT PRIMARY KEY,
                    owner_id         TEXT NOT NULL,
                    dataset_id       TEXT NOT NULL,
                    customer_name    TEXT NOT NULL,
                    product_service  TEXT NOT NULL,
                    amount           REAL NOT NULL,
                    quantity         INTEGER NOT NULL,
                    total            REAL NOT NULL,
                    sale_date        TEXT NOT NULL,
                    payment_method   TEXT NOT NULL DEFAULT '',
                    customer_contact TEXT NOT NULL DEFAULT '',
                    notes            TEXT NOT NULL DEFAULT '',
                    created_at       TEXT NOT NULL
                )
                "#,
            ),
            (
                "partners",
                r#"
                CREATE TABLE IF NOT EXISTS partners (
                    id            TEXT PRIMARY KEY,
                    name          TEXT NOT NULL,
                    email         TEXT UNIQUE NOT NULL,
                    password_hash TEXT NOT NULL,
                    company       TEXT NOT NULL DEFAULT '',
                    phone         TEXT NOT NULL DEFAULT '',
                    created_at    TEXT NOT NULL
                )
                "#,
            ),
            (
                "partner_clients",
                r#"
                CREATE TABLE IF NOT EXISTS partner_clients (
                    id                TEXT PRIMARY KEY,
                    partner_id        TEXT NOT NULL,
                    client_name       TEXT NOT NULL,
                    client_email      TEXT NOT NULL DEFAULT '',
                    client_phone      TEXT NOT NULL DEFAULT '',
                    client_company    TEXT NOT NULL DEFAULT '',
                    billing_amount    REAL NOT NULL,
                    billing_period    TEXT NOT NULL,
                    partner_earnings  REAL NOT NULL,
                    platform_earnings REAL NOT NULL,
                    notes             TEXT NOT NULL DEFAULT '',
                    preferences       TEXT NOT NULL DEFAULT '',
                    status            TEXT NOT NULL DEFAULT 'active',
                    created_at        TEXT NOT NULL
                )
                "#,
            ),
            (
                "chat_turns owner index",
                "CREATE INDEX IF NOT EXISTS idx_chat_turns_owner
                 ON chat_turns(owner_id, agent_id, channel, sender_id, iid DESC)",
            ),
            (
                "agents owner index",
                "CREATE INDEX IF NOT EXISTS idx_agents_owner ON agents(owner_id, created_at DESC)",
            ),
            (
                "telegram_bots agent index",
                "CREATE INDEX IF NOT EXISTS idx_telegram_bots_agent
                 ON telegram_bots(owner_id, agent_id)",
            ),
            (
                "whatsapp_bots agent index",
                "CREATE INDEX IF NOT EXISTS idx_whatsapp_bots_agent
                 ON whatsapp_bots(owner_id, agent_id)",
            ),
        ];

        for (what, sql) in statements {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| StoreError::MigrationFailed(format!("{what}: {e}")))?;
        }

        debug!("SQLite migrations complete");
        Ok(())
    }
}

/// Parse an RFC3339 timestamp column, falling back to now on corruption.
pub(crate) fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Generate a fresh record id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    Store::new("sqlite::memory:").await.unwrap()
}
