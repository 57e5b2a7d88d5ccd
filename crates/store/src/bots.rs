//! Channel credential storage.
//!
//! Credential replacement is delete-then-insert: a second setup call for the
//! same (owner, agent) pair removes the old row before writing the new one.
//! The two statements are not wrapped in a transaction against concurrent
//! setups for the same pair — a documented weakness, not fixed here.

use chrono::Utc;
use deskhand_core::credential::{TelegramCredential, WhatsAppCredential};
use deskhand_core::StoreError;

use crate::accounts::{get, get_opt};
use crate::{new_id, parse_timestamp, Store};

/// Setup payload for a WhatsApp credential.
#[derive(Debug, Clone, Default)]
pub struct WhatsAppSetup {
    pub account_sid: Option<String>,
    pub access_token: Option<String>,
    pub api_key: Option<String>,
    pub auth_token: Option<String>,
    pub phone_number: Option<String>,
    pub phone_number_id: Option<String>,
    pub whatsapp_number: Option<String>,
    pub wati_url: Option<String>,
}

impl Store {
    /// Store a Telegram bot credential, replacing any prior one for this
    /// (owner, agent) pair.
    pub async fn replace_telegram_bot(
        &self,
        owner_id: &str,
        agent_id: &str,
        bot_token: &str,
        bot_username: &str,
    ) -> Result<TelegramCredential, StoreError> {
        sqlx::query("DELETE FROM telegram_bots WHERE owner_id = ?1 AND agent_id = ?2")
            .bind(owner_id)
            .bind(agent_id)
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE telegram bot: {e}")))?;

        let cred = TelegramCredential {
            id: new_id(),
            owner_id: owner_id.to_string(),
            agent_id: agent_id.to_string(),
            bot_token: bot_token.to_string(),
            bot_username: bot_username.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO telegram_bots (id, owner_id, agent_id, bot_token, bot_username, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&cred.id)
        .bind(&cred.owner_id)
        .bind(&cred.agent_id)
        .bind(&cred.bot_token)
        .bind(&cred.bot_username)
        .bind(cred.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT telegram bot: {e}")))?;

        Ok(cred)
    }

    /// The Telegram credential for one agent, if configured.
    pub async fn telegram_bot_by_agent(
        &self,
        owner_id: &str,
        agent_id: &str,
    ) -> Result<Option<TelegramCredential>, StoreError> {
        let row = sqlx::query("SELECT * FROM telegram_bots WHERE owner_id = ?1 AND agent_id = ?2")
            .bind(owner_id)
            .bind(agent_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("telegram bot lookup: {e}")))?;
        row.as_ref().map(row_to_telegram).transpose()
    }

    /// Count of stored Telegram credentials for a pair (test/diagnostic aid).
    pub async fn telegram_bot_count(
        &self,
        owner_id: &str,
        agent_id: &str,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM telegram_bots WHERE owner_id = ?1 AND agent_id = ?2",
        )
        .bind(owner_id)
        .bind(agent_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("telegram bot count: {e}")))?;
        crate::accounts::get_i64(&row, "cnt")
    }

    /// Store a WhatsApp bot credential, replacing any prior one for this
    /// (owner, agent) pair. Returns the new bot id — it becomes part of the
    /// webhook URL.
    pub async fn replace_whatsapp_bot(
        &self,
        owner_id: &str,
        agent_id: &str,
        provider: &str,
        setup: WhatsAppSetup,
    ) -> Result<WhatsAppCredential, StoreError> {
        sqlx::query("DELETE FROM whatsapp_bots WHERE owner_id = ?1 AND agent_id = ?2")
            .bind(owner_id)
            .bind(agent_id)
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE whatsapp bot: {e}")))?;

        let cred = WhatsAppCredential {
            id: new_id(),
            owner_id: owner_id.to_string(),
            agent_id: agent_id.to_string(),
            provider: provider.to_string(),
            account_sid: setup.account_sid,
            access_token: setup.access_token,
            api_key: setup.api_key,
            auth_token: setup.auth_token,
            phone_number: setup.phone_number,
            phone_number_id: setup.phone_number_id,
            whatsapp_number: setup.whatsapp_number,
            wati_url: setup.wati_url,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO whatsapp_bots (id, owner_id, agent_id, provider, account_sid, access_token,
                                       api_key, auth_token, phone_number, phone_number_id,
                                       whatsapp_number, wati_url, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&cred.id)
        .bind(&cred.owner_id)
        .bind(&cred.agent_id)
        .bind(&cred.provider)
        .bind(&cred.account_sid)
        .bind(&cred.access_token)
        .bind(&cred.api_key)
        .bind(&cred.auth_token)
        .bind(&cred.phone_number)
        .bind(&cred.phone_number_id)
        .bind(&cred.whatsapp_number)
        .bind(&cred.wati_url)
        .bind(cred.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT whatsapp bot: {e}")))?;

        Ok(cred)
    }

    /// Webhook-side lookup by bot id. The id embedded in the webhook URL is
    /// the only capability the caller presents.
    pub async fn whatsapp_bot(&self, bot_id: &str) -> Result<Option<WhatsAppCredential>, StoreError> {
        let row = sqlx::query("SELECT * FROM whatsapp_bots WHERE id = ?1")
            .bind(bot_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("whatsapp bot lookup: {e}")))?;
        row.as_ref().map(row_to_whatsapp).transpose()
    }

    /// The WhatsApp credential for one agent, if configured.
    pub async fn whatsapp_bot_by_agent(
        &self,
        owner_id: &str,
        agent_id: &str,
    ) -> Result<Option<WhatsAppCredential>, StoreError> {
        let row = sqlx::query("SELECT * FROM whatsapp_bots WHERE owner_id = ?1 AND agent_id = ?2")
            .bind(owner_id)
            .bind(agent_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("whatsapp bot by agent: {e}")))?;
        row.as_ref().map(row_to_whatsapp).transpose()
    }

    /// Count of stored WhatsApp credentials for a pair (test/diagnostic aid).
    pub async fn whatsapp_bot_count(
        &self,
        owner_id: &str,
        agent_id: &str,
    ) -> Result<i64, StoreError> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS cnt FROM whatsapp_bots WHERE owner_id = ?1 AND agent_id = ?2",
        )
        .bind(owner_id)
        .bind(agent_id)
        .fetch_one(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("whatsapp bot count: {e}")))?;
        crate::accounts::get_i64(&row, "cnt")
    }
}

fn row_to_telegram(row: &sqlx::sqlite::SqliteRow) -> Result<TelegramCredential, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(TelegramCredential {
        id: get(row, "id")?,
        owner_id: get(row, "owner_id")?,
        agent_id: get(row, "agent_id")?,
        bot_token: get(row, "bot_token")?,
        bot_username: get(row, "bot_username")?,
        created_at: parse_timestamp(&created_at),
    })
}

fn row_to_whatsapp(row: &sqlx::sqlite::SqliteRow) -> Result<WhatsAppCredential, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(WhatsAppCredential {
        id: get(row, "id")?,
        owner_id: get(row, "owner_id")?,
        agent_id: get(row, "agent_id")?,
        provider: get(row, "provider")?,
        account_sid: get_opt(row, "account_sid")?,
        access_token: get_opt(row, "access_token")?,
        api_key: get_opt(row, "api_key")?,
        auth_token: get_opt(row, "auth_token")?,
        phone_number: get_opt(row, "phone_number")?,
        phone_number_id: get_opt(row, "phone_number_id")?,
        whatsapp_number: get_opt(row, "whatsapp_number")?,
        wati_url: get_opt(row, "wati_url")?,
        created_at: parse_timestamp(&created_at),
    })
}
