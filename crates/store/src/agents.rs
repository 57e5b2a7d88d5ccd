//! Agent records and API key settings.

use chrono::Utc;
use deskhand_core::{Agent, StoreError};

use crate::accounts::get;
use crate::{new_id, parse_timestamp, Store};

impl Store {
    /// Insert a new agent for an owner.
    pub async fn insert_agent(
        &self,
        owner_id: &str,
        service_id: &str,
        display_name: &str,
        description: &str,
        business_info: &str,
        service_name: &str,
    ) -> Result<Agent, StoreError> {
        let agent = Agent {
            id: new_id(),
            owner_id: owner_id.to_string(),
            service_id: service_id.to_string(),
            display_name: display_name.to_string(),
            description: description.to_string(),
            business_info: business_info.to_string(),
            service_name: service_name.to_string(),
            status: "active".to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO agents (id, owner_id, service_id, display_name, description,
                                business_info, service_name, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&agent.id)
        .bind(&agent.owner_id)
        .bind(&agent.service_id)
        .bind(&agent.display_name)
        .bind(&agent.description)
        .bind(&agent.business_info)
        .bind(&agent.service_name)
        .bind(&agent.status)
        .bind(agent.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT agent: {e}")))?;

        Ok(agent)
    }

    /// All active agents for an owner, most recent first.
    pub async fn agents_for_owner(&self, owner_id: &str) -> Result<Vec<Agent>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM agents
            WHERE owner_id = ?1 AND status = 'active'
            ORDER BY created_at DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("agents for owner: {e}")))?;

        rows.iter().map(row_to_agent).collect()
    }

    /// One agent, owner-scoped.
    pub async fn agent(&self, owner_id: &str, agent_id: &str) -> Result<Option<Agent>, StoreError> {
        let row = sqlx::query("SELECT * FROM agents WHERE id = ?1 AND owner_id = ?2")
            .bind(agent_id)
            .bind(owner_id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("agent lookup: {e}")))?;
        row.as_ref().map(row_to_agent).transpose()
    }

    /// Delete an agent. Returns whether a row was removed.
    pub async fn delete_agent(&self, owner_id: &str, agent_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM agents WHERE id = ?1 AND owner_id = ?2")
            .bind(agent_id)
            .bind(owner_id)
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE agent: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Replace an agent's business context text.
    pub async fn update_business_info(
        &self,
        owner_id: &str,
        agent_id: &str,
        business_info: &str,
    ) -> Result<bool, StoreError> {
        let result =
            sqlx::query("UPDATE agents SET business_info = ?1 WHERE id = ?2 AND owner_id = ?3")
                .bind(business_info)
                .bind(agent_id)
                .bind(owner_id)
                .execute(self.pool())
                .await
                .map_err(|e| StoreError::Storage(format!("UPDATE business_info: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Upsert an API key for (owner, service). Returns the row id.
    pub async fn upsert_api_key(
        &self,
        owner_id: &str,
        service_name: &str,
        api_key: &str,
    ) -> Result<String, StoreError> {
        let id = new_id();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, owner_id, service_name, api_key, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(owner_id, service_name) DO UPDATE SET
                api_key = excluded.api_key,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&id)
        .bind(owner_id)
        .bind(service_name)
        .bind(api_key)
        .bind(&now)
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("UPSERT api key: {e}")))?;

        // On conflict the original id is kept; read it back.
        let row = sqlx::query("SELECT id FROM api_keys WHERE owner_id = ?1 AND service_name = ?2")
            .bind(owner_id)
            .bind(service_name)
            .fetch_one(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("api key id: {e}")))?;
        get(&row, "id")
    }

    /// The stored key value for (owner, service), if any.
    pub async fn api_key(
        &self,
        owner_id: &str,
        service_name: &str,
    ) -> Result<Option<String>, StoreError> {
        let row =
            sqlx::query("SELECT api_key FROM api_keys WHERE owner_id = ?1 AND service_name = ?2")
                .bind(owner_id)
                .bind(service_name)
                .fetch_optional(self.pool())
                .await
                .map_err(|e| StoreError::QueryFailed(format!("api key lookup: {e}")))?;
        row.as_ref().map(|r| get(r, "api_key")).transpose()
    }

    /// Delete an API key row by id, owner-scoped.
    pub async fn delete_api_key(&self, owner_id: &str, key_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM api_keys WHERE id = ?1 AND owner_id = ?2")
            .bind(key_id)
            .bind(owner_id)
            .execute(self.pool())
            .await
            .map_err(|e| StoreError::Storage(format!("DELETE api key: {e}")))?;
        Ok(result.rows_affected() > 0)
    }
}

fn row_to_agent(row: &sqlx::sqlite::SqliteRow) -> Result<Agent, StoreError> {
    let created_at: String = get(row, "created_at")?;
    Ok(Agent {
        id: get(row, "id")?,
        owner_id: get(row, "owner_id")?,
        service_id: get(row, "service_id")?,
        display_name: get(row, "display_name")?,
        description: get(row, "description")?,
        business_info: get(row, "business_info")?,
        service_name: get(row, "service_name")?,
        status: get(row, "status")?,
        created_at: parse_timestamp(&created_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_store;

    #[tokio::test]
    async fn insert_list_delete_agent() {
        let store = test_store().await;
        let agent = store
            .insert_agent("u1", "whatsapp", "Shop Bot", "front desk", "We sell bread", "WhatsApp AI Assistant")
            .await
            .unwrap();

        let listed = store.agents_for_owner("u1").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].business_info, "We sell bread");

        // Owner scoping
        assert!(store.agents_for_owner("u2").await.unwrap().is_empty());
        assert!(store.agent("u2", &agent.id).await.unwrap().is_none());

        assert!(store.delete_agent("u1", &agent.id).await.unwrap());
        assert!(store.agents_for_owner("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_respects_owner() {
        let store = test_store().await;
        let agent = store
            .insert_agent("u1", "telegram", "Bot", "", "", "Telegram AI Assistant")
            .await
            .unwrap();
        assert!(!store.delete_agent("intruder", &agent.id).await.unwrap());
        assert!(store.agent("u1", &agent.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn business_info_update() {
        let store = test_store().await;
        let agent = store
            .insert_agent("u1", "telegram", "Bot", "", "old", "Telegram AI Assistant")
            .await
            .unwrap();
        assert!(store
            .update_business_info("u1", &agent.id, "new context")
            .await
            .unwrap());
        let fetched = store.agent("u1", &agent.id).await.unwrap().unwrap();
        assert_eq!(fetched.business_info, "new context");
    }

    #[tokio::test]
    async fn api_key_upsert_semantics() {
        let store = test_store().await;
        let first_id = store.upsert_api_key("u1", "OpenRouter", "sk-one").await.unwrap();
        let second_id = store.upsert_api_key("u1", "OpenRouter", "sk-two").await.unwrap();

        // Same row updated, not a second row inserted
        assert_eq!(first_id, second_id);
        assert_eq!(
            store.api_key("u1", "OpenRouter").await.unwrap().as_deref(),
            Some("sk-two")
        );

        // Scoped by owner and service
        assert!(store.api_key("u2", "OpenRouter").await.unwrap().is_none());
        assert!(store.api_key("u1", "Other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn api_key_delete() {
        let store = test_store().await;
        let id = store.upsert_api_key("u1", "OpenRouter", "sk").await.unwrap();
        assert!(!store.delete_api_key("intruder", &id).await.unwrap());
        assert!(store.delete_api_key("u1", &id).await.unwrap());
        assert!(store.api_key("u1", "OpenRouter").await.unwrap().is_none());
    }
}
