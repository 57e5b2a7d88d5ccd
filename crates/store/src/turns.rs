//! Conversation turn storage.
//!
//! Append-only. "Most recent" ordering uses the created_at timestamp with
//! the autoincrement rowid as tiebreaker, so turns saved within the same
//! millisecond still come back in insertion order.

use std::str::FromStr;

use deskhand_core::turn::{ConversationTurn, Direction};
use deskhand_core::{ChannelKind, StoreError};

use crate::accounts::get;
use crate::{parse_timestamp, Store};

impl Store {
    /// Append one turn. Never mutates existing rows.
    pub async fn append_turn(&self, turn: &ConversationTurn) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO chat_turns (id, owner_id, agent_id, channel, sender_id, direction,
                                    inbound_text, outbound_text, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&turn.id)
        .bind(&turn.owner_id)
        .bind(&turn.agent_id)
        .bind(turn.channel.as_str())
        .bind(&turn.sender_id)
        .bind(turn.direction.as_str())
        .bind(&turn.inbound_text)
        .bind(&turn.outbound_text)
        .bind(turn.created_at.to_rfc3339())
        .execute(self.pool())
        .await
        .map_err(|e| StoreError::Storage(format!("INSERT turn: {e}")))?;
        Ok(())
    }

    /// The most recent `limit` turns for one conversation partner,
    /// most-recent-first.
    pub async fn recent_turns(
        &self,
        owner_id: &str,
        agent_id: &str,
        channel: ChannelKind,
        sender_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM chat_turns
            WHERE owner_id = ?1 AND agent_id = ?2 AND channel = ?3 AND sender_id = ?4
            ORDER BY created_at DESC, iid DESC
            LIMIT ?5
            "#,
        )
        .bind(owner_id)
        .bind(agent_id)
        .bind(channel.as_str())
        .bind(sender_id)
        .bind(limit as i64)
        .fetch_all(self.pool())
        .await
        .map_err(|e| StoreError::QueryFailed(format!("recent turns: {e}")))?;

        rows.iter().map(row_to_turn).collect()
    }

    /// Owner-wide chat history, optionally filtered by agent and/or channel,
    /// most-recent-first, bounded by `limit`.
    pub async fn chat_history(
        &self,
        owner_id: &str,
        agent_id: Option<&str>,
        channel: Option<ChannelKind>,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, StoreError> {
        let mut sql = String::from("SELECT * FROM chat_turns WHERE owner_id = ?1");
        if agent_id.is_some() {
            sql.push_str(" AND agent_id = ?2");
        }
        if channel.is_some() {
            sql.push_str(if agent_id.is_some() {
                " AND channel = ?3"
            } else {
                " AND channel = ?2"
            });
        }
        sql.push_str(" ORDER BY created_at DESC, iid DESC LIMIT ");
        sql.push_str(&(limit as i64).to_string());

        let mut query = sqlx::query(&sql).bind(owner_id);
        if let Some(agent_id) = agent_id {
            query = query.bind(agent_id);
        }
        if let Some(channel) = channel {
            query = query.bind(channel.as_str());
        }

        let rows = query
            .fetch_all(self.pool())
            .await
            .map_err(|e| StoreError::QueryFailed(format!("chat history: {e}")))?;

        rows.iter().map(row_to_turn).collect()
    }
}

fn row_to_turn(row: &sqlx::sqlite::SqliteRow) -> Result<ConversationTurn, StoreError> {
    let channel_raw = get(row, "channel")?;
    let channel = ChannelKind::from_str(&channel_raw)
        .map_err(|e| StoreError::QueryFailed(format!("channel column: {e}")))?;
    let direction = match get(row, "direction")?.as_str() {
        "outgoing" => Direction::Outgoing,
        _ => Direction::Incoming,
    };
    let created_at: String = get(row, "created_at")?;

    Ok(ConversationTurn {
        id: get(row, "id")?,
        owner_id: get(row, "owner_id")?,
        agent_id: get(row, "agent_id")?,
        channel,
        sender_id: get(row, "sender_id")?,
        direction,
        inbound_text: get(row, "inbound_text")?,
        outbound_text: get(row, "outbound_text")?,
        created_at: parse_timestamp(&created_at),
    })
}
