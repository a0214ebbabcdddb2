//! Repository for the `chats` and `chat_participants` tables.

use async_trait::async_trait;
use chatline_core::chat::{Chat, ChatOverview};
use chatline_core::store::{ChatStore, StoreResult};
use chatline_core::types::{ChatId, Timestamp, UserId};
use sqlx::PgPool;

use super::map_sqlx_error;
use crate::models::chat::{ChatOverviewRow, ChatRow};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tag, owner_id, title, created_at";

/// [`ChatStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgChatStore {
    pool: PgPool,
}

impl PgChatStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatStore for PgChatStore {
    async fn create(&self, chat: &Chat) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(map_sqlx_error)?;

        let query = format!("INSERT INTO chats ({COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
        sqlx::query(&query)
            .bind(chat.id)
            .bind(&chat.tag)
            .bind(chat.owner_id)
            .bind(&chat.title)
            .bind(chat.created_at)
            .execute(&mut *tx)
            .await
            .map_err(map_sqlx_error)?;

        sqlx::query(
            "INSERT INTO chat_participants (chat_id, user_id, joined_at) VALUES ($1, $2, $3)",
        )
        .bind(chat.id)
        .bind(chat.owner_id)
        .bind(chat.created_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(map_sqlx_error)
    }

    async fn read_by_id(&self, id: ChatId) -> StoreResult<Option<Chat>> {
        let query = format!("SELECT {COLUMNS} FROM chats WHERE id = $1");
        let row = sqlx::query_as::<_, ChatRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Chat::from))
    }

    async fn read_by_tag(&self, tag: &str) -> StoreResult<Option<Chat>> {
        let query = format!("SELECT {COLUMNS} FROM chats WHERE tag = $1");
        let row = sqlx::query_as::<_, ChatRow>(&query)
            .bind(tag)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Chat::from))
    }

    async fn update(&self, chat: &Chat) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE chats SET title = $2 WHERE id = $1")
            .bind(chat.id)
            .bind(&chat.title)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ChatId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM chats WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_participant(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        joined_at: Timestamp,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO chat_participants (chat_id, user_id, joined_at)
             VALUES ($1, $2, $3)
             ON CONFLICT (chat_id, user_id) DO NOTHING",
        )
        .bind(chat_id)
        .bind(user_id)
        .bind(joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove_participant(&self, chat_id: ChatId, user_id: UserId) -> StoreResult<bool> {
        let result =
            sqlx::query("DELETE FROM chat_participants WHERE chat_id = $1 AND user_id = $2")
                .bind(chat_id)
                .bind(user_id)
                .execute(&self.pool)
                .await
                .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_participant(&self, chat_id: ChatId, user_id: UserId) -> StoreResult<bool> {
        let (present,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                 SELECT 1 FROM chat_participants WHERE chat_id = $1 AND user_id = $2
             )",
        )
        .bind(chat_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(present)
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<ChatOverview>> {
        let rows = sqlx::query_as::<_, ChatOverviewRow>(
            "SELECT c.id, c.tag, c.owner_id, c.title, c.created_at,
                    m.id AS last_id, m.user_id AS last_user_id, m.reply_to AS last_reply_to,
                    m.content AS last_content, m.created_at AS last_created_at,
                    m.edited_at AS last_edited_at
             FROM chat_participants p
             JOIN chats c ON c.id = p.chat_id
             LEFT JOIN LATERAL (
                 SELECT id, user_id, reply_to, content, created_at, edited_at
                 FROM messages
                 WHERE chat_id = c.id
                 ORDER BY created_at DESC, id DESC
                 LIMIT 1
             ) m ON true
             WHERE p.user_id = $1
             ORDER BY COALESCE(m.created_at, c.created_at) DESC, c.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(rows.into_iter().map(ChatOverview::from).collect())
    }
}
