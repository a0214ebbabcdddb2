//! Repository for the `messages` table.

use async_trait::async_trait;
use chatline_core::chat::Message;
use chatline_core::store::{MessageStore, StoreResult};
use chatline_core::types::{ChatId, MessageId};
use sqlx::PgPool;

use super::map_sqlx_error;
use crate::models::chat::MessageRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, chat_id, user_id, reply_to, content, created_at, edited_at";

/// [`MessageStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgMessageStore {
    pool: PgPool,
}

impl PgMessageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MessageStore for PgMessageStore {
    async fn create(&self, message: &Message) -> StoreResult<()> {
        let query = format!("INSERT INTO messages ({COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)");
        sqlx::query(&query)
            .bind(message.id)
            .bind(message.chat_id)
            .bind(message.user_id)
            .bind(message.reply_to)
            .bind(&message.content)
            .bind(message.created_at)
            .bind(message.edited_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn read_by_id(&self, id: MessageId) -> StoreResult<Option<Message>> {
        let query = format!("SELECT {COLUMNS} FROM messages WHERE id = $1");
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Message::from))
    }

    async fn last_in_chat(&self, chat_id: ChatId) -> StoreResult<Option<Message>> {
        let query = format!(
            "SELECT {COLUMNS} FROM messages
             WHERE chat_id = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        let row = sqlx::query_as::<_, MessageRow>(&query)
            .bind(chat_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Message::from))
    }

    async fn update(&self, message: &Message) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE messages SET content = $2, edited_at = $3 WHERE id = $1")
            .bind(message.id)
            .bind(&message.content)
            .bind(message.edited_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: MessageId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM messages WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
