//! Chat and message rows.

use chatline_core::chat::{Chat, ChatOverview, Message};
use chatline_core::types::{ChatId, MessageId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `chats` table.
#[derive(Debug, Clone, FromRow)]
pub struct ChatRow {
    pub id: ChatId,
    pub tag: String,
    pub owner_id: UserId,
    pub title: String,
    pub created_at: Timestamp,
}

impl From<ChatRow> for Chat {
    fn from(row: ChatRow) -> Self {
        Chat {
            id: row.id,
            tag: row.tag,
            owner_id: row.owner_id,
            title: row.title,
            created_at: row.created_at,
        }
    }
}

/// A row from the `messages` table.
#[derive(Debug, Clone, FromRow)]
pub struct MessageRow {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub reply_to: Option<MessageId>,
    pub content: String,
    pub created_at: Timestamp,
    pub edited_at: Option<Timestamp>,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            id: row.id,
            chat_id: row.chat_id,
            user_id: row.user_id,
            reply_to: row.reply_to,
            content: row.content,
            created_at: row.created_at,
            edited_at: row.edited_at,
        }
    }
}

/// A chat joined with its newest message. The `last_*` columns are all NULL
/// when the chat has no messages.
#[derive(Debug, Clone, FromRow)]
pub struct ChatOverviewRow {
    #[sqlx(flatten)]
    pub chat: ChatRow,
    pub last_id: Option<MessageId>,
    pub last_user_id: Option<UserId>,
    pub last_reply_to: Option<MessageId>,
    pub last_content: Option<String>,
    pub last_created_at: Option<Timestamp>,
    pub last_edited_at: Option<Timestamp>,
}

impl From<ChatOverviewRow> for ChatOverview {
    fn from(row: ChatOverviewRow) -> Self {
        let chat_id = row.chat.id;
        let last_message = match (
            row.last_id,
            row.last_user_id,
            row.last_content,
            row.last_created_at,
        ) {
            (Some(id), Some(user_id), Some(content), Some(created_at)) => Some(Message {
                id,
                chat_id,
                user_id,
                reply_to: row.last_reply_to,
                content,
                created_at,
                edited_at: row.last_edited_at,
            }),
            _ => None,
        };
        ChatOverview {
            chat: row.chat.into(),
            last_message,
        }
    }
}
