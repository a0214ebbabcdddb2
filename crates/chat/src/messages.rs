//! Posting, reading, editing and deleting messages.

use std::sync::Arc;

use chatline_core::chat::Message;
use chatline_core::store::{ChatStore, MessageStore};
use chatline_core::types::{ChatId, MessageId, UserId};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ChatError, ChatResult};

/// Input for posting a message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    #[serde(default)]
    pub reply_to: Option<MessageId>,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

/// Input for editing a message.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct MessageEdit {
    pub id: MessageId,
    #[validate(length(min = 1, max = 4096))]
    pub content: String,
}

#[derive(Clone)]
pub struct MessageService {
    messages: Arc<dyn MessageStore>,
    chats: Arc<dyn ChatStore>,
}

impl MessageService {
    pub fn new(messages: Arc<dyn MessageStore>, chats: Arc<dyn ChatStore>) -> Self {
        Self { messages, chats }
    }

    /// Post a message. The author must take part in the chat, and a reply
    /// must answer a message of the same chat.
    pub async fn post(&self, input: &NewMessage) -> ChatResult<Message> {
        input
            .validate()
            .map_err(|e| ChatError::Validation(e.to_string()))?;
        require_text(&input.content)?;

        if self.chats.read_by_id(input.chat_id).await?.is_none() {
            return Err(ChatError::ChatNotFound);
        }
        if !self
            .chats
            .is_participant(input.chat_id, input.user_id)
            .await?
        {
            return Err(ChatError::NotParticipant);
        }
        if let Some(parent_id) = input.reply_to {
            let parent = self.messages.read_by_id(parent_id).await?;
            if !parent.is_some_and(|p| p.chat_id == input.chat_id) {
                return Err(ChatError::Validation(
                    "reply_to must reference a message in the same chat".into(),
                ));
            }
        }

        let message = Message {
            id: Uuid::new_v4(),
            chat_id: input.chat_id,
            user_id: input.user_id,
            reply_to: input.reply_to,
            content: input.content.clone(),
            created_at: Utc::now(),
            edited_at: None,
        };
        self.messages.create(&message).await?;

        tracing::debug!(message_id = %message.id, chat_id = %message.chat_id, "Message posted");
        Ok(message)
    }

    pub async fn find_by_id(&self, id: MessageId) -> ChatResult<Message> {
        self.messages
            .read_by_id(id)
            .await?
            .ok_or(ChatError::MessageNotFound)
    }

    /// Newest message of the chat with the given tag.
    pub async fn last_in_chat(&self, chat_tag: &str) -> ChatResult<Message> {
        let chat = self
            .chats
            .read_by_tag(chat_tag)
            .await?
            .ok_or(ChatError::ChatNotFound)?;
        self.messages
            .last_in_chat(chat.id)
            .await?
            .ok_or(ChatError::MessageNotFound)
    }

    pub async fn edit(&self, input: &MessageEdit) -> ChatResult<Message> {
        input
            .validate()
            .map_err(|e| ChatError::Validation(e.to_string()))?;
        require_text(&input.content)?;

        let edited = self
            .find_by_id(input.id)
            .await?
            .edited(input.content.clone(), Utc::now());
        if !self.messages.update(&edited).await? {
            return Err(ChatError::MessageNotFound);
        }
        Ok(edited)
    }

    pub async fn delete(&self, id: MessageId) -> ChatResult<()> {
        if !self.messages.delete(id).await? {
            return Err(ChatError::MessageNotFound);
        }
        tracing::debug!(message_id = %id, "Message deleted");
        Ok(())
    }
}

fn require_text(content: &str) -> ChatResult<()> {
    if content.trim().is_empty() {
        return Err(ChatError::Validation("content must not be blank".into()));
    }
    Ok(())
}
