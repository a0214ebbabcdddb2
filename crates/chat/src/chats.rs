//! Chat lifecycle and membership.

use std::sync::Arc;

use chatline_core::chat::{Chat, ChatOverview};
use chatline_core::store::{AccountStore, ChatStore, StoreError};
use chatline_core::types::{ChatId, UserId};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::error::{ChatError, ChatResult};

/// Input for creating a chat.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewChat {
    #[validate(length(min = 1, max = 64))]
    pub tag: String,
    pub owner_id: UserId,
    #[validate(length(min = 1, max = 128))]
    pub title: String,
}

/// Input for renaming a chat.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ChatUpdate {
    pub id: ChatId,
    #[validate(length(min = 1, max = 128))]
    pub title: String,
}

/// A user's membership in a chat.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Participation {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

#[derive(Clone)]
pub struct ChatService {
    chats: Arc<dyn ChatStore>,
    accounts: Arc<dyn AccountStore>,
}

impl ChatService {
    pub fn new(chats: Arc<dyn ChatStore>, accounts: Arc<dyn AccountStore>) -> Self {
        Self { chats, accounts }
    }

    /// Create a chat. The owner becomes its first participant.
    pub async fn create(&self, input: &NewChat) -> ChatResult<Chat> {
        input
            .validate()
            .map_err(|e| ChatError::Validation(e.to_string()))?;
        self.ensure_account(input.owner_id).await?;

        if self.chats.read_by_tag(&input.tag).await?.is_some() {
            return Err(tag_taken(&input.tag));
        }

        let chat = Chat {
            id: Uuid::new_v4(),
            tag: input.tag.clone(),
            owner_id: input.owner_id,
            title: input.title.clone(),
            created_at: Utc::now(),
        };
        match self.chats.create(&chat).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => return Err(tag_taken(&input.tag)),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            chat_id = %chat.id,
            tag = %chat.tag,
            owner_id = %chat.owner_id,
            "Chat created"
        );
        Ok(chat)
    }

    pub async fn find_by_id(&self, id: ChatId) -> ChatResult<Chat> {
        self.chats.read_by_id(id).await?.ok_or(ChatError::ChatNotFound)
    }

    pub async fn find_by_tag(&self, tag: &str) -> ChatResult<Chat> {
        self.chats
            .read_by_tag(tag)
            .await?
            .ok_or(ChatError::ChatNotFound)
    }

    /// Chats the user takes part in, with their latest messages.
    pub async fn list_for_user(&self, user_id: UserId) -> ChatResult<Vec<ChatOverview>> {
        Ok(self.chats.list_for_user(user_id).await?)
    }

    pub async fn rename(&self, input: &ChatUpdate) -> ChatResult<Chat> {
        input
            .validate()
            .map_err(|e| ChatError::Validation(e.to_string()))?;
        let chat = Chat {
            title: input.title.clone(),
            ..self.find_by_id(input.id).await?
        };
        if !self.chats.update(&chat).await? {
            return Err(ChatError::ChatNotFound);
        }
        tracing::info!(chat_id = %chat.id, "Chat renamed");
        Ok(chat)
    }

    /// Delete a chat with all its messages.
    pub async fn delete(&self, id: ChatId) -> ChatResult<()> {
        if !self.chats.delete(id).await? {
            return Err(ChatError::ChatNotFound);
        }
        tracing::info!(chat_id = %id, "Chat deleted");
        Ok(())
    }

    pub async fn add_participant(&self, input: &Participation) -> ChatResult<()> {
        self.find_by_id(input.chat_id).await?;
        self.ensure_account(input.user_id).await?;

        if !self
            .chats
            .add_participant(input.chat_id, input.user_id, Utc::now())
            .await?
        {
            return Err(ChatError::Conflict(
                "User is already a participant of this chat".into(),
            ));
        }
        tracing::info!(chat_id = %input.chat_id, user_id = %input.user_id, "Participant added");
        Ok(())
    }

    /// Remove a participant. The owner cannot leave their own chat.
    pub async fn remove_participant(&self, input: &Participation) -> ChatResult<()> {
        let chat = self.find_by_id(input.chat_id).await?;
        if chat.owner_id == input.user_id {
            return Err(ChatError::Conflict(
                "The owner cannot leave the chat; delete it instead".into(),
            ));
        }
        if !self
            .chats
            .remove_participant(input.chat_id, input.user_id)
            .await?
        {
            return Err(ChatError::NotParticipant);
        }
        tracing::info!(chat_id = %input.chat_id, user_id = %input.user_id, "Participant removed");
        Ok(())
    }

    async fn ensure_account(&self, user_id: UserId) -> ChatResult<()> {
        match self.accounts.read_by_id(user_id).await? {
            Some(_) => Ok(()),
            None => Err(ChatError::NoAccountFound),
        }
    }
}

fn tag_taken(tag: &str) -> ChatError {
    ChatError::Conflict(format!("chat tag '{tag}' is already taken"))
}
