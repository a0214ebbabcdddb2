//! Chats, participants and messages.

use serde::Serialize;

use crate::types::{ChatId, MessageId, Timestamp, UserId};

/// A conversation addressed by a unique `tag`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chat {
    pub id: ChatId,
    pub tag: String,
    pub owner_id: UserId,
    pub title: String,
    pub created_at: Timestamp,
}

/// A message posted to a chat by one of its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub id: MessageId,
    pub chat_id: ChatId,
    pub user_id: UserId,
    /// Earlier message in the same chat this one answers.
    pub reply_to: Option<MessageId>,
    pub content: String,
    pub created_at: Timestamp,
    /// Set on every content edit.
    pub edited_at: Option<Timestamp>,
}

/// A chat as listed for one of its participants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatOverview {
    #[serde(flatten)]
    pub chat: Chat,
    pub last_message: Option<Message>,
}

impl Message {
    /// Copy with new content, stamped as edited at `now`.
    pub fn edited(&self, content: String, now: Timestamp) -> Self {
        Self {
            content,
            edited_at: Some(now),
            ..self.clone()
        }
    }
}

/// Most recent first; ties broken by id so ordering is total.
pub fn newest_first(a: &Message, b: &Message) -> std::cmp::Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;

    fn message(created_at: Timestamp) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            reply_to: None,
            content: "hi".into(),
            created_at,
            edited_at: None,
        }
    }

    #[test]
    fn edit_keeps_identity_and_stamps_time() {
        let original = message(Utc::now());
        let now = original.created_at + Duration::seconds(5);
        let edited = original.edited("hello".into(), now);

        assert_eq!(edited.id, original.id);
        assert_eq!(edited.created_at, original.created_at);
        assert_eq!(edited.content, "hello");
        assert_eq!(edited.edited_at, Some(now));
    }

    #[test]
    fn newest_message_sorts_first() {
        let t = Utc::now();
        let mut messages = vec![
            message(t),
            message(t + Duration::seconds(2)),
            message(t + Duration::seconds(1)),
        ];
        messages.sort_by(newest_first);
        assert_eq!(messages[0].created_at, t + Duration::seconds(2));
        assert_eq!(messages[2].created_at, t);
    }
}
