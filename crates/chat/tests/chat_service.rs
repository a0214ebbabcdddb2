use std::sync::Arc;

use assert_matches::assert_matches;
use chatline_chat::{
    ChatError, ChatService, ChatUpdate, MessageEdit, MessageService, NewChat, NewMessage,
    Participation,
};
use chatline_core::account::Account;
use chatline_core::chat::{Chat, Message};
use chatline_core::memory::MemoryDatabase;
use chatline_core::store::AccountStore;
use chatline_core::types::UserId;
use chrono::Utc;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

struct Harness {
    db: MemoryDatabase,
    chats: ChatService,
    messages: MessageService,
}

fn harness() -> Harness {
    let db = MemoryDatabase::new();
    Harness {
        chats: ChatService::new(Arc::new(db.clone()), Arc::new(db.clone())),
        messages: MessageService::new(Arc::new(db.clone()), Arc::new(db.clone())),
        db,
    }
}

impl Harness {
    async fn account(&self, tag: &str) -> UserId {
        let account = Account {
            id: Uuid::new_v4(),
            tag: tag.into(),
            name: tag.into(),
            description: String::new(),
            password_hash: "unused".into(),
            email: Some(format!("{tag}@example.com")),
            phone: None,
            created_at: Utc::now(),
        };
        self.db.create(&account).await.unwrap();
        account.id
    }

    async fn chat(&self, tag: &str, owner_id: UserId) -> Chat {
        self.chats
            .create(&NewChat {
                tag: tag.into(),
                owner_id,
                title: format!("{tag} room"),
            })
            .await
            .unwrap()
    }

    async fn post(&self, chat_id: Uuid, user_id: UserId, content: &str) -> Message {
        self.messages
            .post(&NewMessage {
                chat_id,
                user_id,
                reply_to: None,
                content: content.into(),
            })
            .await
            .unwrap()
    }
}

// ---------------------------------------------------------------------------
// Chats
// ---------------------------------------------------------------------------

#[tokio::test]
async fn created_chat_is_found_by_id_and_tag() {
    let h = harness();
    let owner = h.account("alice").await;
    let chat = h.chat("general", owner).await;

    assert_eq!(h.chats.find_by_id(chat.id).await.unwrap(), chat);
    assert_eq!(h.chats.find_by_tag("general").await.unwrap(), chat);

    let listed = h.chats.list_for_user(owner).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].chat, chat);
}

#[tokio::test]
async fn chat_creation_rules() {
    let h = harness();
    let owner = h.account("alice").await;
    h.chat("general", owner).await;

    let taken = h
        .chats
        .create(&NewChat {
            tag: "general".into(),
            owner_id: owner,
            title: "Another".into(),
        })
        .await;
    assert_matches!(taken, Err(ChatError::Conflict(msg)) if msg.contains("general"));

    let orphan = h
        .chats
        .create(&NewChat {
            tag: "lonely".into(),
            owner_id: Uuid::new_v4(),
            title: "Lonely".into(),
        })
        .await;
    assert_matches!(orphan, Err(ChatError::NoAccountFound));

    let untitled = h
        .chats
        .create(&NewChat {
            tag: "untitled".into(),
            owner_id: owner,
            title: String::new(),
        })
        .await;
    assert_matches!(untitled, Err(ChatError::Validation(_)));
}

#[tokio::test]
async fn rename_and_delete() {
    let h = harness();
    let owner = h.account("alice").await;
    let chat = h.chat("general", owner).await;

    let renamed = h
        .chats
        .rename(&ChatUpdate {
            id: chat.id,
            title: "Lobby".into(),
        })
        .await
        .unwrap();
    assert_eq!(renamed.title, "Lobby");
    assert_eq!(renamed.tag, "general");
    assert_eq!(h.chats.find_by_id(chat.id).await.unwrap().title, "Lobby");

    h.chats.delete(chat.id).await.unwrap();
    assert_matches!(h.chats.find_by_id(chat.id).await, Err(ChatError::ChatNotFound));
    assert_matches!(h.chats.delete(chat.id).await, Err(ChatError::ChatNotFound));
    assert_matches!(
        h.chats
            .rename(&ChatUpdate {
                id: chat.id,
                title: "Gone".into(),
            })
            .await,
        Err(ChatError::ChatNotFound)
    );
}

#[tokio::test]
async fn membership_rules() {
    let h = harness();
    let owner = h.account("alice").await;
    let guest = h.account("bob").await;
    let chat = h.chat("general", owner).await;
    let join = Participation {
        chat_id: chat.id,
        user_id: guest,
    };

    h.chats.add_participant(&join).await.unwrap();
    assert_matches!(h.chats.add_participant(&join).await, Err(ChatError::Conflict(_)));
    assert_eq!(h.chats.list_for_user(guest).await.unwrap().len(), 1);

    let stranger = Participation {
        chat_id: chat.id,
        user_id: Uuid::new_v4(),
    };
    assert_matches!(h.chats.add_participant(&stranger).await, Err(ChatError::NoAccountFound));

    let owner_leaves = Participation {
        chat_id: chat.id,
        user_id: owner,
    };
    assert_matches!(
        h.chats.remove_participant(&owner_leaves).await,
        Err(ChatError::Conflict(_))
    );

    h.chats.remove_participant(&join).await.unwrap();
    assert_matches!(
        h.chats.remove_participant(&join).await,
        Err(ChatError::NotParticipant)
    );
    assert!(h.chats.list_for_user(guest).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn only_participants_may_post() {
    let h = harness();
    let owner = h.account("alice").await;
    let outsider = h.account("mallory").await;
    let chat = h.chat("general", owner).await;

    let result = h
        .messages
        .post(&NewMessage {
            chat_id: chat.id,
            user_id: outsider,
            reply_to: None,
            content: "let me in".into(),
        })
        .await;
    assert_matches!(result, Err(ChatError::NotParticipant));

    let missing_chat = h
        .messages
        .post(&NewMessage {
            chat_id: Uuid::new_v4(),
            user_id: owner,
            reply_to: None,
            content: "hello?".into(),
        })
        .await;
    assert_matches!(missing_chat, Err(ChatError::ChatNotFound));
}

#[tokio::test]
async fn blank_content_is_rejected() {
    let h = harness();
    let owner = h.account("alice").await;
    let chat = h.chat("general", owner).await;

    for content in ["", "   \n"] {
        let result = h
            .messages
            .post(&NewMessage {
                chat_id: chat.id,
                user_id: owner,
                reply_to: None,
                content: content.into(),
            })
            .await;
        assert_matches!(result, Err(ChatError::Validation(_)));
    }
}

#[tokio::test]
async fn replies_stay_within_their_chat() {
    let h = harness();
    let owner = h.account("alice").await;
    let general = h.chat("general", owner).await;
    let random = h.chat("random", owner).await;
    let elsewhere = h.post(random.id, owner, "over here").await;
    let parent = h.post(general.id, owner, "question").await;

    let reply = h
        .messages
        .post(&NewMessage {
            chat_id: general.id,
            user_id: owner,
            reply_to: Some(parent.id),
            content: "answer".into(),
        })
        .await
        .unwrap();
    assert_eq!(reply.reply_to, Some(parent.id));

    let crossed = h
        .messages
        .post(&NewMessage {
            chat_id: general.id,
            user_id: owner,
            reply_to: Some(elsewhere.id),
            content: "wrong thread".into(),
        })
        .await;
    assert_matches!(crossed, Err(ChatError::Validation(_)));
}

#[tokio::test]
async fn last_message_follows_posting_order() {
    let h = harness();
    let owner = h.account("alice").await;
    let chat = h.chat("general", owner).await;

    assert_matches!(
        h.messages.last_in_chat("general").await,
        Err(ChatError::MessageNotFound)
    );
    assert_matches!(
        h.messages.last_in_chat("missing").await,
        Err(ChatError::ChatNotFound)
    );

    h.post(chat.id, owner, "first").await;
    tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    let second = h.post(chat.id, owner, "second").await;

    assert_eq!(h.messages.last_in_chat("general").await.unwrap(), second);
    let listed = h.chats.list_for_user(owner).await.unwrap();
    assert_eq!(listed[0].last_message.as_ref(), Some(&second));
}

#[tokio::test]
async fn edit_and_delete_message() {
    let h = harness();
    let owner = h.account("alice").await;
    let chat = h.chat("general", owner).await;
    let posted = h.post(chat.id, owner, "helo").await;

    let edited = h
        .messages
        .edit(&MessageEdit {
            id: posted.id,
            content: "hello".into(),
        })
        .await
        .unwrap();
    assert_eq!(edited.content, "hello");
    assert!(edited.edited_at.is_some());
    assert_eq!(h.messages.find_by_id(posted.id).await.unwrap(), edited);

    h.messages.delete(posted.id).await.unwrap();
    assert_matches!(
        h.messages.find_by_id(posted.id).await,
        Err(ChatError::MessageNotFound)
    );
    assert_matches!(
        h.messages.delete(posted.id).await,
        Err(ChatError::MessageNotFound)
    );
}
