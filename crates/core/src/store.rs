//! Storage and cache ports.
//!
//! The auth and chat services depend only on these traits. Production
//! implementations live in `chatline-db` (PostgreSQL) and `chatline-cache`
//! (Redis); the
//! [`crate::memory`] module provides in-process implementations for tests.
//!
//! Writes that must commit together take the caller's transaction handle
//! (`Self::Tx`). A [`SessionStore`] and [`LoginHistoryStore`] can only be
//! combined with a [`TransactionCoordinator`] whose handle type matches.

use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::Account;
use crate::chat::{Chat, ChatOverview, Message};
use crate::session::{LoginRecord, Session};
use crate::types::{ChatId, MessageId, SessionId, Timestamp, UserId};

/// Boxed source error from a backend driver.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Infrastructure failure in a store or the cache.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] BoxError),

    #[error("cache error: {0}")]
    Cache(#[source] BoxError),

    #[error("conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn database(err: impl Into<BoxError>) -> Self {
        Self::Database(err.into())
    }

    pub fn cache(err: impl Into<BoxError>) -> Self {
        Self::Cache(err.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// An open unit of work. Dropping it without committing rolls it back.
#[async_trait]
pub trait Transaction: Send + Sized {
    async fn commit(self) -> StoreResult<()>;
    async fn rollback(self) -> StoreResult<()>;
}

/// Opens transactions spanning the session and login-history stores.
#[async_trait]
pub trait TransactionCoordinator: Send + Sync {
    type Tx: Transaction;

    async fn begin(&self) -> StoreResult<Self::Tx>;
}

/// Durable session records.
#[async_trait]
pub trait SessionStore: Send + Sync {
    type Tx: Send;

    /// Insert inside the caller's transaction.
    async fn create(&self, tx: &mut Self::Tx, session: &Session) -> StoreResult<()>;

    /// Insert outside any transaction.
    async fn create_standalone(&self, session: &Session) -> StoreResult<()>;

    async fn read_by_id(&self, id: SessionId) -> StoreResult<Option<Session>>;

    /// The session that replaced `id` on refresh, if any.
    async fn read_successor(&self, id: SessionId) -> StoreResult<Option<Session>>;

    /// Persist `revoked` and `updated_at`. Other columns are immutable and a
    /// revoked session stays revoked. Returns `false` if no row matched.
    async fn update(&self, session: &Session) -> StoreResult<bool>;

    /// Compare-and-swap revocation used by rotation: marks `id` revoked only
    /// if it is still unrevoked and still carries `expected_hash`. Returns
    /// `false` when another writer got there first.
    async fn revoke_if_current(
        &self,
        tx: &mut Self::Tx,
        id: SessionId,
        expected_hash: &str,
        now: Timestamp,
    ) -> StoreResult<bool>;

    /// Administrative hard delete.
    async fn delete(&self, id: SessionId) -> StoreResult<bool>;
}

/// Append-mostly audit log of logins.
#[async_trait]
pub trait LoginHistoryStore: Send + Sync {
    type Tx: Send;

    async fn create(&self, tx: &mut Self::Tx, record: &LoginRecord) -> StoreResult<()>;
    async fn read_by_id(&self, id: Uuid) -> StoreResult<Option<LoginRecord>>;
    async fn update(&self, record: &LoginRecord) -> StoreResult<bool>;
    async fn delete(&self, id: Uuid) -> StoreResult<bool>;
}

/// Presence store for issued tokens.
///
/// Keys are raw token text. Writes are create-if-absent: saving a token that
/// already has a live entry neither overwrites nor extends it.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn save_token(&self, token: &str, ttl: Duration) -> StoreResult<()>;
    async fn check_token(&self, token: &str) -> StoreResult<bool>;
    async fn revoke_token(&self, token: &str) -> StoreResult<()>;
}

/// Durable user accounts.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Insert a new account. Duplicate tag / email / phone yields
    /// [`StoreError::Conflict`].
    async fn create(&self, account: &Account) -> StoreResult<()>;
    async fn read_by_id(&self, id: UserId) -> StoreResult<Option<Account>>;
    async fn read_by_tag(&self, tag: &str) -> StoreResult<Option<Account>>;
    async fn read_by_email(&self, email: &str) -> StoreResult<Option<Account>>;
    async fn read_by_phone(&self, phone: &str) -> StoreResult<Option<Account>>;
}

/// Chats and their participant lists.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Insert a chat and enrol its owner as the first participant. A taken
    /// tag yields [`StoreError::Conflict`].
    async fn create(&self, chat: &Chat) -> StoreResult<()>;
    async fn read_by_id(&self, id: ChatId) -> StoreResult<Option<Chat>>;
    async fn read_by_tag(&self, tag: &str) -> StoreResult<Option<Chat>>;

    /// Persist `title`. Returns `false` if no row matched.
    async fn update(&self, chat: &Chat) -> StoreResult<bool>;

    /// Remove the chat together with its participants and messages.
    async fn delete(&self, id: ChatId) -> StoreResult<bool>;

    /// Returns `false` if the user already takes part.
    async fn add_participant(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        joined_at: Timestamp,
    ) -> StoreResult<bool>;
    async fn remove_participant(&self, chat_id: ChatId, user_id: UserId) -> StoreResult<bool>;
    async fn is_participant(&self, chat_id: ChatId, user_id: UserId) -> StoreResult<bool>;

    /// Chats the user takes part in, each with its newest message, most
    /// recently active first.
    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<ChatOverview>>;
}

/// Chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    async fn create(&self, message: &Message) -> StoreResult<()>;
    async fn read_by_id(&self, id: MessageId) -> StoreResult<Option<Message>>;

    /// Newest message of a chat.
    async fn last_in_chat(&self, chat_id: ChatId) -> StoreResult<Option<Message>>;

    /// Persist `content` and `edited_at`. Returns `false` if no row matched.
    async fn update(&self, message: &Message) -> StoreResult<bool>;
    async fn delete(&self, id: MessageId) -> StoreResult<bool>;
}
