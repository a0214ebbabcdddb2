//! In-process implementations of the storage and cache ports.
//!
//! Used by unit and HTTP tests. [`MemoryDatabase`] stages transactional
//! writes and applies them on commit; a rotation's compare-and-swap claims
//! the session until the transaction finishes, the way a row lock would.
//! The same handle also serves the account, chat and message stores.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use uuid::Uuid;

use crate::account::Account;
use crate::chat::{newest_first, Chat, ChatOverview, Message};
use crate::session::{LoginRecord, Session};
use crate::store::{
    AccountStore, ChatStore, LoginHistoryStore, MessageStore, SessionCache, SessionStore,
    StoreError, StoreResult, Transaction, TransactionCoordinator,
};
use crate::types::{ChatId, MessageId, SessionId, Timestamp, UserId};

// ---------------------------------------------------------------------------
// Database
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct DbState {
    sessions: HashMap<SessionId, Session>,
    login_records: HashMap<Uuid, LoginRecord>,
    accounts: HashMap<UserId, Account>,
    chats: HashMap<ChatId, Chat>,
    participants: HashSet<(ChatId, UserId)>,
    messages: HashMap<MessageId, Message>,
    /// Sessions held by an in-flight rotation.
    claimed: HashSet<SessionId>,
    fail_login_history: bool,
}

/// Shared in-memory stand-in for the relational store.
#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<DbState>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, DbState> {
        lock_state(&self.state)
    }

    /// Make every login-history insert fail until reset.
    pub fn set_login_history_failure(&self, fail: bool) {
        self.lock().fail_login_history = fail;
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn login_records_for(&self, user_id: UserId) -> Vec<LoginRecord> {
        self.lock()
            .login_records
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect()
    }

    pub fn sessions_for(&self, user_id: UserId) -> Vec<Session> {
        let mut sessions: Vec<_> = self
            .lock()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| s.updated_at);
        sessions
    }
}

fn lock_state<T>(state: &Mutex<T>) -> MutexGuard<'_, T> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug)]
enum StagedWrite {
    InsertSession(Session),
    InsertLoginRecord(LoginRecord),
    Revoke { id: SessionId, now: Timestamp },
}

/// Transaction handle for [`MemoryDatabase`].
#[derive(Debug)]
pub struct MemoryTx {
    state: Arc<Mutex<DbState>>,
    writes: Vec<StagedWrite>,
    claims: Vec<SessionId>,
    finished: bool,
}

impl MemoryTx {
    fn release_claims(&mut self, state: &mut DbState) {
        for id in self.claims.drain(..) {
            state.claimed.remove(&id);
        }
        self.finished = true;
    }
}

impl Drop for MemoryTx {
    fn drop(&mut self) {
        if !self.finished {
            let state = Arc::clone(&self.state);
            let mut guard = lock_state(&state);
            self.release_claims(&mut guard);
        }
    }
}

#[async_trait]
impl Transaction for MemoryTx {
    async fn commit(mut self) -> StoreResult<()> {
        let state = Arc::clone(&self.state);
        let mut guard = lock_state(&state);
        for write in self.writes.drain(..) {
            match write {
                StagedWrite::InsertSession(session) => {
                    guard.sessions.insert(session.id, session);
                }
                StagedWrite::InsertLoginRecord(record) => {
                    guard.login_records.insert(record.id, record);
                }
                StagedWrite::Revoke { id, now } => {
                    if let Some(session) = guard.sessions.get_mut(&id) {
                        session.revoked = true;
                        session.updated_at = now;
                    }
                }
            }
        }
        self.release_claims(&mut guard);
        Ok(())
    }

    async fn rollback(mut self) -> StoreResult<()> {
        let state = Arc::clone(&self.state);
        let mut guard = lock_state(&state);
        self.writes.clear();
        self.release_claims(&mut guard);
        Ok(())
    }
}

#[async_trait]
impl TransactionCoordinator for MemoryDatabase {
    type Tx = MemoryTx;

    async fn begin(&self) -> StoreResult<MemoryTx> {
        Ok(MemoryTx {
            state: Arc::clone(&self.state),
            writes: Vec::new(),
            claims: Vec::new(),
            finished: false,
        })
    }
}

fn duplicate_session(id: SessionId) -> StoreError {
    StoreError::Conflict(format!("session {id} already exists"))
}

#[async_trait]
impl SessionStore for MemoryDatabase {
    type Tx = MemoryTx;

    async fn create(&self, tx: &mut MemoryTx, session: &Session) -> StoreResult<()> {
        if self.lock().sessions.contains_key(&session.id) {
            return Err(duplicate_session(session.id));
        }
        tx.writes.push(StagedWrite::InsertSession(session.clone()));
        Ok(())
    }

    async fn create_standalone(&self, session: &Session) -> StoreResult<()> {
        let mut state = self.lock();
        if state.sessions.contains_key(&session.id) {
            return Err(duplicate_session(session.id));
        }
        state.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn read_by_id(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self.lock().sessions.get(&id).cloned())
    }

    async fn read_successor(&self, id: SessionId) -> StoreResult<Option<Session>> {
        Ok(self
            .lock()
            .sessions
            .values()
            .find(|s| s.rotated_from_session_id == Some(id))
            .cloned())
    }

    async fn update(&self, session: &Session) -> StoreResult<bool> {
        let mut state = self.lock();
        match state.sessions.get_mut(&session.id) {
            Some(existing) => {
                existing.revoked = existing.revoked || session.revoked;
                existing.updated_at = session.updated_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_if_current(
        &self,
        tx: &mut MemoryTx,
        id: SessionId,
        expected_hash: &str,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let mut state = self.lock();
        let current = state
            .sessions
            .get(&id)
            .is_some_and(|s| !s.revoked && s.refresh_token_hash == expected_hash);
        if !current || !state.claimed.insert(id) {
            return Ok(false);
        }
        tx.claims.push(id);
        tx.writes.push(StagedWrite::Revoke { id, now });
        Ok(true)
    }

    async fn delete(&self, id: SessionId) -> StoreResult<bool> {
        Ok(self.lock().sessions.remove(&id).is_some())
    }
}

#[async_trait]
impl LoginHistoryStore for MemoryDatabase {
    type Tx = MemoryTx;

    async fn create(&self, tx: &mut MemoryTx, record: &LoginRecord) -> StoreResult<()> {
        if self.lock().fail_login_history {
            return Err(StoreError::database("login history unavailable"));
        }
        tx.writes.push(StagedWrite::InsertLoginRecord(record.clone()));
        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> StoreResult<Option<LoginRecord>> {
        Ok(self.lock().login_records.get(&id).cloned())
    }

    async fn update(&self, record: &LoginRecord) -> StoreResult<bool> {
        let mut state = self.lock();
        match state.login_records.get_mut(&record.id) {
            Some(existing) => {
                *existing = record.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.lock().login_records.remove(&id).is_some())
    }
}

#[async_trait]
impl AccountStore for MemoryDatabase {
    async fn create(&self, account: &Account) -> StoreResult<()> {
        let mut state = self.lock();
        let clash = state.accounts.values().any(|existing| {
            existing.tag == account.tag
                || (account.email.is_some() && existing.email == account.email)
                || (account.phone.is_some() && existing.phone == account.phone)
        });
        if clash {
            return Err(StoreError::Conflict(format!(
                "account with tag '{}' already exists",
                account.tag
            )));
        }
        state.accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn read_by_id(&self, id: UserId) -> StoreResult<Option<Account>> {
        Ok(self.lock().accounts.get(&id).cloned())
    }

    async fn read_by_tag(&self, tag: &str) -> StoreResult<Option<Account>> {
        Ok(self.find_account(|a| a.tag == tag))
    }

    async fn read_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        Ok(self.find_account(|a| a.email.as_deref() == Some(email)))
    }

    async fn read_by_phone(&self, phone: &str) -> StoreResult<Option<Account>> {
        Ok(self.find_account(|a| a.phone.as_deref() == Some(phone)))
    }
}

impl MemoryDatabase {
    fn find_account(&self, predicate: impl Fn(&Account) -> bool) -> Option<Account> {
        self.lock().accounts.values().find(|a| predicate(a)).cloned()
    }
}

#[async_trait]
impl ChatStore for MemoryDatabase {
    async fn create(&self, chat: &Chat) -> StoreResult<()> {
        let mut state = self.lock();
        if state.chats.values().any(|existing| existing.tag == chat.tag) {
            return Err(StoreError::Conflict(format!(
                "chat with tag '{}' already exists",
                chat.tag
            )));
        }
        state.chats.insert(chat.id, chat.clone());
        state.participants.insert((chat.id, chat.owner_id));
        Ok(())
    }

    async fn read_by_id(&self, id: ChatId) -> StoreResult<Option<Chat>> {
        Ok(self.lock().chats.get(&id).cloned())
    }

    async fn read_by_tag(&self, tag: &str) -> StoreResult<Option<Chat>> {
        Ok(self.lock().chats.values().find(|c| c.tag == tag).cloned())
    }

    async fn update(&self, chat: &Chat) -> StoreResult<bool> {
        let mut state = self.lock();
        match state.chats.get_mut(&chat.id) {
            Some(existing) => {
                existing.title = chat.title.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ChatId) -> StoreResult<bool> {
        let mut state = self.lock();
        if state.chats.remove(&id).is_none() {
            return Ok(false);
        }
        state.participants.retain(|(chat_id, _)| *chat_id != id);
        state.messages.retain(|_, m| m.chat_id != id);
        Ok(true)
    }

    async fn add_participant(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        _joined_at: Timestamp,
    ) -> StoreResult<bool> {
        Ok(self.lock().participants.insert((chat_id, user_id)))
    }

    async fn remove_participant(&self, chat_id: ChatId, user_id: UserId) -> StoreResult<bool> {
        Ok(self.lock().participants.remove(&(chat_id, user_id)))
    }

    async fn is_participant(&self, chat_id: ChatId, user_id: UserId) -> StoreResult<bool> {
        Ok(self.lock().participants.contains(&(chat_id, user_id)))
    }

    async fn list_for_user(&self, user_id: UserId) -> StoreResult<Vec<ChatOverview>> {
        let state = self.lock();
        let mut overviews: Vec<ChatOverview> = state
            .participants
            .iter()
            .filter(|(_, member)| *member == user_id)
            .filter_map(|(chat_id, _)| state.chats.get(chat_id))
            .map(|chat| ChatOverview {
                chat: chat.clone(),
                last_message: state
                    .messages
                    .values()
                    .filter(|m| m.chat_id == chat.id)
                    .min_by(|a, b| newest_first(a, b))
                    .cloned(),
            })
            .collect();
        overviews.sort_by(|a, b| {
            last_activity(b)
                .cmp(&last_activity(a))
                .then_with(|| a.chat.id.cmp(&b.chat.id))
        });
        Ok(overviews)
    }
}

fn last_activity(overview: &ChatOverview) -> Timestamp {
    overview
        .last_message
        .as_ref()
        .map_or(overview.chat.created_at, |m| m.created_at)
}

#[async_trait]
impl MessageStore for MemoryDatabase {
    async fn create(&self, message: &Message) -> StoreResult<()> {
        let mut state = self.lock();
        if state.messages.contains_key(&message.id) {
            return Err(StoreError::Conflict(format!(
                "message {} already exists",
                message.id
            )));
        }
        state.messages.insert(message.id, message.clone());
        Ok(())
    }

    async fn read_by_id(&self, id: MessageId) -> StoreResult<Option<Message>> {
        Ok(self.lock().messages.get(&id).cloned())
    }

    async fn last_in_chat(&self, chat_id: ChatId) -> StoreResult<Option<Message>> {
        Ok(self
            .lock()
            .messages
            .values()
            .filter(|m| m.chat_id == chat_id)
            .min_by(|a, b| newest_first(a, b))
            .cloned())
    }

    async fn update(&self, message: &Message) -> StoreResult<bool> {
        let mut state = self.lock();
        match state.messages.get_mut(&message.id) {
            Some(existing) => {
                existing.content = message.content.clone();
                existing.edited_at = message.edited_at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: MessageId) -> StoreResult<bool> {
        let mut state = self.lock();
        if state.messages.remove(&id).is_none() {
            return Ok(false);
        }
        for reply in state.messages.values_mut() {
            if reply.reply_to == Some(id) {
                reply.reply_to = None;
            }
        }
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Instant>,
    unavailable: bool,
    saves_before_failure: Option<usize>,
    check_delay: Option<Duration>,
}

/// TTL-bound presence cache with create-if-absent writes. Expiry follows the
/// Tokio clock, so paused-time tests can advance past a TTL.
#[derive(Debug, Clone, Default)]
pub struct MemorySessionCache {
    state: Arc<Mutex<CacheState>>,
}

impl MemorySessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        lock_state(&self.state)
    }

    /// Fail every operation while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.lock().unavailable = unavailable;
    }

    /// Let `count` more saves succeed, then fail the rest.
    pub fn fail_saves_after(&self, count: usize) {
        self.lock().saves_before_failure = Some(count);
    }

    /// Stall every lookup by `delay`.
    pub fn set_check_delay(&self, delay: Duration) {
        self.lock().check_delay = Some(delay);
    }

    /// Remaining lifetime of a live entry.
    pub fn ttl_remaining(&self, token: &str) -> Option<Duration> {
        let now = Instant::now();
        self.lock()
            .entries
            .get(token)
            .filter(|expires_at| **expires_at > now)
            .map(|expires_at| *expires_at - now)
    }
}

fn cache_down() -> StoreError {
    StoreError::cache("cache unavailable")
}

#[async_trait]
impl SessionCache for MemorySessionCache {
    async fn save_token(&self, token: &str, ttl: Duration) -> StoreResult<()> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(cache_down());
        }
        if let Some(remaining) = state.saves_before_failure.as_mut() {
            if *remaining == 0 {
                return Err(cache_down());
            }
            *remaining -= 1;
        }
        let now = Instant::now();
        let live = state.entries.get(token).is_some_and(|exp| *exp > now);
        if !live {
            state.entries.insert(token.to_string(), now + ttl);
        }
        Ok(())
    }

    async fn check_token(&self, token: &str) -> StoreResult<bool> {
        let delay = self.lock().check_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let state = self.lock();
        if state.unavailable {
            return Err(cache_down());
        }
        Ok(state
            .entries
            .get(token)
            .is_some_and(|exp| *exp > Instant::now()))
    }

    async fn revoke_token(&self, token: &str) -> StoreResult<()> {
        let mut state = self.lock();
        if state.unavailable {
            return Err(cache_down());
        }
        state.entries.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn session() -> Session {
        Session::new_login(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "hash-a".into(),
            Utc::now(),
            chrono::Duration::days(1),
        )
    }

    #[tokio::test]
    async fn uncommitted_writes_are_invisible_and_dropped_on_rollback() {
        let db = MemoryDatabase::new();
        let session = session();

        let mut tx = db.begin().await.unwrap();
        SessionStore::create(&db, &mut tx, &session).await.unwrap();
        assert!(SessionStore::read_by_id(&db, session.id).await.unwrap().is_none());

        tx.rollback().await.unwrap();
        assert!(SessionStore::read_by_id(&db, session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn compare_and_swap_admits_one_writer() {
        let db = MemoryDatabase::new();
        let session = session();
        db.create_standalone(&session).await.unwrap();

        let mut first = db.begin().await.unwrap();
        let mut second = db.begin().await.unwrap();
        let now = Utc::now();

        assert!(db.revoke_if_current(&mut first, session.id, "hash-a", now).await.unwrap());
        assert!(!db.revoke_if_current(&mut second, session.id, "hash-a", now).await.unwrap());

        first.commit().await.unwrap();
        drop(second);

        let stored = SessionStore::read_by_id(&db, session.id).await.unwrap().unwrap();
        assert!(stored.revoked);
        let mut third = db.begin().await.unwrap();
        assert!(!db.revoke_if_current(&mut third, session.id, "hash-a", now).await.unwrap());
    }

    #[tokio::test]
    async fn dropped_transaction_releases_its_claim() {
        let db = MemoryDatabase::new();
        let session = session();
        db.create_standalone(&session).await.unwrap();
        let now = Utc::now();

        let mut abandoned = db.begin().await.unwrap();
        assert!(db.revoke_if_current(&mut abandoned, session.id, "hash-a", now).await.unwrap());
        drop(abandoned);

        let mut retry = db.begin().await.unwrap();
        assert!(db.revoke_if_current(&mut retry, session.id, "hash-a", now).await.unwrap());
    }

    #[tokio::test]
    async fn update_never_unrevokes() {
        let db = MemoryDatabase::new();
        let session = session();
        db.create_standalone(&session).await.unwrap();

        let revoked = session.revoked_at(Utc::now());
        assert!(SessionStore::update(&db, &revoked).await.unwrap());
        assert!(SessionStore::update(&db, &session).await.unwrap());

        let stored = SessionStore::read_by_id(&db, session.id).await.unwrap().unwrap();
        assert!(stored.revoked);
    }

    #[tokio::test(start_paused = true)]
    async fn cache_save_is_create_if_absent() {
        let cache = MemorySessionCache::new();
        cache.save_token("tok", Duration::from_secs(60)).await.unwrap();
        tokio::time::advance(Duration::from_secs(30)).await;

        cache.save_token("tok", Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.ttl_remaining("tok"), Some(Duration::from_secs(30)));

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(!cache.check_token("tok").await.unwrap());
    }

    fn chat(tag: &str, owner_id: UserId) -> Chat {
        Chat {
            id: Uuid::new_v4(),
            tag: tag.into(),
            owner_id,
            title: tag.to_uppercase(),
            created_at: Utc::now(),
        }
    }

    fn message(chat_id: ChatId, user_id: UserId, at: Timestamp) -> Message {
        Message {
            id: Uuid::new_v4(),
            chat_id,
            user_id,
            reply_to: None,
            content: "hi".into(),
            created_at: at,
            edited_at: None,
        }
    }

    #[tokio::test]
    async fn chat_listing_follows_latest_activity() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let quiet = chat("quiet", owner);
        let busy = chat("busy", owner);
        ChatStore::create(&db, &quiet).await.unwrap();
        ChatStore::create(&db, &busy).await.unwrap();

        let later = Utc::now() + chrono::Duration::seconds(10);
        let newest = message(busy.id, owner, later);
        MessageStore::create(&db, &message(busy.id, owner, Utc::now())).await.unwrap();
        MessageStore::create(&db, &newest).await.unwrap();

        let listed = db.list_for_user(owner).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].chat.id, busy.id);
        assert_eq!(listed[0].last_message.as_ref().map(|m| m.id), Some(newest.id));
        assert!(listed[1].last_message.is_none());

        assert!(db.list_for_user(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_chat_removes_members_and_messages() {
        let db = MemoryDatabase::new();
        let owner = Uuid::new_v4();
        let room = chat("room", owner);
        ChatStore::create(&db, &room).await.unwrap();
        let posted = message(room.id, owner, Utc::now());
        MessageStore::create(&db, &posted).await.unwrap();

        assert!(ChatStore::delete(&db, room.id).await.unwrap());
        assert!(!db.is_participant(room.id, owner).await.unwrap());
        assert!(MessageStore::read_by_id(&db, posted.id).await.unwrap().is_none());
        assert!(!ChatStore::delete(&db, room.id).await.unwrap());
    }

    #[tokio::test]
    async fn duplicate_chat_tag_conflicts() {
        let db = MemoryDatabase::new();
        ChatStore::create(&db, &chat("room", Uuid::new_v4())).await.unwrap();
        let err = ChatStore::create(&db, &chat("room", Uuid::new_v4())).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}
