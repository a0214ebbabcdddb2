//! Session and login-history domain entities.
//!
//! A [`Session`] is the durable record behind a refresh token. Sessions are
//! never un-revoked and never edited beyond `revoked` / `updated_at`; a
//! refresh produces a new session linked back through
//! `rotated_from_session_id`.

use serde::Serialize;

use crate::types::{SessionId, Timestamp, UserId};

/// A row of the `user_sessions` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    /// Hex SHA-256 of the full refresh token text. Never serialized.
    #[serde(skip)]
    pub refresh_token_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub refresh_expires_at: Timestamp,
    pub last_used_at: Timestamp,
    pub revoked: bool,
    /// Weak back-reference to the session this one replaced. Audit only.
    pub rotated_from_session_id: Option<SessionId>,
}

/// Lifecycle state of a session, derived at read time and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Active,
    Rotated,
    RevokedByLogout,
    Expired,
}

impl Session {
    /// Build the session created by a fresh login.
    pub fn new_login(
        id: SessionId,
        user_id: UserId,
        refresh_token_hash: String,
        now: Timestamp,
        refresh_ttl: chrono::Duration,
    ) -> Self {
        Self {
            id,
            user_id,
            refresh_token_hash,
            created_at: now,
            updated_at: now,
            refresh_expires_at: now + refresh_ttl,
            last_used_at: now,
            revoked: false,
            rotated_from_session_id: None,
        }
    }

    /// Build the successor that replaces `self` on refresh.
    ///
    /// `created_at` is inherited so every session in a chain reports when the
    /// chain was started; the refresh window restarts from `now`.
    pub fn successor(
        &self,
        id: SessionId,
        refresh_token_hash: String,
        now: Timestamp,
        refresh_ttl: chrono::Duration,
    ) -> Self {
        Self {
            id,
            user_id: self.user_id,
            refresh_token_hash,
            created_at: self.created_at,
            updated_at: now,
            refresh_expires_at: now + refresh_ttl,
            last_used_at: now,
            revoked: false,
            rotated_from_session_id: Some(self.id),
        }
    }

    /// Copy of this session with `revoked = true`.
    pub fn revoked_at(&self, now: Timestamp) -> Self {
        Self {
            revoked: true,
            updated_at: now,
            ..self.clone()
        }
    }

    /// Whether the refresh window has closed. Expiry is passive: it is never
    /// written back to the store.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        now >= self.refresh_expires_at
    }

    /// Derive the lifecycle state. `has_successor` tells a rotated session
    /// apart from one revoked by logout.
    pub fn state(&self, now: Timestamp, has_successor: bool) -> SessionState {
        match (self.revoked, has_successor) {
            (true, true) => SessionState::Rotated,
            (true, false) => SessionState::RevokedByLogout,
            (false, _) if self.is_expired(now) => SessionState::Expired,
            (false, _) => SessionState::Active,
        }
    }
}

/// A row of the `user_login_histories` table. Written once per successful
/// login in the same transaction as the session it produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRecord {
    pub id: uuid::Uuid,
    pub user_id: UserId,
    pub login_time: Timestamp,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub success: bool,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::*;

    fn login_session() -> Session {
        Session::new_login(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "hash".to_string(),
            Utc::now(),
            Duration::days(30),
        )
    }

    #[test]
    fn new_login_session_is_active() {
        let session = login_session();
        assert!(session.refresh_expires_at > session.created_at);
        assert!(session.rotated_from_session_id.is_none());
        assert_eq!(session.state(Utc::now(), false), SessionState::Active);
    }

    #[test]
    fn successor_inherits_chain_start_and_links_back() {
        let original = login_session();
        let later = original.created_at + Duration::days(3);
        let next = original.successor(Uuid::new_v4(), "next".into(), later, Duration::days(30));

        assert_eq!(next.created_at, original.created_at);
        assert_eq!(next.user_id, original.user_id);
        assert_eq!(next.rotated_from_session_id, Some(original.id));
        assert_eq!(next.refresh_expires_at, later + Duration::days(30));
        assert!(!next.revoked);
    }

    #[test]
    fn state_distinguishes_rotation_from_logout() {
        let session = login_session();
        let now = Utc::now();
        let revoked = session.revoked_at(now);

        assert_eq!(revoked.state(now, true), SessionState::Rotated);
        assert_eq!(revoked.state(now, false), SessionState::RevokedByLogout);
        assert_eq!(revoked.refresh_token_hash, session.refresh_token_hash);
    }

    #[test]
    fn expiry_is_derived_from_the_clock() {
        let session = login_session();
        let after = session.refresh_expires_at;
        assert!(session.is_expired(after));
        assert_eq!(session.state(after, false), SessionState::Expired);
        assert!(!session.revoked);
    }
}
