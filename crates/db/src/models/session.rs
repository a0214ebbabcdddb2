//! User session row.

use chatline_core::session::Session;
use chatline_core::types::{SessionId, Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `user_sessions` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserSessionRow {
    pub id: SessionId,
    pub user_id: UserId,
    pub refresh_token_hash: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub refresh_expires_at: Timestamp,
    pub last_used_at: Timestamp,
    pub revoked: bool,
    pub rotated_from_session_id: Option<SessionId>,
}

impl From<UserSessionRow> for Session {
    fn from(row: UserSessionRow) -> Self {
        Session {
            id: row.id,
            user_id: row.user_id,
            refresh_token_hash: row.refresh_token_hash,
            created_at: row.created_at,
            updated_at: row.updated_at,
            refresh_expires_at: row.refresh_expires_at,
            last_used_at: row.last_used_at,
            revoked: row.revoked,
            rotated_from_session_id: row.rotated_from_session_id,
        }
    }
}
