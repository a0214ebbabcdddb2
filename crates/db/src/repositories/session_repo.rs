//! Repository for the `user_sessions` table.

use async_trait::async_trait;
use chatline_core::session::Session;
use chatline_core::store::{SessionStore, StoreResult};
use chatline_core::types::{SessionId, Timestamp};
use sqlx::{PgConnection, PgPool};

use super::map_sqlx_error;
use super::transaction::PgTx;
use crate::models::session::UserSessionRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, user_id, refresh_token_hash, created_at, updated_at, \
                       refresh_expires_at, last_used_at, revoked, rotated_from_session_id";

/// [`SessionStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn insert(conn: &mut PgConnection, session: &Session) -> StoreResult<()> {
        let query = format!(
            "INSERT INTO user_sessions ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        );
        sqlx::query(&query)
            .bind(session.id)
            .bind(session.user_id)
            .bind(&session.refresh_token_hash)
            .bind(session.created_at)
            .bind(session.updated_at)
            .bind(session.refresh_expires_at)
            .bind(session.last_used_at)
            .bind(session.revoked)
            .bind(session.rotated_from_session_id)
            .execute(conn)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    type Tx = PgTx;

    async fn create(&self, tx: &mut PgTx, session: &Session) -> StoreResult<()> {
        Self::insert(tx.conn(), session).await
    }

    async fn create_standalone(&self, session: &Session) -> StoreResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        Self::insert(&mut conn, session).await
    }

    async fn read_by_id(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE id = $1");
        let row = sqlx::query_as::<_, UserSessionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Session::from))
    }

    async fn read_successor(&self, id: SessionId) -> StoreResult<Option<Session>> {
        let query = format!("SELECT {COLUMNS} FROM user_sessions WHERE rotated_from_session_id = $1");
        let row = sqlx::query_as::<_, UserSessionRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Session::from))
    }

    async fn update(&self, session: &Session) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked = revoked OR $2, updated_at = $3 WHERE id = $1",
        )
        .bind(session.id)
        .bind(session.revoked)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn revoke_if_current(
        &self,
        tx: &mut PgTx,
        id: SessionId,
        expected_hash: &str,
        now: Timestamp,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_sessions SET revoked = true, updated_at = $3
             WHERE id = $1 AND revoked = false AND refresh_token_hash = $2",
        )
        .bind(id)
        .bind(expected_hash)
        .bind(now)
        .execute(tx.conn())
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: SessionId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
