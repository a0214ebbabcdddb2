//! Repository for the `user_login_histories` table.

use async_trait::async_trait;
use chatline_core::session::LoginRecord;
use chatline_core::store::{LoginHistoryStore, StoreResult};
use sqlx::PgPool;
use uuid::Uuid;

use super::map_sqlx_error;
use super::transaction::PgTx;
use crate::models::login_history::LoginHistoryRow;

const COLUMNS: &str = "login_id, user_id, login_time, user_agent, ip_address, success";

/// [`LoginHistoryStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgLoginHistoryStore {
    pool: PgPool,
}

impl PgLoginHistoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoginHistoryStore for PgLoginHistoryStore {
    type Tx = PgTx;

    async fn create(&self, tx: &mut PgTx, record: &LoginRecord) -> StoreResult<()> {
        let query = format!(
            "INSERT INTO user_login_histories ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6)"
        );
        sqlx::query(&query)
            .bind(record.id)
            .bind(record.user_id)
            .bind(record.login_time)
            .bind(&record.user_agent)
            .bind(&record.ip_address)
            .bind(record.success)
            .execute(tx.conn())
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn read_by_id(&self, id: Uuid) -> StoreResult<Option<LoginRecord>> {
        let query = format!("SELECT {COLUMNS} FROM user_login_histories WHERE login_id = $1");
        let row = sqlx::query_as::<_, LoginHistoryRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(LoginRecord::from))
    }

    async fn update(&self, record: &LoginRecord) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE user_login_histories
             SET user_agent = $2, ip_address = $3, success = $4
             WHERE login_id = $1",
        )
        .bind(record.id)
        .bind(&record.user_agent)
        .bind(&record.ip_address)
        .bind(record.success)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM user_login_histories WHERE login_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(result.rows_affected() > 0)
    }
}
