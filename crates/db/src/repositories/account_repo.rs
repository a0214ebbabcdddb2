//! Repository for the `user_accounts` table.

use async_trait::async_trait;
use chatline_core::account::Account;
use chatline_core::store::{AccountStore, StoreResult};
use chatline_core::types::UserId;
use sqlx::PgPool;

use super::map_sqlx_error;
use crate::models::account::UserAccountRow;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, tag, name, \"desc\", password_hash, email, phone, created_at";

/// [`AccountStore`] over PostgreSQL.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, column: &str, value: &str) -> StoreResult<Option<Account>> {
        let query = format!("SELECT {COLUMNS} FROM user_accounts WHERE {column} = $1");
        let row = sqlx::query_as::<_, UserAccountRow>(&query)
            .bind(value)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Account::from))
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn create(&self, account: &Account) -> StoreResult<()> {
        let query = format!(
            "INSERT INTO user_accounts ({COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        sqlx::query(&query)
            .bind(account.id)
            .bind(&account.tag)
            .bind(&account.name)
            .bind(&account.description)
            .bind(&account.password_hash)
            .bind(&account.email)
            .bind(&account.phone)
            .bind(account.created_at)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    async fn read_by_id(&self, id: UserId) -> StoreResult<Option<Account>> {
        let query = format!("SELECT {COLUMNS} FROM user_accounts WHERE id = $1");
        let row = sqlx::query_as::<_, UserAccountRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(row.map(Account::from))
    }

    async fn read_by_tag(&self, tag: &str) -> StoreResult<Option<Account>> {
        self.find_one("tag", tag).await
    }

    async fn read_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        self.find_one("email", email).await
    }

    async fn read_by_phone(&self, phone: &str) -> StoreResult<Option<Account>> {
        self.find_one("phone", phone).await
    }
}
