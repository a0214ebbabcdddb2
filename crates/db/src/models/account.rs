//! User account row.

use chatline_core::account::Account;
use chatline_core::types::{Timestamp, UserId};
use sqlx::FromRow;

/// A row from the `user_accounts` table.
///
/// Contains the password hash -- never serialize this.
#[derive(Debug, Clone, FromRow)]
pub struct UserAccountRow {
    pub id: UserId,
    pub tag: String,
    pub name: String,
    #[sqlx(rename = "desc")]
    pub description: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub created_at: Timestamp,
}

impl From<UserAccountRow> for Account {
    fn from(row: UserAccountRow) -> Self {
        Account {
            id: row.id,
            tag: row.tag,
            name: row.name,
            description: row.description,
            password_hash: row.password_hash,
            email: row.email,
            phone: row.phone,
            created_at: row.created_at,
        }
    }
}
