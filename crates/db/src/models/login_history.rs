//! Login history row.

use chatline_core::session::LoginRecord;
use chatline_core::types::{Timestamp, UserId};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `user_login_histories` table.
#[derive(Debug, Clone, FromRow)]
pub struct LoginHistoryRow {
    pub login_id: Uuid,
    pub user_id: UserId,
    pub login_time: Timestamp,
    pub user_agent: String,
    pub ip_address: Option<String>,
    pub success: bool,
}

impl From<LoginHistoryRow> for LoginRecord {
    fn from(row: LoginHistoryRow) -> Self {
        LoginRecord {
            id: row.login_id,
            user_id: row.user_id,
            login_time: row.login_time,
            user_agent: row.user_agent,
            ip_address: row.ip_address,
            success: row.success,
        }
    }
}
