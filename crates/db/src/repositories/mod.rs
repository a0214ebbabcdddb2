//! Repository layer.
//!
//! Each store wraps a cloned [`sqlx::PgPool`] and implements one of the
//! `chatline_core::store` ports. Transactional writes run on the caller's
//! [`PgTx`].

pub mod account_repo;
pub mod chat_repo;
pub mod login_history_repo;
pub mod message_repo;
pub mod session_repo;
pub mod transaction;

pub use account_repo::PgAccountStore;
pub use chat_repo::PgChatStore;
pub use login_history_repo::PgLoginHistoryStore;
pub use message_repo::PgMessageStore;
pub use session_repo::PgSessionStore;
pub use transaction::{PgTransactionCoordinator, PgTx};

use chatline_core::store::StoreError;

/// Classify a sqlx error for the store ports.
///
/// PostgreSQL unique violations (code `23505`) become
/// [`StoreError::Conflict`]; everything else is a database failure.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            let constraint = db_err.constraint().unwrap_or("unknown");
            return StoreError::Conflict(format!(
                "Duplicate value violates unique constraint: {constraint}"
            ));
        }
    }
    StoreError::database(err)
}
