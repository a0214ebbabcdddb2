//! Transactions spanning the session and login-history tables.

use async_trait::async_trait;
use chatline_core::store::{StoreResult, Transaction, TransactionCoordinator};
use sqlx::{PgConnection, PgPool, Postgres};

use super::map_sqlx_error;

/// An open PostgreSQL transaction. Dropping it rolls back.
pub struct PgTx(sqlx::Transaction<'static, Postgres>);

impl PgTx {
    pub(crate) fn conn(&mut self) -> &mut PgConnection {
        &mut self.0
    }
}

#[async_trait]
impl Transaction for PgTx {
    async fn commit(self) -> StoreResult<()> {
        self.0.commit().await.map_err(map_sqlx_error)
    }

    async fn rollback(self) -> StoreResult<()> {
        self.0.rollback().await.map_err(map_sqlx_error)
    }
}

/// Opens [`PgTx`] handles on the shared pool.
#[derive(Clone)]
pub struct PgTransactionCoordinator {
    pool: PgPool,
}

impl PgTransactionCoordinator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TransactionCoordinator for PgTransactionCoordinator {
    type Tx = PgTx;

    async fn begin(&self) -> StoreResult<PgTx> {
        let tx = self.pool.begin().await.map_err(map_sqlx_error)?;
        Ok(PgTx(tx))
    }
}
