use sqlx::{MySql, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Executor wraps a database transaction for use by the snippet runner.
///
/// This struct provides a shared reference to a MySQL transaction so a
/// snippet and its follow-up probes can observe the same uncommitted state.
#[derive(Clone, Debug)]
pub struct Executor {
    pub tx: Arc<Mutex<Option<Transaction<'static, MySql>>>>,
}

impl Executor {
    /// Creates a new Executor from a MySQL transaction.
    pub fn new(tx: Transaction<'static, MySql>) -> Self {
        Self {
            tx: Arc::new(Mutex::new(Some(tx))),
        }
    }

    /// Takes ownership of the transaction, leaving None in its place.
    /// This should only be called when committing or rolling back.
    pub(crate) async fn take_transaction(&self) -> Result<Transaction<'static, MySql>, sqlx::Error> {
        self.tx.lock().await.take().ok_or(sqlx::Error::PoolClosed)
    }
}
