//! Lifecycle tests for the MySQL unit of work: the commit path the snippet
//! runner never takes, and observer notification on both outcomes. Ignored
//! by default like the other DB-backed tests.

mod common;

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlprep::{
    fixture, MySqlUnitOfWork, TransactionAware, TransactionResult, UnitOfWork, UnitOfWorkSession,
};
use sqlx::MySqlPool;
use std::sync::Arc;

use common::get_database_url;

/// Records which lifecycle callback fired, like a repository would to keep
/// its caches in step with the transaction.
#[derive(Default)]
struct LifecycleTracker {
    committed: RwLock<bool>,
    rolled_back: RwLock<bool>,
}

impl LifecycleTracker {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn is_committed(&self) -> bool {
        *self.committed.read()
    }

    fn is_rolled_back(&self) -> bool {
        *self.rolled_back.read()
    }
}

#[async_trait]
impl TransactionAware for LifecycleTracker {
    async fn on_commit(&self) -> TransactionResult<()> {
        *self.committed.write() = true;
        Ok(())
    }

    async fn on_rollback(&self) -> TransactionResult<()> {
        *self.rolled_back.write() = true;
        Ok(())
    }
}

async fn setup_database() -> MySqlPool {
    let pool = MySqlPool::connect(&get_database_url())
        .await
        .expect("Failed to connect to database");

    fixture::load(&pool).await.expect("Failed to load fixture");
    pool
}

async fn insert_user(session: &impl UnitOfWorkSession, id: i32, name: &str) {
    let mut guard = session.executor().tx.lock().await;
    let tx = guard.as_mut().expect("Transaction already taken");
    sqlx::query("INSERT INTO users (id, name, email, signup_date) VALUES (?, ?, ?, '2024-06-01')")
        .bind(id)
        .bind(name)
        .bind(format!("{}@example.com", name.to_lowercase()))
        .execute(&mut **tx)
        .await
        .expect("Failed to insert user");
}

async fn count_user(pool: &MySqlPool, id: i32) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("Failed to count user")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
#[ignore = "requires a MySQL server"]
async fn commit_persists_and_notifies_observers() {
    let pool = setup_database().await;
    let uow = MySqlUnitOfWork::new(Arc::new(pool.clone()));

    // Insert within a session and commit it.
    let session = uow.begin().await.expect("Failed to begin transaction");
    let tracker = LifecycleTracker::new();
    session.register_transaction_aware(tracker.clone());

    insert_user(&session, 99, "Ivy").await;
    session.commit().await.expect("Failed to commit transaction");

    assert!(tracker.is_committed(), "Observer should see the commit");
    assert!(!tracker.is_rolled_back(), "Observer should not see a rollback");

    // The committed row is visible outside the session.
    assert_eq!(count_user(&pool, 99).await, 1);

    fixture::drop_schema(&pool).await.expect("Failed to drop schema");
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
#[ignore = "requires a MySQL server"]
async fn rollback_discards_and_notifies_observers() {
    let pool = setup_database().await;
    let uow = MySqlUnitOfWork::new(Arc::new(pool.clone()));

    let session = uow.begin().await.expect("Failed to begin transaction");
    let tracker = LifecycleTracker::new();
    session.register_transaction_aware(tracker.clone());

    insert_user(&session, 98, "Jude").await;
    session.rollback().await.expect("Failed to rollback transaction");

    assert!(!tracker.is_committed(), "Observer should not see a commit");
    assert!(tracker.is_rolled_back(), "Observer should see the rollback");

    // The rolled-back row never became visible.
    assert_eq!(count_user(&pool, 98).await, 0);

    fixture::drop_schema(&pool).await.expect("Failed to drop schema");
    pool.close().await;
}
