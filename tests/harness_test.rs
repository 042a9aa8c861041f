//! Integration tests against a live MySQL server. Ignored by default; run
//! them with `cargo test -- --ignored` after pointing DATABASE_URL at a
//! scratch database.

mod common;

use sqlprep::{fixture, Runner, SnippetOutcome};
use sqlx::MySqlPool;

use common::{get_database_url, load_bank};

async fn setup_database() -> MySqlPool {
    let pool = MySqlPool::connect(&get_database_url())
        .await
        .expect("Failed to connect to database");

    fixture::load(&pool).await.expect("Failed to load fixture");
    pool
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
#[ignore = "requires a MySQL server"]
async fn fixture_seeds_expected_row_counts() {
    let pool = setup_database().await;

    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .expect("Failed to count users");
    let products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(&pool)
        .await
        .expect("Failed to count products");
    let orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .expect("Failed to count orders");

    assert_eq!(users as usize, fixture::USER_COUNT);
    assert_eq!(products as usize, fixture::PRODUCT_COUNT);
    assert_eq!(orders as usize, fixture::ORDER_COUNT);

    fixture::drop_schema(&pool).await.expect("Failed to drop schema");
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
#[ignore = "requires a MySQL server"]
async fn every_reference_solution_passes_its_checks() {
    let pool = MySqlPool::connect(&get_database_url())
        .await
        .expect("Failed to connect to database");
    let doc = load_bank();

    let runner = Runner::new(pool.clone());
    let reports = runner.run_all(&doc).await.expect("Run aborted");

    let failed: Vec<String> = reports
        .iter()
        .filter(|r| !r.passed())
        .flat_map(|r| r.failures.iter().map(|f| f.to_string()))
        .collect();
    assert!(failed.is_empty(), "check failures:\n{}", failed.join("\n"));

    // One rolled-back session per snippet: nothing was committed.
    assert_eq!(runner.sessions_rolled_back(), reports.len() as u64);

    fixture::drop_schema(&pool).await.expect("Failed to drop schema");
    pool.close().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
#[serial_test::serial]
#[ignore = "requires a MySQL server"]
async fn cleaning_mutations_do_not_leak_between_snippets() {
    let pool = setup_database().await;
    let doc = load_bank();

    let runner = Runner::new(pool.clone());

    // Run the DELETE from Q49 on its own.
    let q49 = doc
        .questions()
        .find(|q| q.number == 49)
        .expect("Q49 missing");
    let report = runner.run_question(q49).await.expect("Failed to run Q49");
    assert!(report.passed(), "Q49 failed: {:?}", report.failures);
    assert!(matches!(report.outcome, SnippetOutcome::Affected(3)));

    // The rollback must have restored the NULL-quantity orders.
    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(&pool)
        .await
        .expect("Failed to count orders");
    assert_eq!(remaining as usize, fixture::ORDER_COUNT);

    let nulls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE quantity IS NULL")
        .fetch_one(&pool)
        .await
        .expect("Failed to count NULL quantities");
    assert_eq!(nulls, 3);

    fixture::drop_schema(&pool).await.expect("Failed to drop schema");
    pool.close().await;
}
