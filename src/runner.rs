//! Executes the reference solutions against a live MySQL database.
//!
//! Each snippet runs in its own transaction session which is always rolled
//! back, so the UPDATE/DELETE answers in the cleaning section leave the
//! fixture untouched for every other snippet. Snippets run sequentially in
//! document order. Captured cells are normalized to strings so checks can
//! compare them without caring about wire types.

use async_trait::async_trait;
use parking_lot::RwLock;
use sqlx::mysql::MySqlRow;
use sqlx::types::chrono::{NaiveDate, NaiveDateTime};
use sqlx::types::Decimal;
use sqlx::{Column, MySqlPool, Row, ValueRef};
use std::sync::Arc;

use crate::check::{expected_checks, Check, CheckFailure};
use crate::document::{Document, Question};
use crate::error::HarnessResult;
use crate::executor::Executor;
use crate::fixture;
use crate::transaction_aware::{TransactionAware, TransactionResult};
use crate::unit_of_work::{MySqlUnitOfWork, UnitOfWork, UnitOfWorkSession};

/// What running one snippet produced.
#[derive(Debug, Clone, PartialEq)]
pub enum SnippetOutcome {
    /// A query's result set. Columns are empty when no rows came back.
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<Option<String>>>,
    },
    /// A mutation's affected-row count.
    Affected(u64),
    /// The engine rejected the snippet.
    Failed(String),
}

/// The outcome and check results for one question.
#[derive(Debug, Clone, PartialEq)]
pub struct SnippetReport {
    pub question: usize,
    pub prompt: String,
    pub outcome: SnippetOutcome,
    pub failures: Vec<CheckFailure>,
}

impl SnippetReport {
    pub fn passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Counts rolled-back sessions, registered on every snippet session. After a
/// full run the count must equal the number of snippets executed.
#[derive(Default)]
struct RollbackTally {
    rolled_back: RwLock<u64>,
}

#[async_trait]
impl TransactionAware for RollbackTally {
    async fn on_commit(&self) -> TransactionResult<()> {
        Ok(())
    }

    async fn on_rollback(&self) -> TransactionResult<()> {
        *self.rolled_back.write() += 1;
        Ok(())
    }
}

/// Sequential snippet runner over a MySQL pool.
pub struct Runner {
    pool: MySqlPool,
    uow: MySqlUnitOfWork,
    tally: Arc<RollbackTally>,
}

impl Runner {
    pub fn new(pool: MySqlPool) -> Self {
        let uow = MySqlUnitOfWork::new(Arc::new(pool.clone()));
        Self {
            pool,
            uow,
            tally: Arc::new(RollbackTally::default()),
        }
    }

    /// How many snippet sessions have been rolled back so far.
    pub fn sessions_rolled_back(&self) -> u64 {
        *self.tally.rolled_back.read()
    }

    /// Load the fixture, then run every question in document order.
    pub async fn run_all(&self, doc: &Document) -> HarnessResult<Vec<SnippetReport>> {
        fixture::load(&self.pool).await?;
        let mut reports = Vec::with_capacity(doc.question_count());
        for question in doc.questions() {
            reports.push(self.run_question(question).await?);
        }
        Ok(reports)
    }

    /// Run one question's snippet in a fresh transaction, apply its checks,
    /// and roll the transaction back.
    pub async fn run_question(&self, question: &Question) -> HarnessResult<SnippetReport> {
        let Some(snippet) = question.snippet() else {
            return Ok(SnippetReport {
                question: question.number,
                prompt: question.prompt.clone(),
                outcome: SnippetOutcome::Failed("no single sql block".into()),
                failures: vec![CheckFailure {
                    question: question.number,
                    message: "question does not have exactly one sql block".into(),
                }],
            });
        };

        let session = self.uow.begin().await?;
        session.register_transaction_aware(self.tally.clone());

        let outcome = match execute_sql(session.executor(), &snippet.sql).await {
            Ok(outcome) => outcome,
            Err(err) => SnippetOutcome::Failed(err.to_string()),
        };

        let mut failures = Vec::new();
        if let Err(message) = Check::Succeeds.verify(&outcome) {
            failures.push(CheckFailure {
                question: question.number,
                message,
            });
        }
        for check in expected_checks(question.number) {
            match &check {
                Check::AfterwardsEmpty { probe_sql } => {
                    // The probe must see the snippet's uncommitted effects.
                    match execute_sql(session.executor(), probe_sql).await {
                        Ok(SnippetOutcome::Rows { rows, .. }) if rows.is_empty() => {}
                        Ok(SnippetOutcome::Rows { rows, .. }) => failures.push(CheckFailure {
                            question: question.number,
                            message: format!("probe returned {} rows, expected none", rows.len()),
                        }),
                        Ok(other) => failures.push(CheckFailure {
                            question: question.number,
                            message: format!("probe did not return a result set: {other:?}"),
                        }),
                        Err(err) => failures.push(CheckFailure {
                            question: question.number,
                            message: format!("probe failed: {err}"),
                        }),
                    }
                }
                other => {
                    if let Err(message) = other.verify(&outcome) {
                        failures.push(CheckFailure {
                            question: question.number,
                            message,
                        });
                    }
                }
            }
        }

        session.rollback().await?;

        if failures.is_empty() {
            tracing::debug!(question = question.number, "snippet passed");
        } else {
            tracing::warn!(
                question = question.number,
                failures = failures.len(),
                "snippet failed checks"
            );
        }

        Ok(SnippetReport {
            question: question.number,
            prompt: question.prompt.clone(),
            outcome,
            failures,
        })
    }
}

/// Run one statement inside the session's transaction, capturing either a
/// result set or an affected-row count.
async fn execute_sql(executor: &Executor, sql: &str) -> Result<SnippetOutcome, sqlx::Error> {
    let mut guard = executor.tx.lock().await;
    let tx = guard.as_mut().ok_or(sqlx::Error::PoolClosed)?;

    if is_query(sql) {
        let rows = sqlx::query(sql).fetch_all(&mut **tx).await?;
        let columns = rows
            .first()
            .map(|row| {
                row.columns()
                    .iter()
                    .map(|c| c.name().to_string())
                    .collect()
            })
            .unwrap_or_default();
        let mut cells = Vec::with_capacity(rows.len());
        for row in &rows {
            cells.push(row_to_cells(row)?);
        }
        Ok(SnippetOutcome::Rows {
            columns,
            rows: cells,
        })
    } else {
        let result = sqlx::query(sql).execute(&mut **tx).await?;
        Ok(SnippetOutcome::Affected(result.rows_affected()))
    }
}

/// Whether a statement produces a result set rather than a row count.
fn is_query(sql: &str) -> bool {
    let head = sql
        .trim_start()
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(head.as_str(), "SELECT" | "WITH")
}

fn row_to_cells(row: &MySqlRow) -> Result<Vec<Option<String>>, sqlx::Error> {
    (0..row.len()).map(|idx| cell_to_string(row, idx)).collect()
}

/// Normalize one cell to a string, NULLs to None. MySQL reports precise
/// column types, so the decode cascade settles on the first type the wire
/// value actually has.
fn cell_to_string(row: &MySqlRow, idx: usize) -> Result<Option<String>, sqlx::Error> {
    if row.try_get_raw(idx)?.is_null() {
        return Ok(None);
    }
    if let Ok(v) = row.try_get::<i64, _>(idx) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<u64, _>(idx) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<Decimal, _>(idx) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<f64, _>(idx) {
        return Ok(Some(v.to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveDateTime, _>(idx) {
        return Ok(Some(v.format("%Y-%m-%d %H:%M:%S").to_string()));
    }
    if let Ok(v) = row.try_get::<NaiveDate, _>(idx) {
        return Ok(Some(v.format("%Y-%m-%d").to_string()));
    }
    row.try_get::<String, _>(idx).map(Some)
}
