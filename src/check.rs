//! Expected result shapes for the reference solutions.
//!
//! Every question must at least execute without an engine error. Questions
//! whose results are pinned down by the seed data additionally get shape and
//! value checks, so editing a snippet (or the fixture) out from under its
//! expectation fails the run.

use std::fmt;

use crate::runner::SnippetOutcome;

/// One expectation about a snippet's outcome.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    /// The snippet executed without an engine error.
    Succeeds,
    /// A query returned exactly this many rows.
    RowCount(usize),
    /// A query returned exactly these columns, in order.
    ColumnNames(Vec<String>),
    /// A query cell, addressed by row index and column name, holds a value.
    CellEquals {
        row: usize,
        column: String,
        value: String,
    },
    /// A mutation reported exactly this many affected rows.
    Affected(u64),
    /// Run after the snippet, inside the same transaction: the probe query
    /// must return zero rows. This is how "no NULL quantities remain after
    /// Q49" is observable before the rollback.
    AfterwardsEmpty { probe_sql: String },
}

/// A failed check, attributed to its question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckFailure {
    pub question: usize,
    pub message: String,
}

impl fmt::Display for CheckFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}: {}", self.question, self.message)
    }
}

impl Check {
    /// Verify this check against a captured outcome. `AfterwardsEmpty` is
    /// applied by the runner, which owns the transaction the probe needs.
    pub fn verify(&self, outcome: &SnippetOutcome) -> Result<(), String> {
        match self {
            Check::Succeeds => match outcome {
                SnippetOutcome::Failed(message) => Err(format!("snippet failed: {message}")),
                _ => Ok(()),
            },
            Check::RowCount(expected) => match outcome {
                SnippetOutcome::Rows { rows, .. } if rows.len() == *expected => Ok(()),
                SnippetOutcome::Rows { rows, .. } => {
                    Err(format!("expected {expected} rows, got {}", rows.len()))
                }
                other => Err(format!("expected a result set, got {other:?}")),
            },
            Check::ColumnNames(expected) => match outcome {
                SnippetOutcome::Rows { columns, .. } if columns == expected => Ok(()),
                SnippetOutcome::Rows { columns, .. } => Err(format!(
                    "expected columns {expected:?}, got {columns:?}"
                )),
                other => Err(format!("expected a result set, got {other:?}")),
            },
            Check::CellEquals { row, column, value } => match outcome {
                SnippetOutcome::Rows { columns, rows } => {
                    let col = columns.iter().position(|c| c == column).ok_or_else(|| {
                        format!("no column named {column:?} in {columns:?}")
                    })?;
                    let cells = rows
                        .get(*row)
                        .ok_or_else(|| format!("no row {row}, got {} rows", rows.len()))?;
                    match cells.get(col).ok_or_else(|| {
                        format!("row {row} has no cell for column {column:?}")
                    })? {
                        Some(actual) if actual == value => Ok(()),
                        Some(actual) => Err(format!(
                            "expected {column} = {value:?} in row {row}, got {actual:?}"
                        )),
                        None => Err(format!(
                            "expected {column} = {value:?} in row {row}, got NULL"
                        )),
                    }
                }
                other => Err(format!("expected a result set, got {other:?}")),
            },
            Check::Affected(expected) => match outcome {
                SnippetOutcome::Affected(actual) if actual == expected => Ok(()),
                SnippetOutcome::Affected(actual) => {
                    Err(format!("expected {expected} affected rows, got {actual}"))
                }
                other => Err(format!("expected a row-count effect, got {other:?}")),
            },
            Check::AfterwardsEmpty { .. } => {
                Err("probe checks are applied by the runner".into())
            }
        }
    }
}

fn cell(row: usize, column: &str, value: &str) -> Check {
    Check::CellEquals {
        row,
        column: column.into(),
        value: value.into(),
    }
}

/// Expected shapes for questions whose results the seed data pins down.
/// Every other question is only required to execute cleanly.
pub fn expected_checks(question: usize) -> Vec<Check> {
    match question {
        // All eight users, in the two named columns.
        2 => vec![
            Check::ColumnNames(vec!["name".into(), "email".into()]),
            Check::RowCount(8),
        ],
        // Electronics, Home, Books.
        7 => vec![Check::RowCount(3)],
        11 => vec![cell(0, "user_count", "8")],
        14 => vec![cell(0, "cheapest", "14.00"), cell(0, "priciest", "899.00")],
        // Products 1, 2, 3, 4, 6 and 7 appear in orders.
        18 => vec![cell(0, "distinct_products", "6")],
        // Grace and Hank never order.
        24 => vec![Check::RowCount(2)],
        // The Desk Lamp and the Gift Card are never ordered.
        25 => vec![Check::RowCount(2)],
        // 599.00 is the unique second-highest distinct price.
        35 => vec![
            Check::RowCount(1),
            cell(0, "name", "Phone"),
            cell(0, "price", "599.00"),
        ],
        37 => vec![Check::RowCount(8)],
        // Orders 6, 14 and 20 have NULL quantity.
        46 => vec![Check::RowCount(3)],
        47 => vec![
            Check::RowCount(1),
            cell(0, "email", "alice@example.com"),
            cell(0, "occurrences", "2"),
        ],
        // Only Erin's mixed-case address actually changes.
        48 => vec![Check::Affected(1)],
        49 => vec![
            Check::Affected(3),
            Check::AfterwardsEmpty {
                probe_sql: "SELECT id FROM orders WHERE quantity IS NULL".into(),
            },
        ],
        _ => Vec::new(),
    }
}
