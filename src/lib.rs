//! SQL Question Bank Harness
//!
//! This crate lints and executes the reference solutions in `questions.md`,
//! a 50-question SQL interview bank against a sample ecommerce schema
//! (`users`, `products`, `orders`). Linting is fully offline; execution runs
//! each snippet in its own MySQL transaction which is rolled back afterwards,
//! so the data-cleaning questions cannot leak mutations into later snippets.

pub mod check;
pub mod document;
pub mod error;
pub mod executor;
pub mod fixture;
pub mod lint;
pub mod runner;
pub mod transaction_aware;
pub mod unit_of_work;

pub use check::{expected_checks, Check, CheckFailure};
pub use document::{Document, Question, Section, Snippet};
pub use error::{HarnessError, HarnessResult};
pub use executor::Executor;
pub use lint::{lint_document, Finding, LintCheck, EXPECTED_QUESTION_COUNT};
pub use runner::{Runner, SnippetOutcome, SnippetReport};
pub use transaction_aware::{TransactionAware, TransactionError, TransactionResult};
pub use unit_of_work::{MySqlUnitOfWork, MySqlUnitOfWorkSession, UnitOfWork, UnitOfWorkSession};
