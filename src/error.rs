use crate::transaction_aware::TransactionError;

/// Error type for harness operations
#[derive(Debug, thiserror::Error)]
pub enum HarnessError {
    #[error("Document format error at line {line}: {message}")]
    Document { line: usize, message: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for harness operations
pub type HarnessResult<T> = Result<T, HarnessError>;

impl HarnessError {
    pub(crate) fn document(line: usize, message: impl Into<String>) -> Self {
        Self::Document {
            line,
            message: message.into(),
        }
    }
}
