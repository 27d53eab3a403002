use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CashcardError {
    #[error("PIN verification did not complete within {0:?}")]
    Timeout(Duration),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Operation error: {0}")]
    OperationError(String),
}

impl CashcardError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, CashcardError::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, CashcardError>;
