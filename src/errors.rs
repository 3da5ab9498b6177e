use thiserror::Error;

use crate::ledger::{Category, ExpenseCategory, TransactionId, TransactionKind};

/// Error type that captures ledger validation and persistence failures.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Please enter a valid amount (got `{0}`)")]
    InvalidAmount(String),
    #[error("Please enter a description")]
    EmptyDescription,
    #[error("Not enough {category} budget. Available: {available:.2}")]
    InsufficientBudget {
        category: ExpenseCategory,
        available: f64,
    },
    #[error("Transaction {0} not found")]
    NotFound(TransactionId),
    #[error("A {kind} transaction cannot use the `{category}` category")]
    CategoryMismatch {
        kind: TransactionKind,
        category: Category,
    },
    #[error("Unknown category `{0}` (expected fixed or variable)")]
    InvalidCategory(String),
    #[error("Unknown filter `{0}` (expected all, income, fixed or variable)")]
    InvalidFilter(String),
    #[error("No transaction id left after {0}; the stored ledger needs repair")]
    IdsExhausted(TransactionId),
    #[error("You must sign in to manage your expenses")]
    NotSignedIn,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl LedgerError {
    /// Validation failures block a mutation but are never fatal.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount(_)
                | LedgerError::EmptyDescription
                | LedgerError::InsufficientBudget { .. }
                | LedgerError::NotFound(_)
                | LedgerError::CategoryMismatch { .. }
                | LedgerError::InvalidCategory(_)
                | LedgerError::InvalidFilter(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
