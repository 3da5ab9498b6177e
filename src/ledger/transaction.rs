use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::category::{Category, TransactionKind};
use crate::errors::LedgerError;

/// Integer identifier for a ledger entry.
///
/// Stored ledgers carry millisecond timestamps as ids, so new ids stay in the
/// same range (see [`IdGenerator`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(pub u64);

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for TransactionId {
    type Err = std::num::ParseIntError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        value.trim().parse().map(TransactionId)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub amount: f64,
    pub description: String,
    pub date: DateTime<Utc>,
    pub category: Category,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    /// Amount with the sign used for display (`+` income, `-` expense).
    pub fn signed_amount(&self) -> f64 {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

/// Validated request for a new ledger entry.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub category: Category,
    pub amount: f64,
    pub description: String,
}

impl NewTransaction {
    pub fn income(amount: f64, description: impl Into<String>) -> Self {
        Self {
            kind: TransactionKind::Income,
            category: Category::Income,
            amount,
            description: description.into(),
        }
    }

    pub fn expense(category: Category, amount: f64, description: impl Into<String>) -> Self {
        Self {
            kind: TransactionKind::Expense,
            category,
            amount,
            description: description.into(),
        }
    }

    /// Checks amount, description and kind/category consistency.
    ///
    /// Returns the trimmed description on success.
    pub fn validate(&self) -> Result<String, LedgerError> {
        ensure_positive(self.amount)?;
        let description = self.description.trim();
        if description.is_empty() {
            return Err(LedgerError::EmptyDescription);
        }
        if !self.category.accepts(self.kind) {
            return Err(LedgerError::CategoryMismatch {
                kind: self.kind,
                category: self.category,
            });
        }
        Ok(description.to_string())
    }
}

/// Parses user-entered amounts. Accepts a single decimal comma.
pub fn parse_amount(raw: &str) -> Result<f64, LedgerError> {
    let trimmed = raw.trim();
    let normalized = if trimmed.contains(',') && !trimmed.contains('.') {
        trimmed.replacen(',', ".", 1)
    } else {
        trimmed.to_string()
    };
    let amount: f64 = normalized
        .parse()
        .map_err(|_| LedgerError::InvalidAmount(raw.to_string()))?;
    ensure_positive(amount)?;
    Ok(amount)
}

fn ensure_positive(amount: f64) -> Result<(), LedgerError> {
    if amount.is_finite() && amount > 0.0 {
        Ok(())
    } else {
        Err(LedgerError::InvalidAmount(amount.to_string()))
    }
}

/// Monotonic id source.
///
/// Each id is the current millisecond timestamp, bumped past the last issued
/// (or observed) id so rapid successive calls never collide.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    last: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails once the id space is used up rather than reissuing an id.
    pub fn next_at(&mut self, now: DateTime<Utc>) -> Result<TransactionId, LedgerError> {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        let bumped = self
            .last
            .checked_add(1)
            .ok_or(LedgerError::IdsExhausted(TransactionId(self.last)))?;
        self.last = millis.max(bumped);
        Ok(TransactionId(self.last))
    }

    /// Ensures future ids are greater than `id`.
    pub fn observe(&mut self, id: TransactionId) {
        self.last = self.last.max(id.0);
    }
}
