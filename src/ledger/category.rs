use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Direction of money flow for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        })
    }
}

/// Bucket a transaction is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Income,
    Fixed,
    Variable,
}

impl Category {
    /// Returns the expense bucket for `Fixed`/`Variable`, `None` for income.
    pub fn expense(self) -> Option<ExpenseCategory> {
        match self {
            Category::Income => None,
            Category::Fixed => Some(ExpenseCategory::Fixed),
            Category::Variable => Some(ExpenseCategory::Variable),
        }
    }

    /// Human label used in listings.
    pub fn label(self) -> &'static str {
        match self {
            Category::Income => "Income",
            Category::Fixed => "Fixed expense",
            Category::Variable => "Variable expense",
        }
    }

    /// Whether the category may be combined with `kind`.
    pub fn accepts(self, kind: TransactionKind) -> bool {
        matches!(
            (kind, self),
            (TransactionKind::Income, Category::Income)
                | (TransactionKind::Expense, Category::Fixed | Category::Variable)
        )
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Income => "income",
            Category::Fixed => "fixed",
            Category::Variable => "variable",
        })
    }
}

/// The two capped spending buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseCategory {
    Fixed,
    Variable,
}

impl ExpenseCategory {
    pub const ALL: [ExpenseCategory; 2] = [ExpenseCategory::Fixed, ExpenseCategory::Variable];
}

impl From<ExpenseCategory> for Category {
    fn from(value: ExpenseCategory) -> Self {
        match value {
            ExpenseCategory::Fixed => Category::Fixed,
            ExpenseCategory::Variable => Category::Variable,
        }
    }
}

impl fmt::Display for ExpenseCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        Category::from(*self).fmt(f)
    }
}

impl FromStr for ExpenseCategory {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "fixed" => Ok(ExpenseCategory::Fixed),
            "variable" => Ok(ExpenseCategory::Variable),
            _ => Err(LedgerError::InvalidCategory(value.to_string())),
        }
    }
}

/// Selector for transaction listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionFilter {
    #[default]
    All,
    Income,
    Fixed,
    Variable,
}

impl TransactionFilter {
    pub fn matches(self, category: Category) -> bool {
        match self {
            TransactionFilter::All => true,
            TransactionFilter::Income => category == Category::Income,
            TransactionFilter::Fixed => category == Category::Fixed,
            TransactionFilter::Variable => category == Category::Variable,
        }
    }
}

impl fmt::Display for TransactionFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransactionFilter::All => "all",
            TransactionFilter::Income => "income",
            TransactionFilter::Fixed => "fixed",
            TransactionFilter::Variable => "variable",
        })
    }
}

impl FromStr for TransactionFilter {
    type Err = LedgerError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TransactionFilter::All),
            "income" => Ok(TransactionFilter::Income),
            "fixed" => Ok(TransactionFilter::Fixed),
            "variable" => Ok(TransactionFilter::Variable),
            _ => Err(LedgerError::InvalidFilter(value.to_string())),
        }
    }
}
