use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::{
    category::{Category, ExpenseCategory, TransactionKind},
    transaction::{Transaction, TransactionId},
};

const TOTAL_TOLERANCE: f64 = 1e-6;

/// Ordered sequence of every recorded transaction for one user.
///
/// Totals are derived from the sequence on every read so they cannot drift
/// from the transactions they summarize.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ledger {
    transactions: Vec<Transaction>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.transactions.iter().find(|txn| txn.id == id)
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub(crate) fn push(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }

    pub(crate) fn remove(&mut self, id: TransactionId) -> Option<Transaction> {
        let index = self.transactions.iter().position(|txn| txn.id == id)?;
        Some(self.transactions.remove(index))
    }

    pub(crate) fn clear(&mut self) {
        self.transactions.clear();
    }

    pub fn total_income(&self) -> f64 {
        self.sum_where(|txn| txn.kind == TransactionKind::Income)
    }

    pub fn expenses(&self, category: ExpenseCategory) -> f64 {
        let category = Category::from(category);
        self.sum_where(|txn| txn.kind == TransactionKind::Expense && txn.category == category)
    }

    pub fn fixed_expenses(&self) -> f64 {
        self.expenses(ExpenseCategory::Fixed)
    }

    pub fn variable_expenses(&self) -> f64 {
        self.expenses(ExpenseCategory::Variable)
    }

    fn sum_where<F>(&self, predicate: F) -> f64
    where
        F: Fn(&Transaction) -> bool,
    {
        self.transactions
            .iter()
            .filter(|txn| predicate(txn))
            .map(|txn| txn.amount)
            .sum()
    }

    pub fn max_id(&self) -> Option<TransactionId> {
        self.transactions.iter().map(|txn| txn.id).max()
    }
}

/// Persisted form of a [`Ledger`]:
/// `{ transactions, totalIncome, fixedExpenses, variableExpenses }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub transactions: Vec<Transaction>,
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub fixed_expenses: f64,
    #[serde(default)]
    pub variable_expenses: f64,
}

impl From<&Ledger> for LedgerSnapshot {
    fn from(ledger: &Ledger) -> Self {
        Self {
            transactions: ledger.transactions.clone(),
            total_income: ledger.total_income(),
            fixed_expenses: ledger.fixed_expenses(),
            variable_expenses: ledger.variable_expenses(),
        }
    }
}

/// Result of turning a stored snapshot back into a ledger.
#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub ledger: Ledger,
    pub warnings: Vec<String>,
}

impl LedgerSnapshot {
    /// Rebuilds the ledger, reporting stored totals that disagree with the
    /// transactions and entries that break the ledger invariants.
    pub fn restore(self) -> RestoreReport {
        let ledger = Ledger {
            transactions: self.transactions,
        };
        let mut warnings = ledger_warnings(&ledger);
        let checks = [
            ("totalIncome", self.total_income, ledger.total_income()),
            ("fixedExpenses", self.fixed_expenses, ledger.fixed_expenses()),
            (
                "variableExpenses",
                self.variable_expenses,
                ledger.variable_expenses(),
            ),
        ];
        for (field, stored, derived) in checks {
            if (stored - derived).abs() > TOTAL_TOLERANCE {
                warnings.push(format!(
                    "stored {field} {stored:.2} differs from transaction sum {derived:.2}"
                ));
            }
        }
        RestoreReport { ledger, warnings }
    }
}

/// Lists entries in `ledger` that violate the entry-time invariants.
pub fn ledger_warnings(ledger: &Ledger) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut warnings = Vec::new();
    for txn in &ledger.transactions {
        if !seen.insert(txn.id) {
            warnings.push(format!("duplicate transaction id {}", txn.id));
        }
        if !(txn.amount.is_finite() && txn.amount > 0.0) {
            warnings.push(format!(
                "transaction {} has non-positive amount {}",
                txn.id, txn.amount
            ));
        }
        if !txn.category.accepts(txn.kind) {
            warnings.push(format!(
                "transaction {} is {} but booked as {}",
                txn.id, txn.kind, txn.category
            ));
        }
    }
    warnings
}
