//! The transaction ledger and budget-allocation engine.

use tracing::debug;

use crate::core::clock::{Clock, SystemClock};
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    BucketStatus, BudgetCaps, BudgetSummary, Category, ExpenseCategory, ExportSnapshot,
    ExportSummary, IdGenerator, Ledger, LedgerSnapshot, NewTransaction, Transaction,
    TransactionFilter, TransactionId,
};

/// Slack allowed when comparing an expense against its remaining budget, so
/// an amount equal to the cap survives float rounding of the 50/30/20 split.
pub const BUDGET_TOLERANCE: f64 = 1e-9;

/// Holds one user's ledger and enforces the budget rule on every expense.
///
/// Every operation runs to completion and leaves the ledger consistent; a
/// rejected request leaves it untouched.
pub struct LedgerEngine {
    ledger: Ledger,
    ids: IdGenerator,
    clock: Box<dyn Clock>,
}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerEngine {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            ledger: Ledger::new(),
            ids: IdGenerator::new(),
            clock,
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn transaction(&self, id: TransactionId) -> Option<&Transaction> {
        self.ledger.transaction(id)
    }

    /// Validates and records a transaction, returning the stored record.
    pub fn add_transaction(&mut self, request: NewTransaction) -> Result<Transaction> {
        let description = request.validate()?;
        if let Some(category) = request.category.expense() {
            let available = self.available_budget(category);
            if request.amount > available + BUDGET_TOLERANCE {
                return Err(LedgerError::InsufficientBudget {
                    category,
                    available,
                });
            }
        }

        let now = self.clock.now();
        let transaction = Transaction {
            id: self.ids.next_at(now)?,
            kind: request.kind,
            amount: request.amount,
            description,
            date: now,
            category: request.category,
        };
        self.ledger.push(transaction.clone());
        debug!(
            id = %transaction.id,
            category = %transaction.category,
            amount = transaction.amount,
            "transaction recorded"
        );
        Ok(transaction)
    }

    pub fn add_income(&mut self, amount: f64, description: &str) -> Result<Transaction> {
        self.add_transaction(NewTransaction::income(amount, description))
    }

    pub fn add_expense(
        &mut self,
        category: ExpenseCategory,
        amount: f64,
        description: &str,
    ) -> Result<Transaction> {
        self.add_transaction(NewTransaction::expense(
            category.into(),
            amount,
            description,
        ))
    }

    /// Removes the transaction identified by `id`, returning the removed record.
    pub fn delete_transaction(&mut self, id: TransactionId) -> Result<Transaction> {
        let removed = self
            .ledger
            .remove(id)
            .ok_or(LedgerError::NotFound(id))?;
        debug!(id = %removed.id, category = %removed.category, "transaction deleted");
        Ok(removed)
    }

    pub fn caps(&self) -> BudgetCaps {
        BudgetCaps::from_income(self.ledger.total_income())
    }

    /// Cap minus spending for `category`. Negative when over budget.
    pub fn available_budget(&self, category: ExpenseCategory) -> f64 {
        self.caps().cap(category) - self.ledger.expenses(category)
    }

    pub fn summary(&self) -> BudgetSummary {
        let caps = self.caps();
        let bucket = |category: ExpenseCategory| {
            let spent = self.ledger.expenses(category);
            let cap = caps.cap(category);
            BucketStatus {
                category,
                cap,
                spent,
                remaining: cap - spent,
            }
        };
        BudgetSummary {
            total_income: self.ledger.total_income(),
            fixed: bucket(ExpenseCategory::Fixed),
            variable: bucket(ExpenseCategory::Variable),
            savings: caps.savings_budget,
        }
    }

    /// Filtered view, most recent first; equal dates keep insertion order.
    pub fn list_transactions(&self, filter: TransactionFilter) -> Vec<&Transaction> {
        let mut view: Vec<&Transaction> = self
            .ledger
            .transactions()
            .iter()
            .filter(|txn| filter.matches(txn.category))
            .collect();
        view.sort_by(|a, b| b.date.cmp(&a.date));
        view
    }

    /// Starts a new month: every transaction is dropped, nothing is archived.
    pub fn clear_all(&mut self) {
        let dropped = self.ledger.len();
        self.ledger.clear();
        debug!(dropped, "ledger cleared");
    }

    pub fn export_snapshot(&self) -> ExportSnapshot {
        let caps = self.caps();
        ExportSnapshot {
            transactions: self.ledger.transactions().to_vec(),
            summary: ExportSummary {
                total_income: self.ledger.total_income(),
                fixed_expenses: self.ledger.fixed_expenses(),
                variable_expenses: self.ledger.variable_expenses(),
                fixed_budget: caps.fixed_budget,
                variable_budget: caps.variable_budget,
                savings_budget: caps.savings_budget,
                export_date: self.clock.now(),
            },
        }
    }

    /// Serializable state for the key-value store.
    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot::from(&self.ledger)
    }

    /// Replaces the ledger with a stored snapshot and returns load warnings.
    pub fn restore(&mut self, snapshot: LedgerSnapshot) -> Vec<String> {
        let report = snapshot.restore();
        if let Some(max) = report.ledger.max_id() {
            self.ids.observe(max);
        }
        self.ledger = report.ledger;
        report.warnings
    }

    /// Empties the ledger without treating it as a user action.
    pub fn reset(&mut self) {
        self.ledger = Ledger::new();
    }

    pub fn count(&self, filter: TransactionFilter) -> usize {
        self.ledger
            .transactions()
            .iter()
            .filter(|txn| filter.matches(txn.category))
            .count()
    }

    pub fn has_income(&self) -> bool {
        self.ledger
            .transactions()
            .iter()
            .any(|txn| txn.category == Category::Income)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::ManualClock;
    use crate::ledger::TransactionKind;
    use chrono::{Duration, TimeZone, Utc};
    use std::sync::Arc;

    fn engine_with_clock() -> (LedgerEngine, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 1, 1, 8, 0, 0).unwrap(),
        ));
        let engine = LedgerEngine::with_clock(Box::new(Arc::clone(&clock)));
        (engine, clock)
    }

    #[test]
    fn salary_rent_insurance_scenario() {
        let (mut engine, _clock) = engine_with_clock();
        engine.add_income(1000.0, "salary").unwrap();
        let caps = engine.caps();
        assert_eq!(caps.fixed_budget, 500.0);
        assert_eq!(caps.variable_budget, 300.0);
        assert_eq!(caps.savings_budget, 200.0);

        let rent = engine
            .add_expense(ExpenseCategory::Fixed, 400.0, "rent")
            .unwrap();
        assert_eq!(engine.ledger().fixed_expenses(), 400.0);
        assert_eq!(engine.available_budget(ExpenseCategory::Fixed), 100.0);

        let err = engine
            .add_expense(ExpenseCategory::Fixed, 150.0, "insurance")
            .expect_err("insurance exceeds the remaining fixed budget");
        match err {
            LedgerError::InsufficientBudget {
                category,
                available,
            } => {
                assert_eq!(category, ExpenseCategory::Fixed);
                assert_eq!(available, 100.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(engine.ledger().len(), 2);

        engine.delete_transaction(rent.id).unwrap();
        assert_eq!(engine.ledger().fixed_expenses(), 0.0);
        assert_eq!(engine.available_budget(ExpenseCategory::Fixed), 500.0);
    }

    #[test]
    fn expense_equal_to_available_budget_is_accepted() {
        let (mut engine, _clock) = engine_with_clock();
        engine.add_income(1000.0, "salary").unwrap();
        engine
            .add_expense(ExpenseCategory::Variable, 300.0, "everything")
            .expect("exact budget is allowed");
        assert_eq!(engine.available_budget(ExpenseCategory::Variable), 0.0);
    }

    #[test]
    fn fractional_exact_fit_is_accepted() {
        let (mut engine, _clock) = engine_with_clock();
        engine.add_income(3.0, "coins").unwrap();
        assert!(engine.available_budget(ExpenseCategory::Variable) < 0.9);
        engine
            .add_expense(ExpenseCategory::Variable, 0.9, "gum")
            .expect("30% of 3.00 fits the variable bucket");
        engine
            .add_expense(ExpenseCategory::Fixed, 1.5, "locker")
            .expect("50% of 3.00 fits the fixed bucket");

        let err = engine
            .add_expense(ExpenseCategory::Variable, 0.01, "mint")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBudget { .. }));
    }

    #[test]
    fn expense_without_income_is_rejected() {
        let (mut engine, _clock) = engine_with_clock();
        let err = engine
            .add_expense(ExpenseCategory::Variable, 1.0, "coffee")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBudget { available, .. } if available == 0.0));
    }

    #[test]
    fn validation_errors_leave_state_unchanged() {
        let (mut engine, _clock) = engine_with_clock();
        engine.add_income(100.0, "gift").unwrap();
        let before = engine.snapshot();

        assert!(matches!(
            engine.add_income(0.0, "nothing"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.add_income(f64::NAN, "nothing"),
            Err(LedgerError::InvalidAmount(_))
        ));
        assert!(matches!(
            engine.add_income(5.0, "   "),
            Err(LedgerError::EmptyDescription)
        ));
        assert!(matches!(
            engine.delete_transaction(TransactionId(42)),
            Err(LedgerError::NotFound(TransactionId(42)))
        ));
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn deleting_income_can_leave_buckets_over_budget() {
        let (mut engine, _clock) = engine_with_clock();
        let salary = engine.add_income(1000.0, "salary").unwrap();
        engine
            .add_expense(ExpenseCategory::Fixed, 500.0, "rent")
            .unwrap();
        engine.delete_transaction(salary.id).unwrap();

        assert_eq!(engine.available_budget(ExpenseCategory::Fixed), -500.0);
        assert!(engine.summary().fixed.is_over_budget());
    }

    #[test]
    fn listing_sorts_newest_first_and_keeps_ties_stable() {
        let (mut engine, clock) = engine_with_clock();
        let salary = engine.add_income(1000.0, "salary").unwrap();
        clock.advance(Duration::minutes(5));
        let rent = engine
            .add_expense(ExpenseCategory::Fixed, 100.0, "rent")
            .unwrap();
        let water = engine
            .add_expense(ExpenseCategory::Fixed, 20.0, "water")
            .unwrap();
        clock.advance(Duration::minutes(5));
        let lunch = engine
            .add_expense(ExpenseCategory::Variable, 12.0, "lunch")
            .unwrap();

        let all: Vec<_> = engine
            .list_transactions(TransactionFilter::All)
            .into_iter()
            .map(|txn| txn.id)
            .collect();
        assert_eq!(all, vec![lunch.id, rent.id, water.id, salary.id]);

        let fixed: Vec<_> = engine
            .list_transactions(TransactionFilter::Fixed)
            .into_iter()
            .map(|txn| txn.id)
            .collect();
        assert_eq!(fixed, vec![rent.id, water.id]);

        let stored: Vec<_> = engine.ledger().transactions().iter().map(|t| t.id).collect();
        assert_eq!(stored, vec![salary.id, rent.id, water.id, lunch.id]);
    }

    #[test]
    fn ids_are_unique_under_a_frozen_clock() {
        let (mut engine, _clock) = engine_with_clock();
        let a = engine.add_income(1.0, "a").unwrap();
        let b = engine.add_income(1.0, "b").unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(a.date, b.date);
    }

    #[test]
    fn clear_all_zeroes_everything() {
        let (mut engine, _clock) = engine_with_clock();
        engine.add_income(800.0, "salary").unwrap();
        engine
            .add_expense(ExpenseCategory::Variable, 40.0, "cinema")
            .unwrap();
        engine.clear_all();

        let summary = engine.summary();
        assert!(engine.ledger().is_empty());
        assert_eq!(summary.total_income, 0.0);
        assert_eq!(summary.fixed.spent, 0.0);
        assert_eq!(summary.variable.spent, 0.0);
    }

    #[test]
    fn export_snapshot_is_read_only() {
        let (mut engine, clock) = engine_with_clock();
        engine.add_income(1000.0, "salary").unwrap();
        engine
            .add_expense(ExpenseCategory::Fixed, 250.0, "rent")
            .unwrap();

        let first = engine.export_snapshot();
        clock.advance(Duration::seconds(30));
        let mut second = engine.export_snapshot();
        assert_ne!(first.summary.export_date, second.summary.export_date);
        second.summary.export_date = first.summary.export_date;
        assert_eq!(first, second);
        assert_eq!(first.summary.fixed_budget, 500.0);
        assert_eq!(first.summary.fixed_expenses, 250.0);
        assert_eq!(first.transaction_count(), 2);
        assert_eq!(engine.ledger().len(), 2);
    }

    #[test]
    fn restore_keeps_new_ids_ahead_of_stored_ones() {
        let (mut engine, _clock) = engine_with_clock();
        let far_future = TransactionId(u64::MAX / 2);
        let snapshot = LedgerSnapshot {
            transactions: vec![Transaction {
                id: far_future,
                kind: TransactionKind::Income,
                amount: 10.0,
                description: "imported".into(),
                date: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
                category: Category::Income,
            }],
            total_income: 10.0,
            fixed_expenses: 0.0,
            variable_expenses: 0.0,
        };
        let warnings = engine.restore(snapshot);
        assert!(warnings.is_empty());

        let next = engine.add_income(5.0, "more").unwrap();
        assert!(next.id > far_future);
    }
}
