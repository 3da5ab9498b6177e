use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::transaction::Transaction;

/// Downloadable view of a ledger: every transaction plus the budget summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSnapshot {
    pub transactions: Vec<Transaction>,
    pub summary: ExportSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSummary {
    pub total_income: f64,
    pub fixed_expenses: f64,
    pub variable_expenses: f64,
    pub fixed_budget: f64,
    pub variable_budget: f64,
    pub savings_budget: f64,
    pub export_date: DateTime<Utc>,
}

impl ExportSnapshot {
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// File name used when the snapshot is saved to disk.
    pub fn file_name(&self) -> String {
        format!(
            "expenses-{}.json",
            self.summary.export_date.format("%Y-%m-%d")
        )
    }
}
