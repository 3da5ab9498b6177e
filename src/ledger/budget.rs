use serde::{Deserialize, Serialize};

use super::category::ExpenseCategory;

pub const FIXED_SHARE: f64 = 0.50;
pub const VARIABLE_SHARE: f64 = 0.30;
pub const SAVINGS_SHARE: f64 = 0.20;

/// Budget caps derived from total income.
///
/// Savings is display-only: no transaction is ever booked against it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetCaps {
    pub fixed_budget: f64,
    pub variable_budget: f64,
    pub savings_budget: f64,
}

impl BudgetCaps {
    pub fn from_income(total_income: f64) -> Self {
        Self {
            fixed_budget: total_income * FIXED_SHARE,
            variable_budget: total_income * VARIABLE_SHARE,
            savings_budget: total_income * SAVINGS_SHARE,
        }
    }

    pub fn cap(&self, category: ExpenseCategory) -> f64 {
        match category {
            ExpenseCategory::Fixed => self.fixed_budget,
            ExpenseCategory::Variable => self.variable_budget,
        }
    }
}

/// Spending status for one capped bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BucketStatus {
    pub category: ExpenseCategory,
    pub cap: f64,
    pub spent: f64,
    pub remaining: f64,
}

impl BucketStatus {
    pub fn is_over_budget(&self) -> bool {
        self.remaining < 0.0
    }
}

/// Everything a budget overview needs to render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub total_income: f64,
    pub fixed: BucketStatus,
    pub variable: BucketStatus,
    pub savings: f64,
}

impl BudgetSummary {
    pub fn bucket(&self, category: ExpenseCategory) -> &BucketStatus {
        match category {
            ExpenseCategory::Fixed => &self.fixed,
            ExpenseCategory::Variable => &self.variable,
        }
    }
}
