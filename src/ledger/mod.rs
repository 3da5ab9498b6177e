//! Ledger domain models, persistence-friendly types, and budget rules.

pub mod budget;
pub mod category;
pub mod export;
#[allow(clippy::module_inception)]
pub mod ledger;
pub mod transaction;

pub use budget::{
    BucketStatus, BudgetCaps, BudgetSummary, FIXED_SHARE, SAVINGS_SHARE, VARIABLE_SHARE,
};
pub use category::{Category, ExpenseCategory, TransactionFilter, TransactionKind};
pub use export::{ExportSnapshot, ExportSummary};
pub use ledger::{ledger_warnings, Ledger, LedgerSnapshot, RestoreReport};
pub use transaction::{parse_amount, IdGenerator, NewTransaction, Transaction, TransactionId};
