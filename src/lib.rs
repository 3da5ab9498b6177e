#![doc(test(attr(deny(warnings))))]

//! Expense Core keeps a personal transaction ledger and splits income into
//! fixed, variable and savings budgets following the 50/30/20 rule.
//!
//! [`crate::core::LedgerEngine`] owns the rules, [`crate::core::ExpenseTracker`] wires it to
//! storage, notifications and analytics, and [`crate::cli`] drives it from a shell.

pub mod analytics;
pub mod cli;
pub mod config;
pub mod core;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("Expense Core tracing initialized.");
    });
}
