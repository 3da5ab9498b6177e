//! Display helpers for amounts, dates and transaction rows.

use chrono::{DateTime, Local, Utc};

use crate::ledger::{BucketStatus, Transaction};

pub fn format_amount(symbol: &str, amount: f64) -> String {
    if amount < 0.0 {
        format!("-{symbol}{:.2}", -amount)
    } else {
        format!("{symbol}{amount:.2}")
    }
}

/// Signed amount as shown in listings: `+€10.00` or `-€4.50`.
pub fn format_signed(symbol: &str, transaction: &Transaction) -> String {
    let value = transaction.signed_amount();
    let sign = if value < 0.0 { '-' } else { '+' };
    format!("{sign}{symbol}{:.2}", value.abs())
}

pub fn format_date(date: &DateTime<Utc>) -> String {
    date.with_timezone(&Local).format("%d/%m/%Y").to_string()
}

pub fn transaction_row(symbol: &str, transaction: &Transaction) -> String {
    format!(
        "#{:<14} {:<10} {:<16} {:>12}  {}",
        transaction.id,
        format_date(&transaction.date),
        transaction.category.label(),
        format_signed(symbol, transaction),
        transaction.description
    )
}

pub fn bucket_line(symbol: &str, title: &str, bucket: &BucketStatus) -> String {
    let mut line = format!(
        "{title:<16} spent {} of {} ({} left)",
        format_amount(symbol, bucket.spent),
        format_amount(symbol, bucket.cap),
        format_amount(symbol, bucket.remaining)
    );
    if bucket.is_over_budget() {
        line.push_str("  OVER BUDGET");
    }
    line
}
