//! Best-effort usage events. Nothing here may block or fail a ledger operation.

pub mod batcher;
pub mod transport;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use batcher::{BatcherSettings, EventBatcher};
pub use transport::{EventTransport, JsonLinesTransport};

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("transport unavailable: {0}")]
    Unavailable(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Named events emitted by the expense tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventName {
    PageView,
    IncomeAdded,
    ExpenseAdded,
    TransactionDeleted,
    NewMonth,
    DataExported,
    FilterChanged,
    UserLoggedIn,
    UserLoggedOut,
}

impl EventName {
    pub fn as_str(self) -> &'static str {
        match self {
            EventName::PageView => "page_view",
            EventName::IncomeAdded => "income_added",
            EventName::ExpenseAdded => "expense_added",
            EventName::TransactionDeleted => "transaction_deleted",
            EventName::NewMonth => "new_month",
            EventName::DataExported => "data_exported",
            EventName::FilterChanged => "filter_changed",
            EventName::UserLoggedIn => "user_logged_in",
            EventName::UserLoggedOut => "user_logged_out",
        }
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One tracked event as it goes over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub app_id: String,
    pub session_id: String,
    pub event: EventName,
    pub payload: Value,
    /// Milliseconds since the Unix epoch.
    pub ts: i64,
    pub page: String,
}

/// Body of one flush: `{ "events": [...] }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventBatch {
    pub events: Vec<AnalyticsEvent>,
}

/// Fire-and-forget event sink.
pub trait Analytics: Send + Sync {
    fn track(&self, event: EventName, payload: Value);

    /// Pushes out anything queued. Default: nothing is queued.
    fn flush(&self) {}
}

impl<T: Analytics + ?Sized> Analytics for std::sync::Arc<T> {
    fn track(&self, event: EventName, payload: Value) {
        (**self).track(event, payload)
    }

    fn flush(&self) {
        (**self).flush()
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalytics;

impl Analytics for NoopAnalytics {
    fn track(&self, _event: EventName, _payload: Value) {}
}
