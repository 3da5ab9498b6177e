//! Host that connects a [`LedgerEngine`] to identity, storage, notifications,
//! analytics and export.

use std::sync::Arc;

use serde_json::json;
use tracing::{info, warn};

use crate::analytics::{Analytics, EventName, NoopAnalytics};
use crate::core::engine::LedgerEngine;
use crate::core::identity::IdentityProvider;
use crate::core::notify::{NotificationSink, Severity, TracingNotifier};
use crate::errors::{LedgerError, Result};
use crate::ledger::{
    parse_amount, BudgetSummary, ExpenseCategory, LedgerSnapshot, NewTransaction, Transaction,
    TransactionFilter, TransactionId, TransactionKind,
};
use crate::storage::{storage_key, ExportReceipt, ExportSink, KeyValueStore};

/// Signals published by the authentication layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthEvent {
    Login,
    Logout,
}

/// Health of the persistence round-trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// Nobody is signed in; nothing is written.
    Ephemeral,
    Healthy,
    /// The last write failed; in-memory state is ahead of the store.
    Degraded(String),
    /// The stored ledger could not be read. Nothing is written to the slot
    /// until a later `load` succeeds.
    LoadFailed(String),
}

/// Services the tracker depends on.
#[derive(Clone)]
pub struct Collaborators {
    pub identity: Arc<dyn IdentityProvider>,
    pub store: Arc<dyn KeyValueStore>,
    pub exporter: Arc<dyn ExportSink>,
    pub notifier: Arc<dyn NotificationSink>,
    pub analytics: Arc<dyn Analytics>,
}

impl Collaborators {
    /// Collaborators that log notifications and discard analytics.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        store: Arc<dyn KeyValueStore>,
        exporter: Arc<dyn ExportSink>,
    ) -> Self {
        Self {
            identity,
            store,
            exporter,
            notifier: Arc::new(TracingNotifier),
            analytics: Arc::new(NoopAnalytics),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = analytics;
        self
    }
}

/// What `load` found in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub user: Option<String>,
    pub transactions: usize,
    pub warnings: Vec<String>,
}

pub struct ExpenseTracker {
    engine: LedgerEngine,
    services: Collaborators,
    filter: TransactionFilter,
    status: PersistenceStatus,
    currency_symbol: String,
}

impl ExpenseTracker {
    pub fn new(services: Collaborators) -> Self {
        Self::with_engine(LedgerEngine::new(), services)
    }

    pub fn with_engine(engine: LedgerEngine, services: Collaborators) -> Self {
        Self {
            engine,
            services,
            filter: TransactionFilter::All,
            status: PersistenceStatus::Ephemeral,
            currency_symbol: "€".into(),
        }
    }

    pub fn with_currency_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.currency_symbol = symbol.into();
        self
    }

    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    pub fn current_user(&self) -> Option<String> {
        self.services.identity.current_user()
    }

    pub fn status(&self) -> &PersistenceStatus {
        &self.status
    }

    pub fn filter(&self) -> TransactionFilter {
        self.filter
    }

    pub fn currency_symbol(&self) -> &str {
        &self.currency_symbol
    }

    pub fn summary(&self) -> BudgetSummary {
        self.engine.summary()
    }

    /// Transactions under the active filter, newest first.
    pub fn visible_transactions(&self) -> Vec<&Transaction> {
        self.engine.list_transactions(self.filter)
    }

    /// Replaces in-memory state with the signed-in user's stored ledger.
    pub fn load(&mut self) -> Result<LoadOutcome> {
        self.engine.reset();
        self.filter = TransactionFilter::All;
        let Some(user) = self.current_user() else {
            self.status = PersistenceStatus::Ephemeral;
            return Ok(LoadOutcome {
                user: None,
                transactions: 0,
                warnings: Vec::new(),
            });
        };

        let raw = match self.services.store.get(&storage_key(&user)) {
            Ok(raw) => raw,
            Err(err) => {
                self.degrade("Your saved data could not be read", &err);
                self.status = PersistenceStatus::LoadFailed(err.to_string());
                return Err(err);
            }
        };
        let warnings = match raw {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<LedgerSnapshot>(&raw) {
                Ok(snapshot) => self.engine.restore(snapshot),
                Err(err) => {
                    let err = LedgerError::from(err);
                    self.degrade("Your saved data is damaged and was not loaded", &err);
                    return Err(err);
                }
            },
        };
        for warning in &warnings {
            warn!(user = %user, "{warning}");
        }
        self.status = PersistenceStatus::Healthy;
        let transactions = self.engine.ledger().len();
        info!(user = %user, transactions, "ledger loaded");
        Ok(LoadOutcome {
            user: Some(user),
            transactions,
            warnings,
        })
    }

    /// Reacts to login / logout signals from the authentication layer.
    pub fn handle_auth_event(&mut self, event: AuthEvent) {
        match event {
            AuthEvent::Login => {
                if let Err(err) = self.load() {
                    warn!(error = %err, "ledger load after login failed");
                }
            }
            AuthEvent::Logout => {
                self.engine.reset();
                self.filter = TransactionFilter::All;
                self.status = PersistenceStatus::Ephemeral;
            }
        }
    }

    pub fn add_income(&mut self, amount: &str, description: &str) -> Result<Transaction> {
        let result = self
            .require_writable_user()
            .and_then(|_| parse_amount(amount))
            .and_then(|amount| {
                self.engine
                    .add_transaction(NewTransaction::income(amount, description))
            });
        let transaction = self.report(result)?;
        self.after_add(&transaction);
        Ok(transaction)
    }

    pub fn add_expense(
        &mut self,
        category: ExpenseCategory,
        amount: &str,
        description: &str,
    ) -> Result<Transaction> {
        let result = self
            .require_writable_user()
            .and_then(|_| parse_amount(amount))
            .and_then(|amount| {
                self.engine.add_transaction(NewTransaction::expense(
                    category.into(),
                    amount,
                    description,
                ))
            });
        let transaction = self.report(result)?;
        self.after_add(&transaction);
        Ok(transaction)
    }

    /// Typed entry point for callers that already hold a parsed request.
    pub fn add(&mut self, request: NewTransaction) -> Result<Transaction> {
        let result = self
            .require_writable_user()
            .and_then(|_| self.engine.add_transaction(request));
        let transaction = self.report(result)?;
        self.after_add(&transaction);
        Ok(transaction)
    }

    fn after_add(&mut self, transaction: &Transaction) {
        self.persist();
        match transaction.kind {
            TransactionKind::Income => {
                self.notify("Income added", Severity::Success);
                self.services.analytics.track(
                    EventName::IncomeAdded,
                    json!({
                        "amount": transaction.amount,
                        "description": transaction.description,
                    }),
                );
            }
            TransactionKind::Expense => {
                self.notify("Expense added", Severity::Success);
                self.services.analytics.track(
                    EventName::ExpenseAdded,
                    json!({
                        "category": transaction.category,
                        "amount": transaction.amount,
                        "description": transaction.description,
                    }),
                );
            }
        }
    }

    pub fn delete_transaction(&mut self, id: TransactionId) -> Result<Transaction> {
        let result = self.engine.delete_transaction(id);
        let removed = self.report(result)?;
        self.persist();
        self.notify("Transaction deleted", Severity::Success);
        self.services.analytics.track(
            EventName::TransactionDeleted,
            json!({
                "id": removed.id,
                "type": removed.kind,
                "category": removed.category,
                "amount": removed.amount,
            }),
        );
        Ok(removed)
    }

    /// Drops every transaction. Returns how many were removed.
    pub fn new_month(&mut self) -> usize {
        let dropped = self.engine.ledger().len();
        self.engine.clear_all();
        self.persist();
        self.notify("New month started", Severity::Success);
        self.services.analytics.track(EventName::NewMonth, json!({}));
        dropped
    }

    pub fn export(&mut self) -> Result<ExportReceipt> {
        let exporter = Arc::clone(&self.services.exporter);
        self.export_with(&*exporter)
    }

    /// Exports through `sink` instead of the configured exporter.
    pub fn export_with(&mut self, sink: &dyn ExportSink) -> Result<ExportReceipt> {
        let result = self.require_user().and_then(|_| {
            let snapshot = self.engine.export_snapshot();
            sink.export(&snapshot)
        });
        let receipt = self.report(result)?;
        self.notify(
            &format!("Data exported to {}", receipt.location),
            Severity::Success,
        );
        self.services.analytics.track(
            EventName::DataExported,
            json!({ "count": receipt.transactions }),
        );
        Ok(receipt)
    }

    /// Switches the listing filter and returns the new view.
    pub fn set_filter(&mut self, filter: TransactionFilter) -> Vec<&Transaction> {
        self.filter = filter;
        self.services
            .analytics
            .track(EventName::FilterChanged, json!({ "filter": filter }));
        self.engine.list_transactions(filter)
    }

    /// Records the start of a UI session.
    pub fn page_view(&self) {
        self.services
            .analytics
            .track(EventName::PageView, json!({ "referrer": null }));
        self.services.analytics.flush();
    }

    /// Writes the ledger to the signed-in user's slot.
    ///
    /// A failed write is logged, reported to the user and leaves the tracker
    /// `Degraded`; the in-memory change stands. After a failed load the slot
    /// still holds the user's real history, so it is left alone.
    fn persist(&mut self) {
        let Some(user) = self.current_user() else {
            self.status = PersistenceStatus::Ephemeral;
            return;
        };
        if let PersistenceStatus::LoadFailed(reason) = &self.status {
            warn!(user = %user, reason = %reason, "stored ledger not loaded; write skipped");
            self.notify(
                "Changes are not saved until your stored data can be read. Sign in again to retry.",
                Severity::Error,
            );
            return;
        }
        let written = serde_json::to_string(&self.engine.snapshot())
            .map_err(LedgerError::from)
            .and_then(|json| self.services.store.set(&storage_key(&user), &json));
        match written {
            Ok(()) => {
                if matches!(self.status, PersistenceStatus::Degraded(_)) {
                    info!(user = %user, "persistence recovered");
                }
                self.status = PersistenceStatus::Healthy;
            }
            Err(err) => self.degrade(
                "Your changes are kept in memory but could not be saved",
                &err,
            ),
        }
    }

    fn degrade(&mut self, context: &str, err: &LedgerError) {
        warn!(error = %err, "{context}");
        self.notify(&format!("{context}: {err}"), Severity::Error);
        self.status = PersistenceStatus::Degraded(err.to_string());
    }

    fn require_user(&self) -> Result<String> {
        self.current_user().ok_or(LedgerError::NotSignedIn)
    }

    /// Like `require_user`, but refuses while the stored ledger is unread.
    fn require_writable_user(&self) -> Result<String> {
        let user = self.require_user()?;
        if let PersistenceStatus::LoadFailed(reason) = &self.status {
            return Err(LedgerError::Persistence(format!(
                "saved data for {user} could not be read ({reason}); sign in again to retry"
            )));
        }
        Ok(user)
    }

    /// Sends failures to the notification sink and passes the result through.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if !err.is_validation() {
                warn!(error = %err, "ledger operation failed");
            }
            self.notify(&self.describe(err), Severity::Error);
        }
        result
    }

    fn describe(&self, err: &LedgerError) -> String {
        match err {
            LedgerError::InsufficientBudget {
                category,
                available,
            } => format!(
                "Not enough {category} budget. Available: {}{available:.2}",
                self.currency_symbol
            ),
            other => other.to_string(),
        }
    }

    fn notify(&self, message: &str, severity: Severity) {
        self.services.notifier.notify(message, severity);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::SessionIdentity;
    use crate::ledger::ExportSnapshot;
    use crate::storage::MemoryStore;
    use serde_json::Value;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        notes: Mutex<Vec<(String, Severity)>>,
        events: Mutex<Vec<(EventName, Value)>>,
        exports: Mutex<Vec<ExportSnapshot>>,
    }

    impl NotificationSink for Recorder {
        fn notify(&self, message: &str, severity: Severity) {
            self.notes
                .lock()
                .unwrap()
                .push((message.to_string(), severity));
        }
    }

    impl Analytics for Recorder {
        fn track(&self, event: EventName, payload: Value) {
            self.events.lock().unwrap().push((event, payload));
        }
    }

    impl ExportSink for Recorder {
        fn export(&self, snapshot: &ExportSnapshot) -> Result<ExportReceipt> {
            self.exports.lock().unwrap().push(snapshot.clone());
            Ok(ExportReceipt {
                location: "memory".into(),
                transactions: snapshot.transaction_count(),
            })
        }
    }

    impl Recorder {
        fn last_note(&self) -> (String, Severity) {
            self.notes.lock().unwrap().last().cloned().unwrap()
        }

        fn event_names(&self) -> Vec<EventName> {
            self.events.lock().unwrap().iter().map(|(e, _)| *e).collect()
        }
    }

    /// Memory store whose next `get` fails when armed.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_next_get: AtomicBool,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            if self.fail_next_get.swap(false, Ordering::SeqCst) {
                return Err(LedgerError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk busy",
                )));
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.inner.set(key, value)
        }
    }

    struct Fixture {
        tracker: ExpenseTracker,
        session: Arc<SessionIdentity>,
        store: Arc<MemoryStore>,
        recorder: Arc<Recorder>,
    }

    fn fixture() -> Fixture {
        let session = Arc::new(SessionIdentity::signed_in("ana"));
        let store = Arc::new(MemoryStore::new());
        let recorder = Arc::new(Recorder::default());
        let services = Collaborators::new(session.clone(), store.clone(), recorder.clone())
            .with_notifier(recorder.clone())
            .with_analytics(recorder.clone());
        let mut tracker = ExpenseTracker::new(services);
        tracker.load().unwrap();
        Fixture {
            tracker,
            session,
            store,
            recorder,
        }
    }

    #[test]
    fn every_mutation_is_written_to_the_user_slot() {
        let mut fx = fixture();
        fx.tracker.add_income("1000", "salary").unwrap();
        let stored = fx.store.get("expenseTrackerData:ana").unwrap().unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&stored).unwrap();
        assert_eq!(snapshot.total_income, 1000.0);
        assert_eq!(fx.tracker.status(), &PersistenceStatus::Healthy);

        fx.tracker
            .add_expense(ExpenseCategory::Fixed, "400", "rent")
            .unwrap();
        let stored = fx.store.get("expenseTrackerData:ana").unwrap().unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&stored).unwrap();
        assert_eq!(snapshot.fixed_expenses, 400.0);
        assert_eq!(snapshot.transactions.len(), 2);
    }

    #[test]
    fn rejected_expense_notifies_with_available_amount() {
        let mut fx = fixture();
        fx.tracker.add_income("1000", "salary").unwrap();
        fx.tracker
            .add_expense(ExpenseCategory::Fixed, "400", "rent")
            .unwrap();
        let err = fx
            .tracker
            .add_expense(ExpenseCategory::Fixed, "150", "insurance")
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBudget { .. }));
        let (message, severity) = fx.recorder.last_note();
        assert_eq!(severity, Severity::Error);
        assert!(message.contains("€100.00"), "{message}");
        assert_eq!(
            fx.recorder.event_names(),
            vec![EventName::IncomeAdded, EventName::ExpenseAdded]
        );
    }

    #[test]
    fn signed_out_user_cannot_add_or_export() {
        let mut fx = fixture();
        fx.session.logout();
        fx.tracker.handle_auth_event(AuthEvent::Logout);

        let err = fx.tracker.add_income("10", "tip").unwrap_err();
        assert!(matches!(err, LedgerError::NotSignedIn));
        assert!(matches!(fx.tracker.export(), Err(LedgerError::NotSignedIn)));
        assert_eq!(fx.tracker.status(), &PersistenceStatus::Ephemeral);
        assert!(fx.store.is_empty());
    }

    #[test]
    fn login_reloads_and_logout_clears() {
        let mut fx = fixture();
        fx.tracker.add_income("500", "salary").unwrap();

        fx.session.logout();
        fx.tracker.handle_auth_event(AuthEvent::Logout);
        assert!(fx.tracker.engine().ledger().is_empty());

        fx.session.login("bo");
        fx.tracker.handle_auth_event(AuthEvent::Login);
        assert!(fx.tracker.engine().ledger().is_empty());

        fx.session.login("ana");
        fx.tracker.handle_auth_event(AuthEvent::Login);
        assert_eq!(fx.tracker.engine().ledger().total_income(), 500.0);
    }

    #[test]
    fn store_failures_are_surfaced_not_swallowed() {
        let mut fx = fixture();
        fx.store.set_read_only(true);
        let txn = fx.tracker.add_income("20", "refund").unwrap();
        assert!(matches!(fx.tracker.status(), PersistenceStatus::Degraded(_)));
        assert!(fx.tracker.engine().transaction(txn.id).is_some());
        let notes = fx.recorder.notes.lock().unwrap().clone();
        assert!(notes
            .iter()
            .any(|(msg, sev)| *sev == Severity::Error && msg.contains("could not be saved")));

        fx.store.set_read_only(false);
        fx.tracker.add_income("5", "coins").unwrap();
        assert_eq!(fx.tracker.status(), &PersistenceStatus::Healthy);
    }

    #[test]
    fn corrupt_slot_reports_and_starts_empty() {
        let mut fx = fixture();
        fx.store.set("expenseTrackerData:ana", "{not json").unwrap();
        let err = fx.tracker.load().unwrap_err();
        assert!(matches!(err, LedgerError::Serde(_)));
        assert!(fx.tracker.engine().ledger().is_empty());
        assert_eq!(fx.recorder.last_note().1, Severity::Error);
    }

    #[test]
    fn unreadable_slot_is_never_overwritten() {
        let session = Arc::new(SessionIdentity::signed_in("ana"));
        let store = Arc::new(FlakyStore::default());
        let recorder = Arc::new(Recorder::default());
        let services = Collaborators::new(session.clone(), store.clone(), recorder.clone())
            .with_notifier(recorder.clone());

        let mut first = ExpenseTracker::new(services.clone());
        first.load().unwrap();
        for n in 1..=5 {
            first.add_income(&n.to_string(), "pay").unwrap();
        }

        let mut reopened = ExpenseTracker::new(services.clone());
        store.fail_next_get.store(true, Ordering::SeqCst);
        assert!(matches!(reopened.load(), Err(LedgerError::Io(_))));
        assert!(matches!(
            reopened.status(),
            PersistenceStatus::LoadFailed(_)
        ));

        let err = reopened.add_income("1", "coin").unwrap_err();
        assert!(matches!(err, LedgerError::Persistence(_)));
        reopened.new_month();
        assert!(matches!(
            reopened.status(),
            PersistenceStatus::LoadFailed(_)
        ));

        let mut fresh = ExpenseTracker::new(services.clone());
        assert_eq!(fresh.load().unwrap().transactions, 5);

        assert_eq!(reopened.load().unwrap().transactions, 5);
        assert_eq!(reopened.status(), &PersistenceStatus::Healthy);
        reopened.add_income("1", "coin").unwrap();
        let mut fresh = ExpenseTracker::new(services);
        assert_eq!(fresh.load().unwrap().transactions, 6);
    }

    #[test]
    fn delete_and_new_month_emit_events() {
        let mut fx = fixture();
        let salary = fx.tracker.add_income("100", "salary").unwrap();
        fx.tracker.delete_transaction(salary.id).unwrap();
        fx.tracker.add_income("100", "salary again").unwrap();
        assert_eq!(fx.tracker.new_month(), 1);

        let events = fx.recorder.events.lock().unwrap().clone();
        let deleted = events
            .iter()
            .find(|(name, _)| *name == EventName::TransactionDeleted)
            .map(|(_, payload)| payload.clone())
            .unwrap();
        assert_eq!(deleted["type"], "income");
        assert_eq!(deleted["amount"], 100.0);
        assert_eq!(events.last().unwrap().0, EventName::NewMonth);

        let stored = fx.store.get("expenseTrackerData:ana").unwrap().unwrap();
        let snapshot: LedgerSnapshot = serde_json::from_str(&stored).unwrap();
        assert!(snapshot.transactions.is_empty());
    }

    #[test]
    fn export_goes_to_the_sink_and_is_tracked() {
        let mut fx = fixture();
        fx.tracker.add_income("300", "salary").unwrap();
        let receipt = fx.tracker.export().unwrap();
        assert_eq!(receipt.transactions, 1);
        let exports = fx.recorder.exports.lock().unwrap();
        assert_eq!(exports[0].summary.savings_budget, 60.0);
        let events = fx.recorder.events.lock().unwrap();
        assert_eq!(events.last().unwrap().1["count"], 1);
    }

    #[test]
    fn typed_requests_share_the_same_checks() {
        let mut fx = fixture();
        fx.tracker.add(NewTransaction::income(80.0, "gift")).unwrap();
        let err = fx
            .tracker
            .add(NewTransaction::expense(
                ExpenseCategory::Fixed.into(),
                41.0,
                "phone",
            ))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientBudget { .. }));
        assert_eq!(fx.tracker.engine().ledger().len(), 1);
    }

    #[test]
    fn filter_changes_the_visible_view() {
        let mut fx = fixture();
        fx.tracker.add_income("100", "salary").unwrap();
        fx.tracker
            .add_expense(ExpenseCategory::Variable, "10", "snacks")
            .unwrap();
        let view = fx.tracker.set_filter(TransactionFilter::Variable);
        assert_eq!(view.len(), 1);
        assert_eq!(fx.tracker.visible_transactions().len(), 1);
        assert_eq!(fx.tracker.filter(), TransactionFilter::Variable);
        assert_eq!(
            fx.recorder.event_names().last(),
            Some(&EventName::FilterChanged)
        );
    }
}
