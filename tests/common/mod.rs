#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use expense_core::{
    core::{Collaborators, ExpenseTracker, NotificationSink, SessionIdentity, Severity},
    storage::{JsonFileExporter, JsonFileStore},
};

/// Keeps every notification so tests can inspect what the user was told.
#[derive(Default)]
pub struct RecordingNotifier {
    entries: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s)| *s == severity)
            .map(|(m, _)| m.clone())
            .collect()
    }
}

impl NotificationSink for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.entries
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

pub struct Harness {
    pub tracker: ExpenseTracker,
    pub session: Arc<SessionIdentity>,
    pub notes: Arc<RecordingNotifier>,
}

/// Tracker backed by JSON files under `base`, signed in as `user` and loaded.
pub fn file_backed(base: &Path, user: &str) -> Harness {
    let session = Arc::new(SessionIdentity::signed_in(user));
    let notes = Arc::new(RecordingNotifier::default());
    let store = JsonFileStore::new(base.join("data")).expect("create json store");
    let exporter = JsonFileExporter::new(base.join("exports"));
    let services = Collaborators::new(session.clone(), Arc::new(store), Arc::new(exporter))
        .with_notifier(notes.clone());
    let mut tracker = ExpenseTracker::new(services);
    tracker.load().expect("load ledger");
    Harness {
        tracker,
        session,
        notes,
    }
}
