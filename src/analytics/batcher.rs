use std::{
    sync::Mutex,
    time::{Duration, Instant},
};

use chrono::Utc;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Analytics, AnalyticsEvent, EventBatch, EventName, EventTransport};

const DEFAULT_SEND_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone)]
pub struct BatcherSettings {
    pub app_id: String,
    pub page: String,
    pub send_interval: Duration,
}

impl Default for BatcherSettings {
    fn default() -> Self {
        Self {
            app_id: "app".into(),
            page: "/".into(),
            send_interval: DEFAULT_SEND_INTERVAL,
        }
    }
}

struct BatchState {
    queue: Vec<AnalyticsEvent>,
    last_flush: Instant,
}

/// Queues events and ships them in batches.
///
/// Without a primary transport the batcher is disabled and each event is
/// written to the log instead. A failed delivery is retried once on the
/// fallback transport, then dropped.
pub struct EventBatcher {
    settings: BatcherSettings,
    session_id: String,
    primary: Option<Box<dyn EventTransport>>,
    fallback: Option<Box<dyn EventTransport>>,
    state: Mutex<BatchState>,
}

impl EventBatcher {
    pub fn new(
        settings: BatcherSettings,
        primary: Option<Box<dyn EventTransport>>,
        fallback: Option<Box<dyn EventTransport>>,
    ) -> Self {
        Self {
            settings,
            session_id: format!("s_{}", Uuid::new_v4().simple()),
            primary,
            fallback,
            state: Mutex::new(BatchState {
                queue: Vec::new(),
                last_flush: Instant::now(),
            }),
        }
    }

    /// Batcher with no transport: events go to the log only.
    pub fn disabled(settings: BatcherSettings) -> Self {
        Self::new(settings, None, None)
    }

    pub fn is_enabled(&self) -> bool {
        self.primary.is_some()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn pending(&self) -> usize {
        self.state.lock().map(|state| state.queue.len()).unwrap_or(0)
    }

    /// Sends the queue if the send interval has passed since the last batch.
    ///
    /// Events are only checked when something calls in, so a host without
    /// its own timer calls this between units of work.
    pub fn flush_if_due(&self) {
        if let Some(batch) = self.take_batch(false) {
            self.deliver(batch);
        }
    }

    fn build_event(&self, event: EventName, payload: Value) -> AnalyticsEvent {
        AnalyticsEvent {
            app_id: self.settings.app_id.clone(),
            session_id: self.session_id.clone(),
            event,
            payload,
            ts: Utc::now().timestamp_millis(),
            page: self.settings.page.clone(),
        }
    }

    fn take_batch(&self, force: bool) -> Option<EventBatch> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if state.queue.is_empty() {
            return None;
        }
        if !force && state.last_flush.elapsed() < self.settings.send_interval {
            return None;
        }
        state.last_flush = Instant::now();
        Some(EventBatch {
            events: std::mem::take(&mut state.queue),
        })
    }

    fn deliver(&self, batch: EventBatch) {
        let Some(primary) = self.primary.as_ref() else {
            return;
        };
        let count = batch.events.len();
        let primary_err = match primary.send(&batch) {
            Ok(()) => {
                debug!(count, transport = %primary.describe(), "analytics batch sent");
                return;
            }
            Err(err) => err,
        };
        match self.fallback.as_ref() {
            Some(fallback) => match fallback.send(&batch) {
                Ok(()) => debug!(
                    count,
                    transport = %fallback.describe(),
                    primary_error = %primary_err,
                    "analytics batch sent via fallback"
                ),
                Err(err) => warn!(
                    count,
                    primary_error = %primary_err,
                    fallback_error = %err,
                    "analytics batch dropped"
                ),
            },
            None => warn!(count, error = %primary_err, "analytics batch dropped"),
        }
    }
}

impl Analytics for EventBatcher {
    fn track(&self, event: EventName, payload: Value) {
        let record = self.build_event(event, payload);
        if !self.is_enabled() {
            info!(
                target: "expense_core::analytics",
                event = %record.event,
                payload = %record.payload,
                session = %record.session_id,
                "analytics event"
            );
            return;
        }
        if let Ok(mut state) = self.state.lock() {
            state.queue.push(record);
        }
        self.flush_if_due();
    }

    fn flush(&self) {
        if let Some(batch) = self.take_batch(true) {
            self.deliver(batch);
        }
    }
}

impl Drop for EventBatcher {
    fn drop(&mut self) {
        Analytics::flush(self);
    }
}
