pub mod clock;
pub mod engine;
pub mod identity;
pub mod notify;
pub mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::{LedgerEngine, BUDGET_TOLERANCE};
pub use identity::{IdentityProvider, SessionIdentity};
pub use notify::{NotificationSink, Severity, TracingNotifier};
pub use tracker::{AuthEvent, Collaborators, ExpenseTracker, LoadOutcome, PersistenceStatus};
