pub mod export;
pub mod json_backend;
pub mod memory;

use crate::errors::LedgerError;

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Prefix of every per-user ledger slot.
pub const STORAGE_KEY_PREFIX: &str = "expenseTrackerData";

/// Key of the ledger slot owned by `user`.
pub fn storage_key(user: &str) -> String {
    format!("{STORAGE_KEY_PREFIX}:{user}")
}

/// Abstraction over string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for std::sync::Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}

pub use export::{ExportReceipt, ExportSink, JsonFileExporter};
pub use json_backend::JsonFileStore;
pub use memory::MemoryStore;
