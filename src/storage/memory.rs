use std::{collections::HashMap, sync::Mutex};

use super::{KeyValueStore, Result};
use crate::errors::LedgerError;

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    read_only: Mutex<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `set` fail, like a full or locked store.
    pub fn set_read_only(&self, read_only: bool) {
        if let Ok(mut guard) = self.read_only.lock() {
            *guard = read_only;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn ensure_writable(&self) -> Result<()> {
        let read_only = self.read_only.lock().map(|flag| *flag).unwrap_or(true);
        if read_only {
            return Err(LedgerError::Persistence("store is read-only".into()));
        }
        Ok(())
    }

    fn poisoned() -> LedgerError {
        LedgerError::Persistence("memory store lock poisoned".into())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_writable()?;
        let mut entries = self.entries.lock().map_err(|_| Self::poisoned())?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
