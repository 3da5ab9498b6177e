use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::debug;

use super::{KeyValueStore, Result};
use crate::utils::paths::{ensure_dir, write_atomic};

const ENTRY_EXTENSION: &str = "json";

/// Key-value store that keeps one JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    root: PathBuf,
}

impl JsonFileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        ensure_dir(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.root
            .join(format!("{}.{}", canonical_name(key), ENTRY_EXTENSION))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.entry_path(key);
        write_atomic(&path, value)?;
        debug!(path = %path.display(), bytes = value.len(), "store entry written");
        Ok(())
    }
}

/// Maps an arbitrary key onto a portable file stem.
///
/// Characters outside `[a-z0-9._-]` are escaped as `%XX` (per UTF-8 byte) so
/// distinct keys never share a file.
fn canonical_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len());
    for byte in key.bytes() {
        match byte {
            b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' => name.push(byte as char),
            b'.' if !name.is_empty() => name.push('.'),
            _ => name.push_str(&format!("%{byte:02X}")),
        }
    }
    if name.is_empty() {
        "%00".into()
    } else {
        name
    }
}
