use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use super::{AnalyticsError, EventBatch};
use crate::utils::paths::ensure_dir;

/// Delivers one serialized batch somewhere.
pub trait EventTransport: Send + Sync {
    fn send(&self, batch: &EventBatch) -> Result<(), AnalyticsError>;

    fn describe(&self) -> String;
}

/// Appends each batch as a single JSON line to a file.
#[derive(Debug, Clone)]
pub struct JsonLinesTransport {
    path: PathBuf,
}

impl JsonLinesTransport {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventTransport for JsonLinesTransport {
    fn send(&self, batch: &EventBatch) -> Result<(), AnalyticsError> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        let mut line = serde_json::to_string(batch)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    fn describe(&self) -> String {
        format!("jsonl:{}", self.path.display())
    }
}
