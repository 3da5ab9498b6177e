use std::path::PathBuf;

use tracing::info;

use super::Result;
use crate::ledger::ExportSnapshot;
use crate::utils::paths::write_atomic;

/// Where an export ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportReceipt {
    pub location: String,
    pub transactions: usize,
}

/// Receives export snapshots for download / archival outside the ledger.
pub trait ExportSink: Send + Sync {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<ExportReceipt>;
}

impl<T: ExportSink + ?Sized> ExportSink for std::sync::Arc<T> {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<ExportReceipt> {
        (**self).export(snapshot)
    }
}

/// Writes pretty-printed `expenses-YYYY-MM-DD.json` files into a directory.
#[derive(Debug, Clone)]
pub struct JsonFileExporter {
    dir: PathBuf,
}

impl JsonFileExporter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ExportSink for JsonFileExporter {
    fn export(&self, snapshot: &ExportSnapshot) -> Result<ExportReceipt> {
        let path = self.dir.join(snapshot.file_name());
        let json = serde_json::to_string_pretty(snapshot)?;
        write_atomic(&path, &json)?;
        info!(path = %path.display(), "ledger exported");
        Ok(ExportReceipt {
            location: path.display().to_string(),
            transactions: snapshot.transaction_count(),
        })
    }
}
