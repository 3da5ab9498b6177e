use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

use crate::analytics::BatcherSettings;
use crate::utils::paths::{config_file_in, ensure_dir, export_dir_in, write_atomic};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// User preferences and integration settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_currency_symbol")]
    pub currency_symbol: String,
    #[serde(default = "Config::default_app_id")]
    pub app_id: String,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Where `export` writes files. Defaults to `<app dir>/exports`.
    pub export_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_user: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            currency_symbol: Self::default_currency_symbol(),
            app_id: Self::default_app_id(),
            analytics: AnalyticsConfig::default(),
            export_dir: None,
            last_user: None,
        }
    }
}

impl Config {
    pub fn default_currency_symbol() -> String {
        "€".into()
    }

    pub fn default_app_id() -> String {
        "gastos-app".into()
    }

    pub fn resolve_export_dir(&self, base: &Path) -> PathBuf {
        self.export_dir
            .clone()
            .unwrap_or_else(|| export_dir_in(base))
    }

    pub fn batcher_settings(&self) -> BatcherSettings {
        BatcherSettings {
            app_id: self.app_id.clone(),
            page: "cli".into(),
            send_interval: Duration::from_millis(self.analytics.send_interval_ms),
        }
    }
}

/// Analytics delivery settings. Without `log_path` events are only logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_path: Option<PathBuf>,
    #[serde(default = "AnalyticsConfig::default_send_interval_ms")]
    pub send_interval_ms: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            log_path: None,
            fallback_path: None,
            send_interval_ms: Self::default_send_interval_ms(),
        }
    }
}

impl AnalyticsConfig {
    pub fn default_send_interval_ms() -> u64 {
        5000
    }
}

/// Loads and saves [`Config`] as JSON inside the application directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn with_base_dir(base: &Path) -> Result<Self, ConfigError> {
        ensure_dir(base)?;
        Ok(Self {
            path: config_file_in(base),
        })
    }

    pub fn load(&self) -> Result<Config, ConfigError> {
        if self.path.exists() {
            let data = fs::read_to_string(&self.path)?;
            Ok(serde_json::from_str(&data)?)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
