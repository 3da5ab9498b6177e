use std::{path::PathBuf, sync::Arc};

use dialoguer::theme::ColorfulTheme;

use crate::analytics::EventBatcher;
use crate::config::{Config, ConfigManager};
use crate::core::{ExpenseTracker, SessionIdentity};

use super::commands::CommandRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliMode {
    Interactive,
    /// Commands come from stdin and confirmations are accepted.
    Script,
}

pub struct ShellContext {
    pub mode: CliMode,
    pub registry: CommandRegistry,
    pub tracker: ExpenseTracker,
    pub session: Arc<SessionIdentity>,
    pub analytics: Arc<EventBatcher>,
    pub theme: ColorfulTheme,
    pub config_manager: ConfigManager,
    pub config: Config,
    pub base_dir: PathBuf,
    pub running: bool,
}
