//! Dispatch, error reporting and session helpers for the shell.

use std::{io, path::Path, sync::Arc};

use dialoguer::theme::ColorfulTheme;
use serde_json::json;
use strsim::levenshtein;
use thiserror::Error;

use crate::analytics::{Analytics, EventBatcher, EventName, EventTransport, JsonLinesTransport};
use crate::config::{Config, ConfigError, ConfigManager};
use crate::core::{AuthEvent, Collaborators, ExpenseTracker, SessionIdentity};
use crate::errors::LedgerError;
use crate::storage::{JsonFileExporter, JsonFileStore};
use crate::utils::paths::{app_data_dir, data_dir_in};

use super::commands::{self, CommandDefinition, CommandRegistry};
use super::io as cli_io;
use super::output::ConsoleNotifier;
pub use super::shell_context::{CliMode, ShellContext};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopControl {
    Continue,
    Exit,
}

pub type CommandResult = Result<(), CommandError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Readline(#[from] rustyline::error::ReadlineError),
    #[error(transparent)]
    Command(#[from] CommandError),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("{0}")]
    InvalidArguments(String),
    #[error("You must sign in first. Use `login <name>`.")]
    NotSignedIn,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Dialoguer(#[from] dialoguer::Error),
    /// The tracker already told the user what went wrong.
    #[error("{0}")]
    Reported(LedgerError),
    #[error("exit requested")]
    ExitRequested,
}

impl ShellContext {
    pub fn new(mode: CliMode) -> Result<Self, CliError> {
        Self::with_base_dir(mode, &app_data_dir())
    }

    /// Builds a shell whose config, ledgers and exports live under `base`.
    pub fn with_base_dir(mode: CliMode, base: &Path) -> Result<Self, CliError> {
        let config_manager = ConfigManager::with_base_dir(base)?;
        let config = config_manager.load()?;

        let session = Arc::new(SessionIdentity::new());
        let analytics = Arc::new(analytics_from_config(&config, base));
        let store = JsonFileStore::new(data_dir_in(base))?;
        let exporter = JsonFileExporter::new(config.resolve_export_dir(base));
        let services = Collaborators::new(session.clone(), Arc::new(store), Arc::new(exporter))
            .with_notifier(Arc::new(ConsoleNotifier))
            .with_analytics(analytics.clone());
        let tracker =
            ExpenseTracker::new(services).with_currency_symbol(config.currency_symbol.clone());

        let mut context = ShellContext {
            mode,
            registry: CommandRegistry::new(commands::all_definitions()),
            tracker,
            session,
            analytics,
            theme: ColorfulTheme::default(),
            config_manager,
            config,
            base_dir: base.to_path_buf(),
            running: true,
        };
        context.resume_session();
        context.tracker.page_view();
        Ok(context)
    }

    fn resume_session(&mut self) {
        if self.mode != CliMode::Interactive {
            return;
        }
        let Some(user) = self.config.last_user.clone() else {
            return;
        };
        if self.session.login(&user) {
            self.tracker.handle_auth_event(AuthEvent::Login);
            cli_io::print_success(format!("Welcome back, {user}."));
        }
    }

    pub(crate) fn sign_in(&mut self, user: &str) -> CommandResult {
        if !self.session.login(user) {
            return Err(CommandError::InvalidArguments(
                "User name cannot be empty.".into(),
            ));
        }
        self.analytics
            .track(EventName::UserLoggedIn, json!({ "username": user.trim() }));
        let outcome = self
            .tracker
            .load()
            .map_err(CommandError::Reported)?;
        for warning in &outcome.warnings {
            cli_io::print_warning(warning);
        }
        self.config.last_user = outcome.user;
        self.persist_config()
    }

    pub(crate) fn sign_out(&mut self) -> Result<Option<String>, CommandError> {
        let previous = self.session.logout();
        if let Some(user) = &previous {
            self.analytics
                .track(EventName::UserLoggedOut, json!({ "username": user }));
        }
        self.tracker.handle_auth_event(AuthEvent::Logout);
        self.config.last_user = None;
        self.persist_config()?;
        Ok(previous)
    }

    pub(crate) fn require_user(&self) -> Result<String, CommandError> {
        self.tracker.current_user().ok_or(CommandError::NotSignedIn)
    }

    pub(crate) fn persist_config(&self) -> CommandResult {
        self.config_manager.save(&self.config)?;
        Ok(())
    }

    pub(crate) fn prompt(&self) -> String {
        match self.tracker.current_user() {
            Some(user) => format!("expenses({user})> "),
            None => "expenses> ".to_string(),
        }
    }

    pub(crate) fn command_names(&self) -> Vec<&'static str> {
        self.registry.names().collect()
    }

    pub(crate) fn command(&self, name: &str) -> Option<&CommandDefinition> {
        self.registry.get(name)
    }

    pub(crate) fn dispatch(
        &mut self,
        command: &str,
        raw: &str,
        args: &[&str],
    ) -> Result<LoopControl, CommandError> {
        let Some(definition) = self.registry.get(command) else {
            self.suggest_command(raw);
            return Ok(LoopControl::Continue);
        };
        let handler = definition.handler;
        match handler(self, args) {
            Ok(()) => Ok(LoopControl::Continue),
            Err(CommandError::ExitRequested) => Ok(LoopControl::Exit),
            Err(err) => Err(err),
        }
    }

    pub(crate) fn suggest_command(&self, input: &str) {
        cli_io::print_warning(format!(
            "Unknown command `{input}`. Type `help` to see available commands."
        ));
        let needle = input.to_lowercase();
        let best = self
            .registry
            .names()
            .map(|name| (levenshtein(name, &needle), name))
            .min_by_key(|(distance, _)| *distance);
        if let Some((distance, name)) = best {
            if distance <= 3 {
                cli_io::print_info(format!("Suggestion: `{name}`?"));
            }
        }
    }

    /// Asks before a destructive step. Script runs always proceed.
    pub(crate) fn confirm(&self, prompt: &str) -> Result<bool, CommandError> {
        if self.mode == CliMode::Script {
            return Ok(true);
        }
        cli_io::confirm_action(&self.theme, prompt, false)
    }

    pub(crate) fn confirm_exit(&self) -> Result<bool, CliError> {
        Ok(self.confirm("Exit shell?")?)
    }

    pub(crate) fn report_error(&self, err: CommandError) -> Result<(), CliError> {
        match err {
            CommandError::ExitRequested | CommandError::Reported(_) => Ok(()),
            CommandError::InvalidArguments(message) => {
                cli_io::print_error(message);
                cli_io::print_hint("Use `help <command>` for usage details.");
                Ok(())
            }
            CommandError::NotSignedIn | CommandError::Ledger(LedgerError::NotSignedIn) => {
                cli_io::print_error("You must sign in first.");
                cli_io::print_hint("Try `login <name>` to get started.");
                Ok(())
            }
            other => {
                cli_io::print_error(other);
                Ok(())
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn process_line(&mut self, line: &str) -> Result<LoopControl, CommandError> {
        let tokens = super::shell::parse_command_line(line)
            .map_err(|err| CommandError::InvalidArguments(err.to_string()))?;
        let Some((raw, rest)) = tokens.split_first() else {
            return Ok(LoopControl::Continue);
        };
        let args: Vec<&str> = rest.iter().map(String::as_str).collect();
        self.dispatch(&raw.to_lowercase(), raw, &args)
    }
}

/// Event batcher wired to the configured JSON-lines files, or a log-only
/// batcher when no analytics path is set.
fn analytics_from_config(config: &Config, base: &Path) -> EventBatcher {
    let settings = config.batcher_settings();
    let Some(log_path) = config.analytics.log_path.as_ref() else {
        return EventBatcher::disabled(settings);
    };
    let resolve = |path: &Path| {
        if path.is_relative() {
            base.join(path)
        } else {
            path.to_path_buf()
        }
    };
    let primary = JsonLinesTransport::new(resolve(log_path));
    let fallback = config
        .analytics
        .fallback_path
        .as_deref()
        .map(|path| Box::new(JsonLinesTransport::new(resolve(path))) as Box<dyn EventTransport>);
    EventBatcher::new(settings, Some(Box::new(primary)), fallback)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::EventBatch;
    use std::fs;
    use tempfile::tempdir;

    fn tracked_events(path: &Path) -> Vec<(EventName, serde_json::Value)> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .flat_map(|line| serde_json::from_str::<EventBatch>(line).unwrap().events)
            .map(|event| (event.event, event.payload))
            .collect()
    }

    #[test]
    fn login_remembers_the_user() {
        let temp = tempdir().unwrap();
        let mut shell = ShellContext::with_base_dir(CliMode::Script, temp.path()).unwrap();
        shell.process_line("login ana").unwrap();
        assert_eq!(shell.tracker.current_user().as_deref(), Some("ana"));

        let saved = ConfigManager::with_base_dir(temp.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(saved.last_user.as_deref(), Some("ana"));
    }

    #[test]
    fn interactive_mode_resumes_the_last_user() {
        let temp = tempdir().unwrap();
        {
            let mut shell = ShellContext::with_base_dir(CliMode::Script, temp.path()).unwrap();
            shell.process_line("login ana").unwrap();
            shell.process_line("income 1000 salary").unwrap();
        }
        let shell = ShellContext::with_base_dir(CliMode::Interactive, temp.path()).unwrap();
        assert_eq!(shell.tracker.current_user().as_deref(), Some("ana"));
        assert_eq!(shell.tracker.engine().ledger().total_income(), 1000.0);
    }

    #[test]
    fn login_and_logout_are_tracked() {
        let temp = tempdir().unwrap();
        let manager = ConfigManager::with_base_dir(temp.path()).unwrap();
        let mut config = Config::default();
        config.analytics.log_path = Some("events.jsonl".into());
        config.analytics.send_interval_ms = 0;
        manager.save(&config).unwrap();

        let mut shell = ShellContext::with_base_dir(CliMode::Script, temp.path()).unwrap();
        shell.process_line("login ana").unwrap();
        shell.process_line("logout").unwrap();
        shell.process_line("logout").unwrap();
        shell.analytics.flush();

        let events = tracked_events(&temp.path().join("events.jsonl"));
        let session_events: Vec<_> = events
            .iter()
            .filter(|(name, _)| {
                matches!(name, EventName::UserLoggedIn | EventName::UserLoggedOut)
            })
            .collect();
        assert_eq!(session_events.len(), 2, "{events:?}");
        assert_eq!(session_events[0].0, EventName::UserLoggedIn);
        assert_eq!(session_events[0].1["username"], "ana");
        assert_eq!(session_events[1].0, EventName::UserLoggedOut);
        assert_eq!(session_events[1].1["username"], "ana");
    }

    #[test]
    fn unknown_commands_do_not_fail() {
        let temp = tempdir().unwrap();
        let mut shell = ShellContext::with_base_dir(CliMode::Script, temp.path()).unwrap();
        assert_eq!(shell.process_line("sumary").unwrap(), LoopControl::Continue);
        assert_eq!(shell.process_line("exit").unwrap(), LoopControl::Exit);
    }

    #[test]
    fn adding_requires_a_session() {
        let temp = tempdir().unwrap();
        let mut shell = ShellContext::with_base_dir(CliMode::Script, temp.path()).unwrap();
        let err = shell.process_line("income 10 tip").unwrap_err();
        assert!(matches!(err, CommandError::NotSignedIn));
    }
}
