use crate::cli::core::{CommandResult, ShellContext};
use crate::cli::io;
use crate::core::PersistenceStatus;

use super::{usage_error, CommandDefinition};

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new(
            "login",
            "Sign in and load your ledger",
            "login <user>",
            cmd_login,
        ),
        CommandDefinition::new("logout", "Sign out", "logout", cmd_logout),
        CommandDefinition::new("whoami", "Show the signed-in user", "whoami", cmd_whoami),
    ]
}

fn cmd_login(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return Err(usage_error("login <user>"));
    }
    let user = args.join(" ");
    context.sign_in(&user)?;
    let count = context.tracker.engine().ledger().len();
    io::print_success(format!("Signed in as {}.", user.trim()));
    io::print_info(format!("{count} transaction(s) loaded."));
    Ok(())
}

fn cmd_logout(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.sign_out()? {
        Some(user) => io::print_success(format!("Signed out {user}.")),
        None => io::print_info("Nobody is signed in."),
    }
    Ok(())
}

fn cmd_whoami(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    match context.tracker.current_user() {
        Some(user) => io::print_info(format!("Signed in as {user}.")),
        None => io::print_info("Not signed in."),
    }
    match context.tracker.status() {
        PersistenceStatus::Degraded(reason) => {
            io::print_warning(format!("Changes are not being saved: {reason}"))
        }
        PersistenceStatus::LoadFailed(reason) => io::print_warning(format!(
            "Saved data could not be read ({reason}). Sign in again to retry."
        )),
        PersistenceStatus::Ephemeral | PersistenceStatus::Healthy => {}
    }
    Ok(())
}
