use std::path::PathBuf;

use crate::cli::core::{CommandError, CommandResult, ShellContext};
use crate::cli::format::{bucket_line, format_amount, transaction_row};
use crate::cli::io;
use crate::cli::output::section as output_section;
use crate::core::PersistenceStatus;
use crate::ledger::{Category, ExpenseCategory, TransactionFilter, TransactionId};
use crate::storage::JsonFileExporter;

use super::{usage_error, CommandDefinition};

const INCOME_USAGE: &str = "income <amount> <description>";
const EXPENSE_USAGE: &str = "expense <fixed|variable> <amount> <description>";
const DELETE_USAGE: &str = "delete <id>";

pub(crate) fn definitions() -> Vec<CommandDefinition> {
    vec![
        CommandDefinition::new("income", "Record income", INCOME_USAGE, cmd_income),
        CommandDefinition::new(
            "expense",
            "Record a fixed or variable expense",
            EXPENSE_USAGE,
            cmd_expense,
        ),
        CommandDefinition::new(
            "list",
            "List transactions, newest first",
            "list [all|income|fixed|variable]",
            cmd_list,
        ),
        CommandDefinition::new("delete", "Delete a transaction", DELETE_USAGE, cmd_delete),
        CommandDefinition::new(
            "summary",
            "Show income and the 50/30/20 budgets",
            "summary",
            cmd_summary,
        ),
        CommandDefinition::new(
            "new-month",
            "Remove every transaction and start over",
            "new-month",
            cmd_new_month,
        ),
        CommandDefinition::new(
            "export",
            "Write transactions and summary to a JSON file",
            "export [dir]",
            cmd_export,
        ),
    ]
}

fn cmd_income(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.require_user()?;
    let Some((amount, words)) = args.split_first() else {
        return Err(usage_error(INCOME_USAGE));
    };
    context
        .tracker
        .add_income(amount, &words.join(" "))
        .map_err(CommandError::Reported)?;
    print_balance(context);
    Ok(())
}

fn cmd_expense(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.require_user()?;
    let [category, amount, words @ ..] = args else {
        return Err(usage_error(EXPENSE_USAGE));
    };
    let category: ExpenseCategory = category.parse()?;
    if let Err(err) = context
        .tracker
        .add_expense(category, amount, &words.join(" "))
    {
        if !context.tracker.engine().has_income() {
            io::print_hint("Budgets come from income. Record some with `income` first.");
        }
        return Err(CommandError::Reported(err));
    }
    let summary = context.tracker.summary();
    io::print_info(format!(
        "{} left in the {category} budget.",
        format_amount(
            context.tracker.currency_symbol(),
            summary.bucket(category).remaining
        )
    ));
    Ok(())
}

fn cmd_list(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let filter = match args.first() {
        Some(raw) => {
            let filter: TransactionFilter = raw.parse()?;
            context.tracker.set_filter(filter);
            filter
        }
        None => context.tracker.filter(),
    };
    let symbol = context.tracker.currency_symbol().to_string();
    let rows = context.tracker.visible_transactions();
    output_section(format!("Transactions ({filter})"));
    if rows.is_empty() {
        io::print_info("No transactions yet.");
        return Ok(());
    }
    for transaction in rows {
        io::print_info(transaction_row(&symbol, transaction));
    }
    Ok(())
}

fn cmd_delete(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    let [raw] = args else {
        return Err(usage_error(DELETE_USAGE));
    };
    let id: TransactionId = raw
        .trim_start_matches('#')
        .parse()
        .map_err(|_| CommandError::InvalidArguments(format!("`{raw}` is not a transaction id")))?;
    if !context.confirm(&format!("Delete transaction #{id}?"))? {
        io::print_info("Nothing deleted.");
        return Ok(());
    }
    context
        .tracker
        .delete_transaction(id)
        .map_err(CommandError::Reported)?;
    print_balance(context);
    Ok(())
}

fn cmd_summary(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    let summary = context.tracker.summary();
    let symbol = context.tracker.currency_symbol();
    output_section("Budget summary");
    io::print_info(format!(
        "{:<16} {}",
        "Income",
        format_amount(symbol, summary.total_income)
    ));
    for category in ExpenseCategory::ALL {
        let title = Category::from(category).label();
        io::print_info(bucket_line(symbol, title, summary.bucket(category)));
    }
    io::print_info(format!(
        "{:<16} target {}",
        "Savings",
        format_amount(symbol, summary.savings)
    ));
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

fn cmd_new_month(context: &mut ShellContext, _args: &[&str]) -> CommandResult {
    if !context.confirm("Start a new month? Every transaction will be removed.")? {
        io::print_info("Ledger left unchanged.");
        return Ok(());
    }
    let dropped = context.tracker.new_month();
    io::print_info(format!("{dropped} transaction(s) removed."));
    Ok(())
}

fn cmd_export(context: &mut ShellContext, args: &[&str]) -> CommandResult {
    context.require_user()?;
    let receipt = match args.first() {
        Some(dir) => {
            let sink = JsonFileExporter::new(PathBuf::from(dir));
            context.tracker.export_with(&sink)
        }
        None => context.tracker.export(),
    }
    .map_err(CommandError::Reported)?;
    io::print_info(format!("{} transaction(s) written.", receipt.transactions));
    Ok(())
}

fn print_balance(context: &ShellContext) {
    let summary = context.tracker.summary();
    let symbol = context.tracker.currency_symbol();
    io::print_info(format!(
        "Income {} | fixed left {} | variable left {}",
        format_amount(symbol, summary.total_income),
        format_amount(symbol, summary.fixed.remaining),
        format_amount(symbol, summary.variable.remaining)
    ));
}

#[cfg(test)]
mod tests {
    use crate::cli::core::{CliMode, CommandError, ShellContext};
    use crate::errors::LedgerError;
    use crate::ledger::TransactionFilter;
    use tempfile::tempdir;

    fn signed_in_shell(base: &std::path::Path) -> ShellContext {
        let mut shell = ShellContext::with_base_dir(CliMode::Script, base).unwrap();
        shell.process_line("login ana").unwrap();
        shell
    }

    #[test]
    fn budget_rule_is_enforced_through_commands() {
        let temp = tempdir().unwrap();
        let mut shell = signed_in_shell(temp.path());
        shell.process_line("income 1000 \"monthly salary\"").unwrap();
        shell.process_line("expense fixed 400 rent").unwrap();
        let err = shell
            .process_line("expense fixed 150 insurance")
            .unwrap_err();
        assert!(matches!(
            err,
            CommandError::Reported(LedgerError::InsufficientBudget { .. })
        ));
        let summary = shell.tracker.summary();
        assert_eq!(summary.fixed.spent, 400.0);
        assert_eq!(summary.fixed.remaining, 100.0);
    }

    #[test]
    fn descriptions_keep_every_word() {
        let temp = tempdir().unwrap();
        let mut shell = signed_in_shell(temp.path());
        shell.process_line("income 12,50 birthday gift").unwrap();
        let rows = shell.tracker.visible_transactions();
        assert_eq!(rows[0].description, "birthday gift");
        assert_eq!(rows[0].amount, 12.5);
    }

    #[test]
    fn unknown_category_is_rejected() {
        let temp = tempdir().unwrap();
        let mut shell = signed_in_shell(temp.path());
        let err = shell.process_line("expense fun 10 cinema").unwrap_err();
        assert!(matches!(
            err,
            CommandError::Ledger(LedgerError::InvalidCategory(_))
        ));
    }

    #[test]
    fn list_filter_sticks() {
        let temp = tempdir().unwrap();
        let mut shell = signed_in_shell(temp.path());
        shell.process_line("list income").unwrap();
        assert_eq!(shell.tracker.filter(), TransactionFilter::Income);
        shell.process_line("list").unwrap();
        assert_eq!(shell.tracker.filter(), TransactionFilter::Income);
    }

    #[test]
    fn delete_and_new_month_confirm_in_script_mode() {
        let temp = tempdir().unwrap();
        let mut shell = signed_in_shell(temp.path());
        shell.process_line("income 100 salary").unwrap();
        shell.process_line("income 50 bonus").unwrap();
        let id = shell.tracker.visible_transactions()[0].id;
        shell.process_line(&format!("delete #{id}")).unwrap();
        assert_eq!(shell.tracker.engine().ledger().len(), 1);

        shell.process_line("new-month").unwrap();
        assert!(shell.tracker.engine().ledger().is_empty());
    }

    #[test]
    fn export_accepts_a_target_directory() {
        let temp = tempdir().unwrap();
        let target = temp.path().join("out");
        let mut shell = signed_in_shell(temp.path());
        shell.process_line("income 100 salary").unwrap();
        shell
            .process_line(&format!("export \"{}\"", target.display()))
            .unwrap();
        let files: Vec<_> = std::fs::read_dir(&target).unwrap().collect();
        assert_eq!(files.len(), 1);
    }
}
