use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::tempdir;

fn cli(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("expense_core_cli").unwrap();
    cmd.env("EXPENSE_CORE_CLI_SCRIPT", "1")
        .env("EXPENSE_CORE_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn script_mode_runs_basic_flow() {
    let home = tempdir().unwrap();
    let input = "login ana\n\
                 income 1000 salary\n\
                 expense fixed 400 rent\n\
                 expense fixed 150 insurance\n\
                 summary\n\
                 exit\n";

    cli(home.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Signed in as ana."))
        .stdout(contains("Income added"))
        .stdout(contains("Not enough fixed budget. Available: €100.00"))
        .stdout(contains("Budget summary"));

    let slot = home.path().join("data");
    let entries: Vec<_> = std::fs::read_dir(slot).unwrap().collect();
    assert_eq!(entries.len(), 1);
}

#[test]
fn script_mode_exports_and_clears() {
    let home = tempdir().unwrap();
    let input = "login ana\nincome 500 salary\nexport\nnew-month\nlist\n";

    cli(home.path())
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Data exported to"))
        .stdout(contains("New month started"))
        .stdout(contains("No transactions yet."));

    let exports: Vec<_> = std::fs::read_dir(home.path().join("exports"))
        .unwrap()
        .collect();
    assert_eq!(exports.len(), 1);
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = tempdir().unwrap();
    cli(home.path())
        .write_stdin("sumary\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `sumary`"))
        .stdout(contains("Suggestion: `summary`?"));
}

#[test]
fn adding_without_login_is_refused() {
    let home = tempdir().unwrap();
    cli(home.path())
        .write_stdin("income 10 tip\nwhoami\n")
        .assert()
        .success()
        .stdout(contains("You must sign in first."))
        .stdout(contains("Not signed in."))
        .stdout(contains("Income added").not());
}
