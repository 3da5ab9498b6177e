use std::process;

fn main() {
    expense_core::init();

    if let Err(err) = expense_core::cli::run_cli() {
        eprintln!("Error: {err}");
        process::exit(1);
    }
}
