use std::process::exit;

use colored::Colorize;

fn main() {
    if let Err(e) = fundtable::app::run_cli() {
        eprintln!("{} {}", "[ERR]".bold().red(), e);
        exit(1);
    }
}
