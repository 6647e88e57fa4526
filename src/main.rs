mod agents;
mod cli;
mod config;
mod error;
mod utils;
mod workflow;

use clap::Parser;
use cli::Cli;
use colored::Colorize;
use std::process;
use workflow::UpdateOptions;

fn main() {
    let cli = Cli::parse();

    let options = UpdateOptions {
        token: cli.token,
        dry_run: cli.dry_run,
        json: cli.json,
        verbose: cli.verbose,
    };

    if let Err(e) = workflow::execute_update(&cli.path, cli.config.as_deref(), &options) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(1);
    }
}
