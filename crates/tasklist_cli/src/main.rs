//! `tasklist` command-line entry point.
//!
//! # Responsibility
//! - Resolve configuration, start logging and open durable storage.
//! - Hydrate the task list once and run a single command against it.

mod cli;
mod commands;
mod config;

use clap::Parser;
use cli::{Cli, Command};
use commands::CommandError;
use config::CliConfig;
use log::warn;
use std::process::ExitCode;
use tasklist_core::db::open_db;
use tasklist_core::{
    init_logging, DurableStore, LoggingError, SqliteKvRepository, TaskListService,
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CommandError> {
    let mut stdout = std::io::stdout().lock();
    if cli.command == Command::Version {
        return commands::write_version(&mut stdout);
    }

    let config = CliConfig::resolve(&cli)?;
    match init_logging(&config.log_level, &config.log_dir) {
        Ok(()) => {}
        Err(err @ LoggingError::UnsupportedLevel(_)) => return Err(err.into()),
        // Logging is diagnostic only; the command still runs without it.
        Err(err) => eprintln!("warning: logging disabled: {err}"),
    }

    config.ensure_db_dir()?;
    let conn = open_db(&config.db_path)?;
    let repo = SqliteKvRepository::try_new(&conn)?;
    let mut service = TaskListService::hydrate(DurableStore::new(repo));

    let result = commands::execute(cli.command, &mut service, &mut stdout);
    if !service.is_synced() {
        warn!(
            "event=cli_exit module=cli status=unsynced count={}",
            service.tasks().len()
        );
    }
    result
}
