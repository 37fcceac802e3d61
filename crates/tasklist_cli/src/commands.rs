//! Command execution against a task list service.
//!
//! # Responsibility
//! - Enforce input rules owned by the calling layer (minimum name length).
//! - Render task list state as plain text.
//!
//! # Invariants
//! - Rejected input never reaches the service.
//! - Unknown ids are reported, not treated as failures.

use crate::cli::Command;
use crate::config::ConfigError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::io::Write;
use tasklist_core::db::DbError;
use tasklist_core::model::timestamp;
use tasklist_core::{
    KvRepository, LoggingError, RepoError, Task, TaskFilter, TaskId, TaskListError,
    TaskListService,
};

/// Minimum task name length accepted from the command line, in characters.
pub const MIN_NAME_CHARS: usize = 4;

#[derive(Debug)]
pub enum CommandError {
    NameTooShort { min: usize, actual: usize },
    Config(ConfigError),
    Logging(LoggingError),
    Db(DbError),
    Repo(RepoError),
    TaskList(TaskListError),
    Output(std::io::Error),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameTooShort { min, actual } => write!(
                f,
                "task name must be at least {min} characters (got {actual})"
            ),
            Self::Config(err) => write!(f, "{err}"),
            Self::Logging(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "cannot open task database: {err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::TaskList(err) => write!(f, "{err}"),
            Self::Output(err) => write!(f, "failed to write output: {err}"),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NameTooShort { .. } => None,
            Self::Config(err) => Some(err),
            Self::Logging(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::TaskList(err) => Some(err),
            Self::Output(err) => Some(err),
        }
    }
}

impl From<ConfigError> for CommandError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<LoggingError> for CommandError {
    fn from(value: LoggingError) -> Self {
        Self::Logging(value)
    }
}

impl From<DbError> for CommandError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<RepoError> for CommandError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<TaskListError> for CommandError {
    fn from(value: TaskListError) -> Self {
        Self::TaskList(value)
    }
}

impl From<std::io::Error> for CommandError {
    fn from(value: std::io::Error) -> Self {
        Self::Output(value)
    }
}

/// Writes the CLI and core versions.
///
/// Needs no storage, so `main` calls it before opening the database.
pub fn write_version(out: &mut impl Write) -> Result<(), CommandError> {
    writeln!(out, "tasklist {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "tasklist_core {}", tasklist_core::core_version())?;
    Ok(())
}

/// Runs one task list command and writes its report to `out`.
pub fn execute<R: KvRepository>(
    command: Command,
    service: &mut TaskListService<R>,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    match command {
        Command::Add { name } => {
            let name = checked_name(&name)?;
            let task = service.add(&name)?;
            writeln!(out, "Added task {}: {}", task.id, task.name)?;
        }
        Command::List { status } => render_list(service, status.into(), out)?,
        Command::Edit { id, name } => {
            let name = checked_name(&name)?;
            if service.edit(id, &name)? {
                writeln!(out, "Renamed task {id}.")?;
            } else {
                report_missing(id, out)?;
            }
        }
        Command::Toggle { id } => {
            if service.toggle(id)? {
                let state = match service.get(id) {
                    Some(task) if task.completed => "completed",
                    _ => "not completed",
                };
                writeln!(out, "Task {id} is now {state}.")?;
            } else {
                report_missing(id, out)?;
            }
        }
        Command::Delete { id } => {
            if service.delete(id)? {
                writeln!(out, "Deleted task {id}.")?;
            } else {
                report_missing(id, out)?;
            }
        }
        Command::Version => write_version(out)?,
    }
    Ok(())
}

fn checked_name(words: &[String]) -> Result<String, CommandError> {
    let name = words.join(" ");
    let actual = name.trim().chars().count();
    if actual < MIN_NAME_CHARS {
        return Err(CommandError::NameTooShort {
            min: MIN_NAME_CHARS,
            actual,
        });
    }
    Ok(name)
}

fn render_list<R: KvRepository>(
    service: &TaskListService<R>,
    filter: TaskFilter,
    out: &mut impl Write,
) -> Result<(), CommandError> {
    if service.tasks().is_empty() {
        writeln!(out, "No tasks yet. Add one with `tasklist add <name>`.")?;
        return Ok(());
    }

    let mut shown = 0;
    for task in service.filtered(filter) {
        writeln!(out, "{}", format_task(task))?;
        shown += 1;
    }
    if shown == 0 {
        writeln!(out, "No matching tasks.")?;
    }

    let counts = service.counts();
    writeln!(
        out,
        "{} task(s): {} active, {} completed",
        counts.total, counts.active, counts.completed
    )?;
    Ok(())
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    format!(
        "[{mark}] {:>3}  {}  ({})",
        task.id,
        task.name,
        timestamp::format(&task.created_at)
    )
}

fn report_missing(id: TaskId, out: &mut impl Write) -> Result<(), CommandError> {
    writeln!(out, "No task with id {id}; nothing changed.")?;
    Ok(())
}
