//! Command-line argument model.
//!
//! Global options fall back to `TASKLIST_*` environment variables and then to
//! the defaults in [`crate::config`].

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tasklist_core::{TaskFilter, TaskId};

#[derive(Parser, Debug)]
#[command(name = "tasklist")]
#[command(version, about = "Local task list with durable storage", long_about = None)]
pub struct Cli {
    /// SQLite database file holding the task list
    #[arg(long, env = "TASKLIST_DB_PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Directory for rolling log files
    #[arg(long, env = "TASKLIST_LOG_DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, env = "TASKLIST_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a task
    Add {
        /// Task name; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// List tasks in insertion order
    List {
        #[arg(short, long, value_enum, default_value_t = StatusArg::All)]
        status: StatusArg,
    },

    /// Rename a task
    Edit {
        id: TaskId,

        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },

    /// Mark a task completed, or incomplete again
    Toggle { id: TaskId },

    /// Delete a task
    Delete { id: TaskId },

    /// Print core and CLI versions
    Version,
}

#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusArg {
    #[default]
    All,
    Active,
    Completed,
}

impl From<StatusArg> for TaskFilter {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::All => TaskFilter::All,
            StatusArg::Active => TaskFilter::Active,
            StatusArg::Completed => TaskFilter::Completed,
        }
    }
}
