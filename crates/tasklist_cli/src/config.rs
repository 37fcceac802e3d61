//! Per-invocation configuration for the CLI.
//!
//! # Responsibility
//! - Resolve database path, log directory and log level.
//! - Prepare directories the core expects to exist.
//!
//! # Invariants
//! - Precedence is flag, then environment (handled by clap), then default.
//! - Resolved paths are absolute.

use crate::cli::Cli;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use tasklist_core::default_log_level;

const APP_DIR_NAME: &str = "tasklist";
const DB_FILE_NAME: &str = "tasklist.sqlite3";
const LOG_DIR_NAME: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    /// No flag, no environment value and no platform data directory.
    NoDataDir,
    CurrentDir(std::io::Error),
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoDataDir => write!(
                f,
                "no local data directory found; pass --db and --log-dir or set TASKLIST_DB_PATH and TASKLIST_LOG_DIR"
            ),
            Self::CurrentDir(err) => write!(f, "cannot resolve current directory: {err}"),
            Self::CreateDir { dir, source } => {
                write!(f, "failed to create `{}`: {source}", dir.display())
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NoDataDir => None,
            Self::CurrentDir(err) => Some(err),
            Self::CreateDir { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    pub db_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: String,
}

impl CliConfig {
    /// Resolves configuration against the platform data directory.
    pub fn resolve(cli: &Cli) -> Result<Self, ConfigError> {
        let data_dir = dirs::data_local_dir().map(|dir| dir.join(APP_DIR_NAME));
        Self::resolve_with(cli, data_dir.as_deref())
    }

    fn resolve_with(cli: &Cli, data_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let db_path = match (&cli.db, data_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(DB_FILE_NAME),
            (None, None) => return Err(ConfigError::NoDataDir),
        };
        let log_dir = match (&cli.log_dir, data_dir) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(LOG_DIR_NAME),
            (None, None) => return Err(ConfigError::NoDataDir),
        };
        let log_level = cli
            .log_level
            .clone()
            .unwrap_or_else(|| default_log_level().to_string());

        Ok(Self {
            db_path: absolutize(db_path)?,
            log_dir: absolutize(log_dir)?,
            log_level,
        })
    }

    /// Creates the database parent directory when missing.
    pub fn ensure_db_dir(&self) -> Result<(), ConfigError> {
        let Some(parent) = self.db_path.parent() else {
            return Ok(());
        };
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
            dir: parent.to_path_buf(),
            source,
        })
    }
}

fn absolutize(path: PathBuf) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path);
    }
    let cwd = std::env::current_dir().map_err(ConfigError::CurrentDir)?;
    Ok(cwd.join(path))
}

#[cfg(test)]
mod tests {
    use super::{CliConfig, ConfigError};
    use crate::cli::{Cli, Command};
    use std::path::{Path, PathBuf};

    fn cli(db: Option<&str>, log_dir: Option<&str>, log_level: Option<&str>) -> Cli {
        Cli {
            db: db.map(PathBuf::from),
            log_dir: log_dir.map(PathBuf::from),
            log_level: log_level.map(str::to_string),
            command: Command::Version,
        }
    }

    #[test]
    fn defaults_live_under_data_dir() {
        let data_dir = Path::new("/data/tasklist");
        let config = CliConfig::resolve_with(&cli(None, None, None), Some(data_dir)).unwrap();

        assert_eq!(config.db_path, data_dir.join("tasklist.sqlite3"));
        assert_eq!(config.log_dir, data_dir.join("logs"));
        assert_eq!(config.log_level, tasklist_core::default_log_level());
    }

    #[test]
    fn explicit_values_win_and_relative_paths_become_absolute() {
        let config = CliConfig::resolve_with(
            &cli(Some("tasks.sqlite3"), Some("/var/log/tasklist"), Some("warn")),
            None,
        )
        .unwrap();

        assert!(config.db_path.is_absolute());
        assert!(config.db_path.ends_with("tasks.sqlite3"));
        assert_eq!(config.log_dir, PathBuf::from("/var/log/tasklist"));
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn missing_data_dir_without_overrides_is_an_error() {
        let err = CliConfig::resolve_with(&cli(Some("/tmp/t.sqlite3"), None, None), None)
            .unwrap_err();
        assert!(matches!(err, ConfigError::NoDataDir));
    }

    #[test]
    fn ensure_db_dir_creates_parent() {
        let root = tempfile::tempdir().unwrap();
        let db_path = root.path().join("nested").join("tasklist.sqlite3");
        let config = CliConfig {
            db_path: db_path.clone(),
            log_dir: root.path().join("logs"),
            log_level: "info".to_string(),
        };

        config.ensure_db_dir().unwrap();
        assert!(db_path.parent().unwrap().is_dir());
    }
}
