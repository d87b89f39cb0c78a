//! Log setup
//!
//! The terminal belongs to the TUI while the dashboard runs, so logs go to a
//! file under the XDG cache directory (`~/.cache/wxdash/wxdash.log` on Linux)
//! unless a path is given. The filter follows `RUST_LOG` and defaults to `info`.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use env_logger::{Env, Target};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not determine a cache directory for the log file")]
    NoLogDirectory,

    #[error("Failed to open log file '{0}'")]
    Open(PathBuf, #[source] io::Error),

    #[error("A logger is already installed")]
    AlreadyInstalled(#[from] log::SetLoggerError),
}

/// Default log location, or `None` when there is no home directory
pub fn default_log_path() -> Option<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "wxdash")?;
    Some(project_dirs.cache_dir().join("wxdash.log"))
}

/// Opens `path` for appending, creating parent directories as needed
pub fn open_log_file(path: &Path) -> Result<File, LoggingError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| LoggingError::Open(path.to_path_buf(), e))?;
    }
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| LoggingError::Open(path.to_path_buf(), e))
}

fn builder() -> env_logger::Builder {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
}

/// Installs the global logger writing to `path` (or the default location)
///
/// # Returns
/// * `Ok(PathBuf)` - The file logs are written to
/// * `Err(LoggingError)` - If no path can be resolved or opened
pub fn init_file(path: Option<&Path>) -> Result<PathBuf, LoggingError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => default_log_path().ok_or(LoggingError::NoLogDirectory)?,
    };
    let file = open_log_file(&path)?;
    builder().target(Target::Pipe(Box::new(file))).try_init()?;
    Ok(path)
}

/// Installs the global logger writing to stderr, for non-interactive runs
pub fn init_stderr() -> Result<(), LoggingError> {
    builder().target(Target::Stderr).try_init()?;
    Ok(())
}
