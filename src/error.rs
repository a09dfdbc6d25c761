use std::{io, path::PathBuf};

/// Errors returned while setting up a file logger.
#[derive(Debug, thiserror::Error)]
pub enum FileLoggerError {
    #[error("Failed to create directory for log file '{0}': {1}")]
    CreateDirectoryFailed(PathBuf, String),
    #[error("Log file '{0}' does not exist or could not be created: {1}")]
    NotFound(PathBuf, String),
    #[error("Permission denied for log file '{0}': {1}")]
    PermissionDenied(PathBuf, String),
    #[error("Failed to open log file '{0}': {1}")]
    CreateFileFailed(PathBuf, String),
    #[error("File IO error: {0}")]
    FileIOError(#[from] io::Error),
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Errors returned by [`crate::FileLogger::check_network_path`].
#[derive(Debug, thiserror::Error)]
pub enum PathCheckError {
    #[error("Log path '{0}' does not exist or is not accessible")]
    NotFound(PathBuf),
    #[error("Cannot access log path '{path}': {error}")]
    Inaccessible { path: PathBuf, error: io::Error },
}
