//! Application layer errors

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::domain::entities::Permissions;

/// General bot errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Reload error: {0}")]
    Reload(#[from] ReloadError),

    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors returned by command, event and addon handlers
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Why one source unit could not be turned into a descriptor
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("{path} is missing required field '{field}'")]
    MissingField { path: PathBuf, field: &'static str },

    #[error("{path} requests unknown permission '{permission}'")]
    UnknownPermission { path: PathBuf, permission: String },

    #[error("{path} refers to unknown handler '{key}'")]
    UnknownHandler { path: PathBuf, key: String },

    #[error("{path} declares invalid structured command: {reason}")]
    InvalidStructured { path: PathBuf, reason: String },
}

impl LoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Io { path, .. }
            | LoadError::Parse { path, .. }
            | LoadError::MissingField { path, .. }
            | LoadError::UnknownPermission { path, .. }
            | LoadError::UnknownHandler { path, .. }
            | LoadError::InvalidStructured { path, .. } => path,
        }
    }
}

/// Runtime reload errors
#[derive(Error, Debug)]
pub enum ReloadError {
    #[error("No source unit named '{0}'")]
    NotFound(String),

    #[error("Source unit {0} has no name")]
    InvalidShape(PathBuf),

    #[error(transparent)]
    Load(LoadError),

    #[error("Reload task failed: {0}")]
    Task(String),
}

impl From<LoadError> for ReloadError {
    fn from(err: LoadError) -> Self {
        match err {
            LoadError::MissingField { path, field: "name" } => ReloadError::InvalidShape(path),
            other => ReloadError::Load(other),
        }
    }
}

/// Remote registry synchronization errors. Never fatal.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },

    #[error("Remote registry rejected the schema: {0}")]
    Validation(String),

    #[error("Unexpected HTTP status {status}: {body}")]
    Http { status: u16, body: String },
}

/// Gate rejection shown to the invoker. Not logged as an error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("This command is restricted to the bot owners.")]
    OwnerOnly,

    #[error("This command is under maintenance. Try again later.")]
    Maintenance,

    #[error("This command can only be used in age-restricted channels.")]
    NsfwOnly,

    #[error("You are missing the following permissions: {0}")]
    MissingPermissions(Permissions),

    #[error(
        "I am missing the following permissions here: {0}. \
         Ask a server administrator to fix my role."
    )]
    BotMissingPermissions(Permissions),

    #[error("Slow down! You can use this command again in {remaining_secs}s.")]
    Cooldown { remaining_secs: u64 },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
