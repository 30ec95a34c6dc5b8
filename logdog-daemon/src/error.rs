use std::path::PathBuf;

use thiserror::Error;

/// Error surface for supervision, dispatch, and the daemon lifecycle.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(#[from] logdog_core::ConfigError),

    #[error("action error: {0}")]
    Action(#[from] logdog_actions::ActionError),

    #[error("invalid pattern for {handler}:{event}: {source}")]
    Pattern {
        handler: String,
        event: String,
        #[source]
        source: regex::Error,
    },

    #[error("watcher command for handler '{handler}' is empty")]
    EmptyCommand { handler: String },

    #[error("failed to start watcher '{command}' for handler '{handler}': {source}")]
    Spawn {
        handler: String,
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read watcher output of handler '{handler}': {source}")]
    Read {
        handler: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{task} task join failure: {reason}")]
    Join { task: String, reason: String },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn join_err(task: impl Into<String>, err: tokio::task::JoinError) -> DaemonError {
    DaemonError::Join {
        task: task.into(),
        reason: err.to_string(),
    }
}
