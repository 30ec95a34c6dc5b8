//! Error types for logdog-actions.

use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use logdog_core::ConfigError;
use logdog_template::TemplateError;

/// All errors an action invocation can produce.
#[derive(Debug, Error)]
pub enum ActionError {
    /// No action is registered under the requested name.
    #[error("action '{0}' not found")]
    NotFound(String),

    /// The action's configuration block is missing or malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configuration block parsed but its values are unusable.
    #[error("invalid settings for action '{action}': {reason}")]
    InvalidSettings { action: String, reason: String },

    /// Filesystem failure while performing the action.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// An external command could not be started or waited for.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external command exited without reading all of its input.
    #[error("failed to write to '{command}': {source}")]
    Pipe {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// An external command ran but reported failure.
    #[error("'{command}' exited with {status}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error(transparent)]
    Template(#[from] TemplateError),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ActionError {
    ActionError::Io {
        path: path.into(),
        source,
    }
}

pub(crate) fn spawn_err(command: &[String], source: std::io::Error) -> ActionError {
    ActionError::Spawn {
        command: command.join(" "),
        source,
    }
}
