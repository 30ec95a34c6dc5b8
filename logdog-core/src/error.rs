//! Error types for logdog-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from loading or querying the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure while reading the configuration file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML (or JSON) parse error on load, with file path and line context.
    #[error("failed to parse configuration at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration file did not exist at the given path.
    #[error("configuration not found at {path}")]
    NotFound { path: PathBuf },

    /// A required key is absent from the loaded document.
    #[error("missing configuration key '{0}'")]
    MissingKey(String),

    /// Neither the handler's watcher nor `logdog.default_watcher` is configured.
    #[error(
        "no watcher for handler '{handler}': add a 'watchers' entry or 'logdog.default_watcher'"
    )]
    NoWatcher { handler: String },

    /// An action's configuration block does not match what the action expects.
    #[error("invalid settings for action '{action}': {source}")]
    InvalidActionSettings {
        action: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The watcher placeholder pattern failed to compile.
    #[error("invalid file placeholder pattern: {0}")]
    Placeholder(#[source] regex::Error),

    /// A handler uses a name reserved for the daemon's internal events.
    #[error("handler name '{0}' is reserved for internal events")]
    ReservedHandler(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
