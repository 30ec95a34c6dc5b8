//! Configuration document: handlers, watchers, event rules and action blocks.
//!
//! # Layout
//!
//! ```text
//! logdog:            daemon-wide settings (debug, default_watcher, default_actions, events)
//! watchers:          name → { command: [argv…], cwd }
//! handlers:          name → { file, watcher, events: name → rule }
//! actions:           name → arbitrary block read by the action itself
//! ```
//!
//! `handlers.logdog` is not a watched handler. It may carry
//! `events: name → { actions }` routing for internal events, which is where
//! older JSON configurations keep it.
//!
//! The document is YAML; JSON files load unchanged. It is read once at startup
//! and never mutated afterwards.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::{NoExpand, Regex};
use serde::de::{DeserializeOwned, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::types::{NamedTable, INTERNAL_IDENTITY};

/// Working directory used when a watcher does not name one.
pub const DEFAULT_WATCHER_CWD: &str = "./";

/// `${FILE}`, or `$FILE` not followed by a word character.
pub const FILE_PLACEHOLDER_PATTERN: &str = r"\$(?:\{FILE\}|FILE\b)";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Root of the configuration document.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "ConfigDocument")]
pub struct Config {
    pub logdog: DaemonSettings,
    pub watchers: NamedTable<WatcherConfig>,
    /// Watched handlers. Never contains the internal identity.
    pub handlers: NamedTable<HandlerConfig>,
    /// The `handlers.logdog` entry, if the document has one.
    pub internal: Option<InternalRouting>,
    pub actions: BTreeMap<String, serde_yaml::Value>,
}

/// The document as written, before `handlers.logdog` is split off.
#[derive(Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    logdog: DaemonSettings,
    #[serde(default)]
    watchers: NamedTable<WatcherConfig>,
    #[serde(default)]
    handlers: HandlerEntries,
    #[serde(default)]
    actions: BTreeMap<String, serde_yaml::Value>,
}

impl From<ConfigDocument> for Config {
    fn from(document: ConfigDocument) -> Self {
        Self {
            logdog: document.logdog,
            watchers: document.watchers,
            handlers: document.handlers.watched,
            internal: document.handlers.internal,
            actions: document.actions,
        }
    }
}

#[derive(Default)]
struct HandlerEntries {
    watched: NamedTable<HandlerConfig>,
    internal: Option<InternalRouting>,
}

impl<'de> Deserialize<'de> for HandlerEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = HandlerEntries;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of handler names to handlers")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<HandlerEntries, A::Error> {
                let mut entries = HandlerEntries::default();
                while let Some(name) = map.next_key::<String>()? {
                    if name == INTERNAL_IDENTITY {
                        entries.internal = Some(map.next_value()?);
                    } else {
                        let handler = map.next_value()?;
                        entries.watched.insert(name, handler);
                    }
                }
                Ok(entries)
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// `handlers.logdog`: action routing for internal events only.
///
/// `file` and `watcher` are read so that [`Config::validate`] can reject
/// them; the internal identity is never watched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InternalRouting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watcher: Option<String>,
    #[serde(default)]
    pub events: NamedTable<EventActions>,
}

/// The `logdog` section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaemonSettings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_watcher: Option<WatcherConfig>,
    /// `None` means no default list at all, which differs from an empty list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_actions: Option<Vec<String>>,
    /// Action routing for the daemon's internal events.
    #[serde(default)]
    pub events: NamedTable<EventActions>,
}

/// Action routing for one internal event. Other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventActions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

/// An external line-streaming process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Argument vector; `$FILE` / `${FILE}` is replaced with the handler's file.
    pub command: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl WatcherConfig {
    /// The argument vector with every file placeholder replaced by `file`.
    pub fn command_for(&self, file: &Path) -> Result<Vec<String>, ConfigError> {
        let placeholder = Regex::new(FILE_PLACEHOLDER_PATTERN).map_err(ConfigError::Placeholder)?;
        let file = file.to_string_lossy();
        Ok(self
            .command
            .iter()
            .map(|arg| placeholder.replace_all(arg, NoExpand(file.as_ref())).into_owned())
            .collect())
    }

    pub fn working_dir(&self) -> PathBuf {
        self.cwd
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WATCHER_CWD))
    }
}

/// A supervised unit watching one target through one watcher process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerConfig {
    pub file: PathBuf,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub watcher: Option<String>,
    #[serde(default)]
    pub events: NamedTable<EventRuleConfig>,
}

/// Pattern, context window and message templates for one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRuleConfig {
    pub regexp: String,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, alias = "lines_before")]
    pub prev_lines: usize,
    #[serde(default, alias = "lines_after")]
    pub next_lines: usize,
    #[serde(default)]
    pub brief_information: String,
    #[serde(default)]
    pub detailed_information: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<String>>,
}

fn default_active() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Load
// ---------------------------------------------------------------------------

/// Load and validate the configuration at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed.
pub fn load(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config = parse(&contents).map_err(|source| match source {
        ParseFailure::Yaml(source) => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        ParseFailure::Invalid(err) => err,
    })?;
    Ok(config)
}

/// Parse and validate a configuration document held in memory.
pub fn from_str(contents: &str) -> Result<Config, ConfigError> {
    parse(contents).map_err(|failure| match failure {
        ParseFailure::Yaml(source) => ConfigError::Parse {
            path: PathBuf::from("<memory>"),
            source,
        },
        ParseFailure::Invalid(err) => err,
    })
}

enum ParseFailure {
    Yaml(serde_yaml::Error),
    Invalid(ConfigError),
}

fn parse(contents: &str) -> Result<Config, ParseFailure> {
    let config: Config = serde_yaml::from_str(contents).map_err(ParseFailure::Yaml)?;
    config.validate().map_err(ParseFailure::Invalid)?;
    Ok(config)
}

// ---------------------------------------------------------------------------
// Lookups
// ---------------------------------------------------------------------------

impl Config {
    /// Structural checks that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(routing) = &self.internal {
            if routing.file.is_some() || routing.watcher.is_some() {
                return Err(ConfigError::ReservedHandler(INTERNAL_IDENTITY.to_string()));
            }
        }
        Ok(())
    }

    pub fn handler_names(&self) -> Vec<&str> {
        self.handlers.names().collect()
    }

    pub fn handler(&self, name: &str) -> Result<&HandlerConfig, ConfigError> {
        self.handlers
            .get(name)
            .ok_or_else(|| ConfigError::MissingKey(format!("handlers.{name}")))
    }

    pub fn event(&self, handler: &str, event: &str) -> Result<&EventRuleConfig, ConfigError> {
        self.handler(handler)?
            .events
            .get(event)
            .ok_or_else(|| ConfigError::MissingKey(format!("handlers.{handler}.events.{event}")))
    }

    pub fn default_actions(&self) -> Option<&[String]> {
        self.logdog.default_actions.as_deref()
    }

    /// Names of every configured action block, sorted.
    pub fn action_names(&self) -> Vec<&str> {
        self.actions.keys().map(String::as_str).collect()
    }

    /// Deserialize the configuration block of action `name` into `T`.
    pub fn action_settings<T: DeserializeOwned>(&self, name: &str) -> Result<T, ConfigError> {
        let block = self
            .actions
            .get(name)
            .ok_or_else(|| ConfigError::MissingKey(format!("actions.{name}")))?;
        serde_yaml::from_value(block.clone()).map_err(|source| {
            ConfigError::InvalidActionSettings {
                action: name.to_string(),
                source,
            }
        })
    }

    /// The handler's own watcher when it names a configured one, else the default.
    pub fn resolve_watcher(&self, handler: &str) -> Result<&WatcherConfig, ConfigError> {
        let handler_config = self.handler(handler)?;
        if let Some(watcher) = handler_config
            .watcher
            .as_deref()
            .and_then(|name| self.watchers.get(name))
        {
            return Ok(watcher);
        }
        self.logdog
            .default_watcher
            .as_ref()
            .ok_or_else(|| ConfigError::NoWatcher {
                handler: handler.to_string(),
            })
    }

    /// Every internal-event route: `logdog.events`, then `handlers.logdog.events`.
    pub fn internal_routes(&self) -> impl Iterator<Item = (&str, &EventActions)> + '_ {
        self.logdog
            .events
            .iter()
            .chain(self.internal.iter().flat_map(|routing| routing.events.iter()))
    }

    /// Event-specific action list, else the default list, else `None`.
    ///
    /// Events on the internal identity are routed through `logdog.events`,
    /// then `handlers.logdog.events`.
    pub fn resolve_actions(&self, handler: &str, event: &str) -> Option<&[String]> {
        let specific = if handler == INTERNAL_IDENTITY {
            self.internal_routes()
                .filter(|(name, _)| *name == event)
                .find_map(|(_, routing)| routing.actions.as_deref())
        } else {
            self.handlers
                .get(handler)
                .and_then(|h| h.events.get(event))
                .and_then(|rule| rule.actions.as_deref())
        };
        specific.or_else(|| self.default_actions())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
