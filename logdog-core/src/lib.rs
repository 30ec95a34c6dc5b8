//! logdog core library: configuration document, domain types, errors.
//!
//! - [`config`]: load / validate / lookups over the configuration document
//! - [`types`]: [`Event`], [`InternalEvent`], [`NamedTable`]
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    Config, DaemonSettings, EventActions, EventRuleConfig, HandlerConfig, InternalRouting,
    WatcherConfig,
};
pub use error::ConfigError;
pub use types::{Event, InternalEvent, NamedTable, INTERNAL_IDENTITY};
