//! # logdog-actions
//!
//! The [`Action`] capability trait, the name-keyed [`ActionRegistry`], and the
//! built-in actions:
//!
//! | Name     | Effect                                                   |
//! |----------|----------------------------------------------------------|
//! | `file`   | append an expanded `format` string to `path`              |
//! | `mail`   | pipe an RFC 5322 message to a local MTA (`sendmail -t`)   |
//! | `notify` | desktop notification through `notify-send`                |
//!
//! Every action reads its own block from the `actions` table of the
//! configuration and expands its templates against the event it receives.

pub mod error;
pub mod file;
pub mod mail;
pub mod notify;
pub mod registry;

pub use error::ActionError;
pub use registry::{Action, ActionInput, ActionRegistry};
