//! # logdog-template
//!
//! Keyword substitution for operator-written message templates.
//!
//! Recognised keywords, bare (`$KEYWORD`) or braced (`${KEYWORD}`), matched
//! case-insensitively:
//!
//! | Keyword                 | Replaced with                                      |
//! |-------------------------|----------------------------------------------------|
//! | `HOSTNAME`              | fully-qualified host name (empty on lookup failure) |
//! | `DETAILED_INFORMATION`  | the event's detailed text, itself expanded          |
//! | `BRIEF_INFORMATION`     | the event's brief text, itself expanded             |
//! | `STDOUT`                | the captured watcher output, only when non-empty    |
//!
//! ```rust
//! use logdog_template::{Expander, FixedHostname};
//!
//! let expander = Expander::with_resolver(FixedHostname::new("box.example.com")).unwrap();
//! let out = expander.expand("[$HOSTNAME] ${brief_information}", "", "disk full", "");
//! assert_eq!(out, "[box.example.com] disk full");
//! ```

pub mod error;
pub mod expander;
pub mod hostname;

pub use error::TemplateError;
pub use expander::Expander;
pub use hostname::{FixedHostname, HostnameResolver, SystemHostname};
