//! Domain types shared by every logdog crate.
//!
//! [`NamedTable`] keeps configuration tables in document order, which is what
//! gives handlers and event rules a well-defined evaluation order.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Identity used for every event the daemon synthesizes about itself.
pub const INTERNAL_IDENTITY: &str = "logdog";

// ---------------------------------------------------------------------------
// NamedTable
// ---------------------------------------------------------------------------

/// An order-preserving `name → value` table.
///
/// Deserializes from a mapping and keeps the entries in the order they appear
/// in the document. Duplicate keys keep the last value at the first position.
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTable<T> {
    entries: Vec<(String, T)>,
}

impl<T> NamedTable<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Insert or replace `name`, keeping the original position on replace.
    pub fn insert(&mut self, name: impl Into<String>, value: T) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T> Default for NamedTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S: Into<String>> FromIterator<(S, T)> for NamedTable<T> {
    fn from_iter<I: IntoIterator<Item = (S, T)>>(iter: I) -> Self {
        let mut table = Self::new();
        for (name, value) in iter {
            table.insert(name, value);
        }
        table
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for NamedTable<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TableVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for TableVisitor<T> {
            type Value = NamedTable<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of names to entries")
            }

            fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
                Ok(NamedTable::new())
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut table = NamedTable::new();
                while let Some((name, value)) = map.next_entry::<String, T>()? {
                    table.insert(name, value);
                }
                Ok(table)
            }
        }

        deserializer.deserialize_map(TableVisitor(PhantomData))
    }
}

impl<T: Serialize> Serialize for NamedTable<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events the daemon raises about its own operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InternalEvent {
    WatcherStarted,
    NoHandler,
    ActionFailed,
    WorkerDied,
    HandleExit,
    Exception,
    NoExitNotify,
}

impl InternalEvent {
    pub fn all() -> &'static [InternalEvent] {
        &[
            InternalEvent::WatcherStarted,
            InternalEvent::NoHandler,
            InternalEvent::ActionFailed,
            InternalEvent::WorkerDied,
            InternalEvent::HandleExit,
            InternalEvent::Exception,
            InternalEvent::NoExitNotify,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InternalEvent::WatcherStarted => "watcher_started",
            InternalEvent::NoHandler => "no_handler",
            InternalEvent::ActionFailed => "action_failed",
            InternalEvent::WorkerDied => "worker_died",
            InternalEvent::HandleExit => "handle_exit",
            InternalEvent::Exception => "exception",
            InternalEvent::NoExitNotify => "no_exit_notify",
        }
    }
}

impl fmt::Display for InternalEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A detected match or internal condition, consumed once by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub handler: String,
    pub name: String,
    pub brief_information: String,
    pub detailed_information: String,
    pub stdout: String,
}

impl Event {
    pub fn new(handler: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            name: name.into(),
            brief_information: String::new(),
            detailed_information: String::new(),
            stdout: String::new(),
        }
    }

    /// An event on the daemon's own identity.
    pub fn internal(
        kind: InternalEvent,
        brief_information: impl Into<String>,
        detailed_information: impl Into<String>,
    ) -> Self {
        Self {
            brief_information: brief_information.into(),
            detailed_information: detailed_information.into(),
            ..Self::new(INTERNAL_IDENTITY, kind.as_str())
        }
    }

    pub fn with_brief(mut self, brief: impl Into<String>) -> Self {
        self.brief_information = brief.into();
        self
    }

    pub fn with_detailed(mut self, detailed: impl Into<String>) -> Self {
        self.detailed_information = detailed.into();
        self
    }

    pub fn with_stdout(mut self, stdout: impl Into<String>) -> Self {
        self.stdout = stdout.into();
        self
    }

    pub fn is_internal(&self) -> bool {
        self.handler == INTERNAL_IDENTITY
    }

    /// `true` when this is the internal event `kind`.
    pub fn is(&self, kind: InternalEvent) -> bool {
        self.is_internal() && self.name == kind.as_str()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.handler, self.name)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
