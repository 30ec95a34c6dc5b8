//! [`Action`] trait and the name → implementation table.

use std::collections::BTreeMap;
use std::sync::Arc;

use logdog_core::{Config, Event};
use logdog_template::Expander;

use crate::error::ActionError;
use crate::file::FileAction;
use crate::mail::{MailAction, LOG2MAIL};
use crate::notify::NotifyAction;

/// The three strings every action receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionInput<'a> {
    pub detailed_information: &'a str,
    pub brief_information: &'a str,
    pub stdout: &'a str,
}

impl<'a> ActionInput<'a> {
    pub fn new(detailed_information: &'a str, brief_information: &'a str, stdout: &'a str) -> Self {
        Self {
            detailed_information,
            brief_information,
            stdout,
        }
    }

    /// Expand `template` against this input.
    pub fn expand(&self, expander: &Expander, template: &str) -> String {
        expander.expand(
            template,
            self.detailed_information,
            self.brief_information,
            self.stdout,
        )
    }
}

impl<'a> From<&'a Event> for ActionInput<'a> {
    fn from(event: &'a Event) -> Self {
        Self::new(
            &event.detailed_information,
            &event.brief_information,
            &event.stdout,
        )
    }
}

/// A named side effect run in response to an event.
///
/// Implementations are invoked one at a time under the dispatcher's output
/// lock and may block.
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether `run` fails without an `actions.<name>` block.
    fn requires_settings(&self) -> bool {
        true
    }

    fn run(&self, config: &Config, input: &ActionInput<'_>) -> Result<(), ActionError>;
}

/// Fixed set of invocable actions, keyed by name. Read-only once built.
#[derive(Default, Clone)]
pub struct ActionRegistry {
    actions: BTreeMap<&'static str, Arc<dyn Action>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in actions, expanding `$HOSTNAME` through `hostname -f`.
    pub fn discover() -> Result<Self, ActionError> {
        Ok(Self::builtin(Expander::new()?))
    }

    /// The built-in actions sharing `expander`.
    ///
    /// `log2mail` is `mail` reading its own `actions.log2mail` block.
    pub fn builtin(expander: Expander) -> Self {
        let mut registry = Self::new();
        registry.register(FileAction::new(expander.clone()));
        registry.register(MailAction::new(expander.clone()));
        registry.register(MailAction::named(LOG2MAIL, expander.clone()));
        registry.register(NotifyAction::new(expander));
        registry
    }

    /// Add `action`, replacing any action of the same name.
    pub fn register(&mut self, action: impl Action + 'static) {
        self.actions.insert(action.name(), Arc::new(action));
    }

    pub fn exists(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    /// `None` for an unknown action.
    pub fn requires_settings(&self, name: &str) -> Option<bool> {
        self.actions.get(name).map(|action| action.requires_settings())
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run the action called `name`.
    pub fn invoke(
        &self,
        name: &str,
        config: &Config,
        input: &ActionInput<'_>,
    ) -> Result<(), ActionError> {
        let action = self
            .actions
            .get(name)
            .ok_or_else(|| ActionError::NotFound(name.to_string()))?;
        tracing::debug!(action = name, "running action");
        action.run(config, input)
    }
}
