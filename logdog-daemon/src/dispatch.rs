//! Event → action dispatch.
//!
//! Resolution order for `(handler, event)`:
//!
//! 1. the event's own action list (`logdog.events.<event>` for internal events)
//! 2. `logdog.default_actions`
//! 3. nothing: report, then dispatch `logdog:no_handler` describing the gap
//!
//! Every action runs under one process-wide output lock. A failing action is
//! reported as `logdog:action_failed` once the lock is released.
//!
//! Two sentinels stop the recursion: an unresolvable `logdog:no_handler` is
//! only reported, and a failure while handling `logdog:action_failed` is only
//! reported.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use logdog_actions::{ActionInput, ActionRegistry};
use logdog_core::{Config, Event, InternalEvent};

use crate::error::{join_err, DaemonError};

/// Counters for one top-level dispatch, including the internal events it
/// triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DispatchSummary {
    /// Events dispatched, the original one included.
    pub dispatched: usize,
    /// Action invocations attempted.
    pub invoked: usize,
    /// Invocations that returned an error or panicked.
    pub failed: usize,
    /// Configured action names with no registered implementation.
    pub skipped: usize,
    /// Events for which no action list could be resolved.
    pub unresolved: usize,
}

impl DispatchSummary {
    fn absorb(&mut self, other: DispatchSummary) {
        self.dispatched += other.dispatched;
        self.invoked += other.invoked;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.unresolved += other.unresolved;
    }
}

/// Shared handle through which every producer delivers events.
pub struct Dispatcher {
    config: Arc<Config>,
    registry: Arc<ActionRegistry>,
    output: Mutex<()>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(config: Arc<Config>, registry: Arc<ActionRegistry>) -> Self {
        Self {
            config,
            registry,
            output: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Run every action resolved for `event`. Blocks while actions run.
    pub fn dispatch(&self, event: &Event) -> DispatchSummary {
        let mut summary = DispatchSummary {
            dispatched: 1,
            ..DispatchSummary::default()
        };

        let Some(actions) = self.config.resolve_actions(&event.handler, &event.name) else {
            summary.unresolved += 1;
            tracing::error!(
                handler = %event.handler,
                event = %event.name,
                "No specific or default action for event {} of handler {}",
                event.name,
                event.handler
            );
            if !event.is(InternalEvent::NoHandler) {
                let gap = Event::internal(
                    InternalEvent::NoHandler,
                    format!("Logdog: {}:{} - no action", event.handler, event.name),
                    format!(
                        "No specific or default action for event {} of handler {}",
                        event.name, event.handler
                    ),
                );
                summary.absorb(self.dispatch(&gap));
            }
            return summary;
        };

        for name in actions {
            if !self.registry.exists(name) {
                summary.skipped += 1;
                tracing::debug!(action = %name, event = %event, "skipping unknown action");
                continue;
            }
            summary.invoked += 1;
            let Err(reason) = self.invoke_locked(name, event) else {
                continue;
            };
            summary.failed += 1;
            tracing::error!(action = %name, event = %event, error = %reason, "action failed");
            if event.is(InternalEvent::ActionFailed) {
                continue;
            }
            let failure = Event::internal(
                InternalEvent::ActionFailed,
                format!("Action {name} failed"),
                format!("Action {name} produced the following exception:\n{reason}"),
            );
            summary.absorb(self.dispatch(&failure));
        }

        tracing::debug!(event = %event, ?summary, "dispatch finished");
        summary
    }

    /// [`dispatch`](Self::dispatch) on the blocking pool.
    pub async fn dispatch_async(
        self: &Arc<Self>,
        event: Event,
    ) -> Result<DispatchSummary, DaemonError> {
        let dispatcher = Arc::clone(self);
        let task = format!("dispatch {event}");
        tokio::task::spawn_blocking(move || dispatcher.dispatch(&event))
            .await
            .map_err(|e| join_err(task, e))
    }

    /// Invoke one action while holding the output lock. The lock is released
    /// before this returns, whatever the outcome.
    fn invoke_locked(&self, name: &str, event: &Event) -> Result<(), String> {
        let _guard = self.output.lock().unwrap_or_else(PoisonError::into_inner);
        let input = ActionInput::from(event);
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            self.registry.invoke(name, &self.config, &input)
        }));
        match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e.to_string()),
            Err(payload) => Err(format!("panicked: {}", panic_message(payload.as_ref()))),
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
