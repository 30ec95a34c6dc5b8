//! Fleet monitor: periodic liveness checks over every supervisor task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use logdog_core::{Event, InternalEvent};

use crate::dispatch::{panic_message, Dispatcher};
use crate::error::DaemonError;
use crate::supervisor::SupervisorExit;

/// Default period between liveness checks.
pub const MONITOR_INTERVAL: Duration = Duration::from_secs(1);

pub type WorkerResult = Result<SupervisorExit, DaemonError>;

#[derive(Debug)]
struct Worker {
    name: String,
    handle: JoinHandle<WorkerResult>,
}

/// Supervisor tasks still being tracked, by handler name.
#[derive(Debug, Default)]
pub struct Fleet {
    workers: Vec<Worker>,
}

impl Fleet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&mut self, name: impl Into<String>, handle: JoinHandle<WorkerResult>) {
        self.workers.push(Worker {
            name: name.into(),
            handle,
        });
    }

    pub fn names(&self) -> Vec<&str> {
        self.workers.iter().map(|w| w.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// Stop tracking every finished worker; returns `(name, reason)` pairs.
    pub async fn reap(&mut self) -> Vec<(String, String)> {
        let (finished, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.workers)
            .into_iter()
            .partition(|w| w.handle.is_finished());
        self.workers = running;

        let mut dead = Vec::with_capacity(finished.len());
        for worker in finished {
            dead.push((worker.name, describe(worker.handle.await)));
        }
        dead
    }

    /// Wait up to `grace` in total for every worker to finish; abort the rest.
    pub async fn shutdown(&mut self, grace: Duration) {
        let deadline = Instant::now() + grace;
        for worker in self.workers.drain(..) {
            let abort = worker.handle.abort_handle();
            match tokio::time::timeout_at(deadline, worker.handle).await {
                Ok(result) => {
                    tracing::debug!(worker = %worker.name, outcome = %describe(result), "worker stopped");
                }
                Err(_) => {
                    tracing::warn!(worker = %worker.name, "worker did not stop in time, aborting");
                    abort.abort();
                }
            }
        }
    }
}

fn describe(result: Result<WorkerResult, JoinError>) -> String {
    match result {
        Ok(Ok(exit)) => exit.to_string(),
        Ok(Err(e)) => e.to_string(),
        Err(e) if e.is_panic() => {
            format!("panicked: {}", panic_message(e.into_panic().as_ref()))
        }
        Err(e) => e.to_string(),
    }
}

/// Every `period`, report and forget supervisors that have ended. No restart
/// is attempted. Returns when `shutdown` fires.
pub async fn run(
    fleet: Arc<Mutex<Fleet>>,
    dispatcher: Arc<Dispatcher>,
    period: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), DaemonError> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = shutdown.recv() => break,
            _ = interval.tick() => {
                let dead = fleet.lock().await.reap().await;
                for (name, reason) in dead {
                    tracing::warn!(worker = %name, %reason, "worker died");
                    let event = Event::internal(
                        InternalEvent::WorkerDied,
                        "Logdog: worker died",
                        format!("Worker: {name} died\n{reason}"),
                    );
                    dispatcher.dispatch_async(event).await?;
                }
            }
        }
    }
    Ok(())
}
