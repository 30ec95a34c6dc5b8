use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};

use logdog_actions::ActionRegistry;
use logdog_core::{config, Config, Event, InternalEvent};

use crate::dispatch::Dispatcher;
use crate::error::{io_err, join_err, DaemonError};
use crate::monitor::{self, Fleet, MONITOR_INTERVAL};
use crate::signals::TerminationSignals;
use crate::supervisor::Supervisor;

/// Time given to supervisors to kill their watchers during teardown.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Timing knobs for [`run_until`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeOptions {
    pub monitor_interval: Duration,
    pub shutdown_grace: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            monitor_interval: MONITOR_INTERVAL,
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

/// Load `config_path`, discover actions, and run the daemon on a new runtime
/// until a termination signal arrives.
pub fn start_blocking(config_path: &Path) -> Result<(), DaemonError> {
    let config = config::load(config_path)?;
    init_tracing(config.logdog.debug);
    let registry = ActionRegistry::discover()?;
    tracing::info!(
        config = %config_path.display(),
        handlers = config.handlers.len(),
        actions = ?registry.names(),
        "configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run(config, registry))
}

/// Run the daemon until SIGINT, SIGTERM or SIGHUP.
pub async fn run(config: Config, registry: ActionRegistry) -> Result<(), DaemonError> {
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(config), Arc::new(registry)));

    let signals = match TerminationSignals::install() {
        Ok(signals) => Some(signals),
        Err(e) => {
            tracing::warn!(error = %e, "cannot register termination signals");
            let warning = Event::internal(
                InternalEvent::NoExitNotify,
                "Logdog: warning - maybe no exit notify",
                format!("Termination signal handlers could not be registered: {e}"),
            );
            dispatcher.dispatch_async(warning).await?;
            None
        }
    };

    let stop = async move {
        let name = match signals {
            Some(mut signals) => signals.recv().await,
            None => match tokio::signal::ctrl_c().await {
                Ok(()) => "ctrl-c",
                Err(_) => std::future::pending().await,
            },
        };
        tracing::info!(signal = name, "termination requested");
    };
    run_until(dispatcher, RuntimeOptions::default(), stop).await
}

/// Start one supervisor per handler plus the fleet monitor, and tear
/// everything down once `stop` completes.
///
/// Teardown order: stop the monitor, dispatch `logdog:handle_exit`, signal
/// every supervisor to kill its watcher, wait for them up to the grace period.
pub async fn run_until<F>(
    dispatcher: Arc<Dispatcher>,
    options: RuntimeOptions,
    stop: F,
) -> Result<(), DaemonError>
where
    F: Future<Output = ()>,
{
    let (shutdown_tx, _) = broadcast::channel::<()>(16);
    let (monitor_stop_tx, _) = broadcast::channel::<()>(1);

    let fleet = Arc::new(Mutex::new(spawn_supervisors(&dispatcher, &shutdown_tx)));
    tracing::info!(workers = fleet.lock().await.len(), "handlers started");

    let mut monitor_handle = tokio::spawn(monitor::run(
        fleet.clone(),
        dispatcher.clone(),
        options.monitor_interval,
        monitor_stop_tx.subscribe(),
    ));

    let mut monitor_finished = false;
    tokio::select! {
        _ = stop => {}
        result = &mut monitor_handle => {
            monitor_finished = true;
            if let Err(e) = handle_join("fleet_monitor", result) {
                report_exception(&dispatcher, &e).await?;
            }
        }
    }

    let _ = monitor_stop_tx.send(());
    if !monitor_finished {
        if let Err(e) = handle_join("fleet_monitor", monitor_handle.await) {
            report_exception(&dispatcher, &e).await?;
        }
    }

    let exit = Event::internal(InternalEvent::HandleExit, "Logdog exited", "");
    dispatcher.dispatch_async(exit).await?;

    let _ = shutdown_tx.send(());
    fleet.lock().await.shutdown(options.shutdown_grace).await;
    tracing::info!("logdog stopped");
    Ok(())
}

fn spawn_supervisors(dispatcher: &Arc<Dispatcher>, shutdown_tx: &broadcast::Sender<()>) -> Fleet {
    let mut fleet = Fleet::new();
    for name in dispatcher.config().handler_names() {
        let dispatcher = dispatcher.clone();
        let shutdown = shutdown_tx.subscribe();
        let handler = name.to_string();
        let handle = tokio::spawn(async move {
            let result = match Supervisor::new(&handler, dispatcher) {
                Ok(supervisor) => supervisor.run(shutdown).await,
                Err(e) => Err(e),
            };
            if let Err(e) = &result {
                tracing::error!(handler = %handler, error = %e, "handler stopped with an error");
            }
            result
        });
        fleet.track(name, handle);
    }
    fleet
}

async fn report_exception(dispatcher: &Arc<Dispatcher>, error: &DaemonError) -> Result<(), DaemonError> {
    tracing::error!(error = %error, "fleet monitor failed");
    let event = Event::internal(
        InternalEvent::Exception,
        "Logdog: an error occurred",
        error.to_string(),
    );
    dispatcher.dispatch_async(event).await.map(|_| ())
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, tokio::task::JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(join_err(task, err)),
    }
}

/// Install the global subscriber. `RUST_LOG` wins; otherwise `debug` when
/// the configuration asks for it, else `info`.
pub fn init_tracing(debug: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
