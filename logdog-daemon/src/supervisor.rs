//! Handler supervisor: one watcher subprocess per handler, read line by line
//! and matched against the handler's event rules.

use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::broadcast;

use logdog_core::{Event, InternalEvent};

use crate::dispatch::Dispatcher;
use crate::error::DaemonError;
use crate::history::HistoryWindow;

/// How a supervisor's loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorExit {
    /// The watcher process exited or closed its output.
    Exited,
    /// The daemon shut the watcher down.
    Killed,
}

impl fmt::Display for SupervisorExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SupervisorExit::Exited => f.write_str("watcher exited"),
            SupervisorExit::Killed => f.write_str("watcher killed"),
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    name: String,
    pattern: Regex,
    prev_lines: usize,
    next_lines: usize,
    brief_information: String,
    detailed_information: String,
}

/// A running watcher subprocess and its buffered stdout.
struct WatcherProcess {
    handler: String,
    child: Child,
    stdout: BufReader<ChildStdout>,
}

impl WatcherProcess {
    fn spawn(handler: &str, argv: &[String], cwd: &Path) -> Result<Self, DaemonError> {
        let (program, args) = argv.split_first().ok_or_else(|| DaemonError::EmptyCommand {
            handler: handler.to_string(),
        })?;
        let spawn_err = |source: std::io::Error| DaemonError::Spawn {
            handler: handler.to_string(),
            command: argv.join(" "),
            source,
        };
        let mut child = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_err)?;
        let stdout = child.stdout.take().ok_or_else(|| {
            spawn_err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "watcher stdout not captured",
            ))
        })?;
        Ok(Self {
            handler: handler.to_string(),
            child,
            stdout: BufReader::new(stdout),
        })
    }

    fn is_alive(&mut self) -> bool {
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                tracing::debug!(handler = %self.handler, %status, "watcher has exited");
                false
            }
            Err(e) => {
                tracing::warn!(handler = %self.handler, error = %e, "cannot poll watcher");
                false
            }
        }
    }

    /// Next line without surrounding whitespace; `None` at end of output.
    async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        let mut buf = Vec::new();
        let read = self
            .stdout
            .read_until(b'\n', &mut buf)
            .await
            .map_err(|source| DaemonError::Read {
                handler: self.handler.clone(),
                source,
            })?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&buf).trim().to_string()))
    }

    async fn kill(&mut self) {
        if let Err(e) = self.child.kill().await {
            tracing::debug!(handler = %self.handler, error = %e, "watcher kill failed");
        }
    }
}

enum Read {
    Line(String),
    Eof,
    Shutdown,
}

/// Owns one handler's watcher for the life of the daemon.
pub struct Supervisor {
    handler: String,
    rules: Vec<CompiledRule>,
    max_before: usize,
    dispatcher: Arc<Dispatcher>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("handler", &self.handler)
            .field("rules", &self.rules.iter().map(|r| &r.name).collect::<Vec<_>>())
            .field("max_before", &self.max_before)
            .finish()
    }
}

impl Supervisor {
    /// Compile the active rules of `handler`, in configured order.
    pub fn new(handler: &str, dispatcher: Arc<Dispatcher>) -> Result<Self, DaemonError> {
        let handler_config = dispatcher.config().handler(handler)?;
        let mut rules = Vec::new();
        for (name, rule) in handler_config.events.iter().filter(|(_, r)| r.active) {
            let pattern = RegexBuilder::new(&rule.regexp)
                .case_insensitive(true)
                .build()
                .map_err(|source| DaemonError::Pattern {
                    handler: handler.to_string(),
                    event: name.to_string(),
                    source,
                })?;
            rules.push(CompiledRule {
                name: name.to_string(),
                pattern,
                prev_lines: rule.prev_lines,
                next_lines: rule.next_lines,
                brief_information: rule.brief_information.clone(),
                detailed_information: rule.detailed_information.clone(),
            });
        }
        let max_before = rules.iter().map(|r| r.prev_lines).max().unwrap_or(0);
        Ok(Self {
            handler: handler.to_string(),
            rules,
            max_before,
            dispatcher,
        })
    }

    /// Start the watcher and evaluate its output until it ends or `shutdown`
    /// fires. Events are dispatched in the order their lines are read.
    pub async fn run(
        self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<SupervisorExit, DaemonError> {
        let mut process = self.start().await?;
        let mut window = HistoryWindow::new(self.max_before);

        loop {
            if window.needs_line() {
                if !process.is_alive() {
                    return Ok(SupervisorExit::Exited);
                }
                match read(&mut process, &mut shutdown).await? {
                    Read::Line(line) => window.push(line),
                    Read::Eof => return Ok(SupervisorExit::Exited),
                    Read::Shutdown => return Ok(kill(&mut process).await),
                }
            }
            let Some(current) = window.current().map(str::to_string) else {
                continue;
            };

            for rule in &self.rules {
                if !rule.pattern.is_match(&current) {
                    continue;
                }
                if !process.is_alive() {
                    return Ok(SupervisorExit::Exited);
                }
                // Earlier rules may already have buffered some of these.
                let mut ended = false;
                while window.trailing() < rule.next_lines {
                    match read(&mut process, &mut shutdown).await? {
                        Read::Line(line) => window.push(line),
                        Read::Eof => {
                            ended = true;
                            break;
                        }
                        Read::Shutdown => return Ok(kill(&mut process).await),
                    }
                }

                tracing::info!("{} - {}: {}", self.handler, rule.name, current);
                let event = Event::new(&self.handler, &rule.name)
                    .with_brief(&rule.brief_information)
                    .with_detailed(&rule.detailed_information)
                    .with_stdout(window.context(rule.prev_lines, rule.next_lines));
                self.dispatcher.dispatch_async(event).await?;

                if ended {
                    return Ok(SupervisorExit::Exited);
                }
            }
            window.advance();
        }
    }

    async fn start(&self) -> Result<WatcherProcess, DaemonError> {
        let config = self.dispatcher.config();
        let handler_config = config.handler(&self.handler)?;
        let watcher = config.resolve_watcher(&self.handler)?;
        let argv = watcher.command_for(&handler_config.file)?;
        let cwd = watcher.working_dir();

        let process = WatcherProcess::spawn(&self.handler, &argv, &cwd)?;
        let program = argv.first().map(String::as_str).unwrap_or_default();
        tracing::info!(handler = %self.handler, command = %argv.join(" "), "watcher started");

        let started = Event::internal(
            InternalEvent::WatcherStarted,
            format!("Watcher {}:{} started successfully", self.handler, program),
            format!(
                "Watcher {} of handler {} started successfully\ncwd: {}",
                program,
                self.handler,
                cwd.display()
            ),
        );
        self.dispatcher.dispatch_async(started).await?;
        Ok(process)
    }
}

/// Read one line, giving up as soon as `shutdown` fires.
async fn read(
    process: &mut WatcherProcess,
    shutdown: &mut broadcast::Receiver<()>,
) -> Result<Read, DaemonError> {
    tokio::select! {
        biased;
        _ = shutdown.recv() => Ok(Read::Shutdown),
        line = process.next_line() => Ok(match line? {
            Some(line) => Read::Line(line),
            None => Read::Eof,
        }),
    }
}

async fn kill(process: &mut WatcherProcess) -> SupervisorExit {
    process.kill().await;
    SupervisorExit::Killed
}
