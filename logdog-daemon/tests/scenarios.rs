//! End-to-end runs of the daemon against real watcher processes.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use logdog_actions::ActionRegistry;
use logdog_core::config;
use logdog_daemon::{run_until, Dispatcher, RuntimeOptions};
use logdog_template::{Expander, FixedHostname};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dispatcher(yaml: &str) -> Arc<Dispatcher> {
    let config = config::from_str(yaml).expect("config");
    let registry = ActionRegistry::builtin(
        Expander::with_resolver(FixedHostname::new("test-host")).expect("expander"),
    );
    Arc::new(Dispatcher::new(Arc::new(config), Arc::new(registry)))
}

fn fast() -> RuntimeOptions {
    RuntimeOptions {
        monitor_interval: Duration::from_millis(50),
        shutdown_grace: Duration::from_secs(2),
    }
}

/// Resolves once `path` holds at least `len` bytes, or after `limit`.
async fn wait_for_len(path: PathBuf, len: usize, limit: Duration) {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if fs::metadata(&path).map(|m| m.len() as usize >= len).unwrap_or(false) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn match_with_context_appends_once() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.txt");
    let yaml = format!(
        r#"
logdog:
  default_actions: []
watchers:
  feed:
    command: ['sh', '-c', 'printf "a\nERROR: x\nb\n"; exec sleep 5']
handlers:
  app:
    file: /tmp/a.log
    watcher: feed
    events:
      error:
        regexp: ERROR
        prev_lines: 1
        next_lines: 1
        actions: [file]
actions:
  file:
    path: '{}'
    format: "$STDOUT"
"#,
        out.display()
    );
    let expected = "a\n\nERROR: x\n\nb";

    let stop = wait_for_len(out.clone(), expected.len(), Duration::from_secs(5));
    run_until(dispatcher(&yaml), fast(), stop).await.expect("run");

    assert_eq!(read(&out), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn every_matching_rule_fires_for_one_line() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.txt");
    let yaml = format!(
        r#"
logdog:
  default_actions: [file]
  events:
    watcher_started: {{ actions: [] }}
    handle_exit: {{ actions: [] }}
    worker_died: {{ actions: [] }}
watchers:
  echo:
    command: ['sh', '-c', 'echo "Disk full"; exec sleep 5']
handlers:
  app:
    file: /var/log/app.log
    watcher: echo
    events:
      disk:
        regexp: disk
        brief_information: disk
      full:
        regexp: FULL
        brief_information: full
      quiet:
        regexp: disk
        active: false
        brief_information: quiet
actions:
  file:
    path: '{}'
    format: "$BRIEF_INFORMATION;"
"#,
        out.display()
    );

    let stop = wait_for_len(out.clone(), "disk;full;".len(), Duration::from_secs(5));
    run_until(dispatcher(&yaml), fast(), stop).await.expect("run");

    assert_eq!(read(&out), "disk;full;");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn exited_watcher_reported_once_as_worker_died() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("died.txt");
    let yaml = format!(
        r#"
logdog:
  default_actions: []
  default_watcher:
    command: ['true']
  events:
    worker_died: {{ actions: [file] }}
handlers:
  quick:
    file: /var/log/quick.log
actions:
  file:
    path: '{}'
    format: "$DETAILED_INFORMATION|"
"#,
        out.display()
    );
    let expected = "Worker: quick died\nwatcher exited|";

    // Several monitor intervals pass after the first report.
    let stop = async {
        wait_for_len(out.clone(), expected.len(), Duration::from_secs(5)).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
    };
    run_until(dispatcher(&yaml), fast(), stop).await.expect("run");

    assert_eq!(read(&out), expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn handler_without_watcher_dies_without_stopping_others() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("events.txt");
    let yaml = format!(
        r#"
logdog:
  default_actions: []
  events:
    worker_died: {{ actions: [file] }}
watchers:
  live:
    command: ['sh', '-c', 'exec sleep 5']
handlers:
  orphan:
    file: /nowhere
    watcher: missing
  alive:
    file: /somewhere
    watcher: live
actions:
  file:
    path: '{}'
    format: "$BRIEF_INFORMATION: $DETAILED_INFORMATION\n"
"#,
        out.display()
    );

    let stop = async {
        wait_for_len(out.clone(), 1, Duration::from_secs(5)).await;
        tokio::time::sleep(Duration::from_millis(300)).await;
    };
    run_until(dispatcher(&yaml), fast(), stop).await.expect("run");

    let written = read(&out);
    assert!(written.starts_with("Logdog: worker died: Worker: orphan died\n"), "got: {written}");
    assert!(written.contains("no watcher for handler 'orphan'"), "got: {written}");
    assert!(!written.contains("alive"), "got: {written}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn teardown_dispatches_handle_exit() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("exit.txt");
    let yaml = format!(
        r#"
logdog:
  events:
    handle_exit: {{ actions: [file] }}
    watcher_started: {{ actions: [file] }}
  default_watcher:
    command: ['sh', '-c', 'exec sleep 5']
    cwd: /
handlers:
  svc:
    file: /var/log/svc.log
actions:
  file:
    path: '{}'
    format: "$BRIEF_INFORMATION\n"
"#,
        out.display()
    );

    let stop = wait_for_len(out.clone(), 1, Duration::from_secs(5));
    let started = std::time::Instant::now();
    run_until(dispatcher(&yaml), fast(), stop).await.expect("run");

    assert_eq!(
        read(&out),
        "Watcher svc:sh started successfully\nLogdog exited\n"
    );
    // The sleeping watcher was killed rather than waited for.
    assert!(started.elapsed() < Duration::from_secs(4));
}
