//! Built-in actions driving real subprocesses.
#![cfg(unix)]

use std::fs;
use std::path::Path;

use logdog_actions::{ActionError, ActionInput, ActionRegistry};
use logdog_core::{config, Config};
use logdog_template::{Expander, FixedHostname};
use tempfile::TempDir;

fn registry() -> ActionRegistry {
    ActionRegistry::builtin(Expander::with_resolver(FixedHostname::new("box")).expect("expander"))
}

fn load(yaml: &str) -> Config {
    config::from_str(yaml).expect("config")
}

fn capture_command(out: &Path) -> String {
    format!("[\"sh\", \"-c\", \"cat > '{}'\"]", out.display())
}

// ---------------------------------------------------------------------------
// mail
// ---------------------------------------------------------------------------

#[test]
fn mail_pipes_message_to_command() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("mail.eml");
    let config = load(&format!(
        "actions:\n  mail:\n    from: logdog@$HOSTNAME\n    to: [ops@example.com]\n    subject: \"$BRIEF_INFORMATION\"\n    message: \"$STDOUT\"\n    command: {}\n",
        capture_command(&out)
    ));

    registry()
        .invoke("mail", &config, &ActionInput::new("", "disk full", "ERROR: x"))
        .expect("mail");

    let message = fs::read_to_string(&out).expect("read");
    assert!(message.contains("From: logdog@box\r\n"));
    assert!(message.contains("To: ops@example.com\r\n"));
    assert!(message.contains("Subject: disk full\r\n"));
    assert!(message.ends_with("\r\n\r\nERROR: x\r\n"));
}

#[test]
fn mail_non_zero_exit_is_command_failed() {
    let config = load(
        "actions:\n  mail:\n    from: a@b\n    to: c@d\n    command: [\"sh\", \"-c\", \"cat > /dev/null; exit 3\"]\n",
    );
    let err = registry()
        .invoke("mail", &config, &ActionInput::default())
        .unwrap_err();
    assert!(matches!(err, ActionError::CommandFailed { .. }), "got: {err}");
}

#[test]
fn mail_missing_program_is_spawn_error() {
    let config = load(
        "actions:\n  mail:\n    from: a@b\n    to: c@d\n    command: [\"/nonexistent/logdog-sendmail\"]\n",
    );
    let err = registry()
        .invoke("mail", &config, &ActionInput::default())
        .unwrap_err();
    assert!(matches!(err, ActionError::Spawn { .. }), "got: {err}");
}

#[test]
fn log2mail_reads_its_own_block() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("log2mail.eml");
    // `config` (an SMTP credentials file) is accepted and ignored.
    let config = load(&format!(
        "{{\"actions\": {{\"log2mail\": {{\"config\": \"/etc/log2mail.json\", \"from\": \"logdog@$HOSTNAME\", \"to\": \"root@localhost\", \"subject\": \"$BRIEF_INFORMATION\", \"message\": \"$DETAILED_INFORMATION\", \"command\": {}}}}}}}",
        capture_command(&out)
    ));

    registry()
        .invoke("log2mail", &config, &ActionInput::new("details", "Logdog exited", ""))
        .expect("log2mail");

    let message = fs::read_to_string(&out).expect("read");
    assert!(message.contains("To: root@localhost\r\n"));
    assert!(message.contains("Subject: Logdog exited\r\n"));
    assert!(message.ends_with("\r\n\r\ndetails\r\n"));
}

/// Zombie children of this process whose command name is `comm`.
#[cfg(target_os = "linux")]
fn zombie_children(comm: &str) -> usize {
    let me = std::process::id().to_string();
    fs::read_dir("/proc")
        .into_iter()
        .flatten()
        .flatten()
        .filter_map(|entry| fs::read_to_string(entry.path().join("stat")).ok())
        .filter(|stat| {
            let Some((head, tail)) = stat.rsplit_once(')') else {
                return false;
            };
            let name = head.split_once('(').map(|(_, name)| name);
            let fields: Vec<&str> = tail.split_whitespace().collect();
            name == Some(comm) && fields.first() == Some(&"Z") && fields.get(1) == Some(&me.as_str())
        })
        .count()
}

#[cfg(target_os = "linux")]
#[test]
fn mail_command_that_ignores_input_is_reaped() {
    let config = load(
        "actions:\n  mail:\n    from: a@b\n    to: c@d\n    message: \"$STDOUT\"\n    command: [\"true\"]\n",
    );
    // Larger than any pipe buffer, so the write cannot complete.
    let body = "x".repeat(1 << 20);
    let input = ActionInput::new("", "", &body);

    for _ in 0..3 {
        let err = registry().invoke("mail", &config, &input).unwrap_err();
        assert!(matches!(err, ActionError::Pipe { .. }), "got: {err}");
    }
    assert_eq!(zombie_children("true"), 0);
}

// ---------------------------------------------------------------------------
// notify
// ---------------------------------------------------------------------------

#[test]
fn notify_passes_urgency_summary_and_body() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("notify.txt");
    let script = format!("printf '%s|%s|%s' \\\"$2\\\" \\\"$3\\\" \\\"$4\\\" > '{}'", out.display());
    let config = load(&format!(
        "actions:\n  notify:\n    urgency: low\n    command: [\"sh\", \"-c\", \"{script}\", \"sh\"]\n"
    ));

    registry()
        .invoke("notify", &config, &ActionInput::new("detail", "brief", ""))
        .expect("notify");

    assert_eq!(fs::read_to_string(&out).expect("read"), "low|brief|detail");
}

// ---------------------------------------------------------------------------
// file
// ---------------------------------------------------------------------------

#[test]
fn file_appends_once_per_invocation() {
    let dir = TempDir::new().expect("tempdir");
    let out = dir.path().join("out.txt");
    let config = load(&format!(
        "actions:\n  file:\n    path: '{}'\n    format: \"$STDOUT\\n\"\n",
        out.display()
    ));
    let input = ActionInput::new("", "", "a\n\nERROR: x\n\nb");

    registry().invoke("file", &config, &input).expect("file");
    assert_eq!(fs::read_to_string(&out).expect("read"), "a\n\nERROR: x\n\nb\n");
}
