//! `mail` action: compose a message and hand it to the local MTA.
//!
//! The message is written to the stdin of `command` (default
//! `sendmail -t -oi`), which reads the recipients from the headers.

use std::io::Write;
use std::process::{Command, Stdio};

use chrono::Local;
use serde::Deserialize;

use logdog_core::Config;
use logdog_template::Expander;

use crate::error::{spawn_err, ActionError};
use crate::registry::{Action, ActionInput};

const DEFAULT_COMMAND: [&str; 3] = ["sendmail", "-t", "-oi"];

/// Alternate name of the mail action, configured under `actions.log2mail`.
pub const LOG2MAIL: &str = "log2mail";

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Recipients {
    One(String),
    Many(Vec<String>),
}

impl Recipients {
    fn as_slice(&self) -> &[String] {
        match self {
            Recipients::One(addr) => std::slice::from_ref(addr),
            Recipients::Many(list) => list,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MailSettings {
    from: String,
    to: Recipients,
    #[serde(default)]
    subject: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    command: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct MailAction {
    name: &'static str,
    expander: Expander,
}

impl MailAction {
    pub fn new(expander: Expander) -> Self {
        Self::named("mail", expander)
    }

    /// The same action registered as `name`, reading `actions.<name>`.
    pub fn named(name: &'static str, expander: Expander) -> Self {
        Self { name, expander }
    }

    fn compose(&self, settings: &MailSettings, input: &ActionInput<'_>) -> String {
        let header = |template: &str| single_line(&input.expand(&self.expander, template));
        let to: Vec<String> = settings.to.as_slice().iter().map(|t| header(t)).collect();

        let mut message = String::new();
        message.push_str(&format!("From: {}\r\n", header(&settings.from)));
        message.push_str(&format!("To: {}\r\n", to.join(", ")));
        message.push_str(&format!("Subject: {}\r\n", header(&settings.subject)));
        message.push_str(&format!("Date: {}\r\n", Local::now().to_rfc2822()));
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n");
        message.push_str("\r\n");
        message.push_str(&input.expand(&self.expander, &settings.message));
        message.push_str("\r\n");
        message
    }
}

/// Header values must not carry line breaks.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

impl Action for MailAction {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self, config: &Config, input: &ActionInput<'_>) -> Result<(), ActionError> {
        let settings: MailSettings = config.action_settings(self.name())?;
        if settings.to.as_slice().is_empty() {
            return Err(ActionError::InvalidSettings {
                action: self.name().to_string(),
                reason: "'to' lists no recipients".to_string(),
            });
        }
        let command = settings
            .command
            .clone()
            .unwrap_or_else(|| DEFAULT_COMMAND.iter().map(|s| s.to_string()).collect());
        let (program, args) = command.split_first().ok_or_else(|| ActionError::InvalidSettings {
            action: self.name().to_string(),
            reason: "'command' is empty".to_string(),
        })?;

        let message = self.compose(&settings, input);
        tracing::debug!(program = %program, "sending mail");

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| spawn_err(&command, e))?;
        // stdin is closed before waiting; the child is reaped even when the
        // write fails.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(message.as_bytes()),
            None => Ok(()),
        };
        let status = child.wait().map_err(|e| spawn_err(&command, e))?;
        if !status.success() {
            return Err(ActionError::CommandFailed {
                command: command.join(" "),
                status,
            });
        }
        written.map_err(|source| ActionError::Pipe {
            command: command.join(" "),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdog_template::FixedHostname;

    fn action() -> MailAction {
        MailAction::new(Expander::with_resolver(FixedHostname::new("box")).unwrap())
    }

    #[test]
    fn compose_expands_headers_and_body() {
        let settings = MailSettings {
            from: "logdog@$HOSTNAME".to_string(),
            to: Recipients::Many(vec!["a@x".to_string(), "b@x".to_string()]),
            subject: "[$HOSTNAME] $BRIEF_INFORMATION".to_string(),
            message: "$DETAILED_INFORMATION".to_string(),
            command: None,
        };
        let input = ActionInput::new("line one\n$STDOUT", "disk\nfull", "ERROR");
        let message = action().compose(&settings, &input);

        assert!(message.starts_with("From: logdog@box\r\nTo: a@x, b@x\r\n"));
        assert!(message.contains("Subject: [box] disk full\r\n"));
        assert!(message.contains("\r\nDate: "));
        assert!(message.ends_with("\r\n\r\nline one\nERROR\r\n"));
    }

    #[test]
    fn single_recipient_string_is_accepted() {
        let settings: MailSettings =
            serde_yaml::from_str("from: a\nto: root@localhost\n").unwrap();
        assert_eq!(settings.to.as_slice(), ["root@localhost"]);
        assert!(settings.command.is_none());
    }
}
