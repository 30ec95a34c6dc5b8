//! `notify` action: desktop notification via `notify-send`.

use std::process::{Command, Stdio};

use serde::Deserialize;

use logdog_core::{Config, ConfigError};
use logdog_template::Expander;

use crate::error::{spawn_err, ActionError};
use crate::registry::{Action, ActionInput};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct NotifySettings {
    summary: String,
    body: String,
    urgency: String,
    command: Vec<String>,
}

impl Default for NotifySettings {
    fn default() -> Self {
        Self {
            summary: "$BRIEF_INFORMATION".to_string(),
            body: "$DETAILED_INFORMATION".to_string(),
            urgency: "normal".to_string(),
            command: vec!["notify-send".to_string()],
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotifyAction {
    expander: Expander,
}

impl NotifyAction {
    pub fn new(expander: Expander) -> Self {
        Self { expander }
    }

    /// Full argument vector: the configured command followed by
    /// `--urgency <level> <summary> <body>`.
    fn argv(&self, settings: &NotifySettings, input: &ActionInput<'_>) -> Vec<String> {
        let mut argv = settings.command.clone();
        argv.push("--urgency".to_string());
        argv.push(settings.urgency.clone());
        argv.push(input.expand(&self.expander, &settings.summary));
        argv.push(input.expand(&self.expander, &settings.body));
        argv
    }
}

impl Action for NotifyAction {
    fn name(&self) -> &'static str {
        "notify"
    }

    fn requires_settings(&self) -> bool {
        false
    }

    fn run(&self, config: &Config, input: &ActionInput<'_>) -> Result<(), ActionError> {
        // The block is optional for this action.
        let settings = match config.action_settings::<NotifySettings>(self.name()) {
            Ok(settings) => settings,
            Err(ConfigError::MissingKey(_)) => NotifySettings::default(),
            Err(e) => return Err(e.into()),
        };
        if settings.command.is_empty() {
            return Err(ActionError::InvalidSettings {
                action: self.name().to_string(),
                reason: "'command' is empty".to_string(),
            });
        }

        let argv = self.argv(&settings, input);
        let status = Command::new(&argv[0])
            .args(&argv[1..])
            .stdin(Stdio::null())
            .status()
            .map_err(|e| spawn_err(&settings.command, e))?;
        if !status.success() {
            return Err(ActionError::CommandFailed {
                command: settings.command.join(" "),
                status,
            });
        }
        Ok(())
    }
}
