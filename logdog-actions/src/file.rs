//! `file` action: append an expanded line to a file.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use serde::Deserialize;

use logdog_core::Config;
use logdog_template::Expander;

use crate::error::{io_err, ActionError};
use crate::registry::{Action, ActionInput};

#[derive(Debug, Clone, Deserialize)]
struct FileSettings {
    path: PathBuf,
    format: String,
}

#[derive(Debug, Clone)]
pub struct FileAction {
    expander: Expander,
}

impl FileAction {
    pub fn new(expander: Expander) -> Self {
        Self { expander }
    }
}

impl Action for FileAction {
    fn name(&self) -> &'static str {
        "file"
    }

    fn run(&self, config: &Config, input: &ActionInput<'_>) -> Result<(), ActionError> {
        let settings: FileSettings = config.action_settings(self.name())?;
        let text = input.expand(&self.expander, &settings.format);
        tracing::debug!(path = %settings.path.display(), "writing into file");

        if let Some(parent) = settings.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&settings.path)
            .map_err(|e| io_err(&settings.path, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| io_err(&settings.path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logdog_core::config;
    use logdog_template::FixedHostname;
    use tempfile::TempDir;

    fn action() -> FileAction {
        FileAction::new(Expander::with_resolver(FixedHostname::new("host")).unwrap())
    }

    fn config_for(path: &std::path::Path, format: &str) -> Config {
        let yaml = format!(
            "actions:\n  file:\n    path: {:?}\n    format: {:?}\n",
            path.display().to_string(),
            format
        );
        config::from_str(&yaml).unwrap()
    }

    #[test]
    fn appends_expanded_format() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("nested").join("out.txt");
        let config = config_for(&out, "$HOSTNAME $BRIEF_INFORMATION: $STDOUT\n");

        let input = ActionInput::new("", "disk", "ERROR x");
        action().run(&config, &input).unwrap();
        action().run(&config, &input).unwrap();

        let written = fs::read_to_string(&out).unwrap();
        assert_eq!(written, "host disk: ERROR x\nhost disk: ERROR x\n");
    }

    #[test]
    fn missing_settings_is_config_error() {
        let err = action()
            .run(&Config::default(), &ActionInput::default())
            .unwrap_err();
        assert!(matches!(err, ActionError::Config(_)), "got: {err}");
    }

    #[test]
    fn settings_without_format_are_rejected() {
        let config = config::from_str("actions:\n  file:\n    path: /tmp/x\n").unwrap();
        let err = action().run(&config, &ActionInput::default()).unwrap_err();
        assert!(err.to_string().contains("file"), "got: {err}");
    }
}
