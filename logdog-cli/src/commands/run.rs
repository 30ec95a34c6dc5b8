//! `logdog run`: the daemon in the foreground.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

/// Arguments for `logdog run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Path to the YAML (or JSON) configuration file.
    pub config: PathBuf,
}

impl RunArgs {
    pub fn run(self) -> Result<()> {
        logdog_daemon::start_blocking(&self.config).context("daemon exited with error")
    }
}
