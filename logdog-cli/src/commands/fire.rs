//! `logdog fire`: push one event through dispatch, as a watcher match would.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use logdog_actions::ActionRegistry;
use logdog_core::{config, Event, INTERNAL_IDENTITY};
use logdog_daemon::{init_tracing, DispatchSummary, Dispatcher};

/// Arguments for `logdog fire`.
#[derive(Args, Debug)]
pub struct FireArgs {
    /// Path to the YAML (or JSON) configuration file.
    pub config: PathBuf,

    /// Event name.
    #[arg(long)]
    pub event: String,

    /// Handler the event belongs to.
    #[arg(long, default_value = INTERNAL_IDENTITY)]
    pub handler: String,

    #[arg(long, default_value = "")]
    pub brief: String,

    #[arg(long, default_value = "")]
    pub detailed: String,

    /// Captured output handed to the actions as `$STDOUT`.
    #[arg(long, default_value = "")]
    pub stdout: String,

    /// Emit the dispatch summary as JSON.
    #[arg(long)]
    pub json: bool,
}

impl FireArgs {
    pub fn run(self) -> Result<()> {
        let config = config::load(&self.config)
            .with_context(|| format!("failed to load '{}'", self.config.display()))?;
        init_tracing(config.logdog.debug);
        let registry = ActionRegistry::discover().context("failed to discover actions")?;
        let dispatcher = Dispatcher::new(Arc::new(config), Arc::new(registry));

        let event = Event::new(&self.handler, &self.event)
            .with_brief(self.brief)
            .with_detailed(self.detailed)
            .with_stdout(self.stdout);
        let summary = dispatcher.dispatch(&event);

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .context("failed to serialize dispatch summary")?
            );
        } else {
            print_summary(&event, &summary);
        }
        Ok(())
    }
}

fn print_summary(event: &Event, summary: &DispatchSummary) {
    let failed = if summary.failed > 0 {
        summary.failed.to_string().red().bold().to_string()
    } else {
        summary.failed.to_string()
    };
    println!(
        "{} {} | dispatched {} | invoked {} | failed {} | skipped {} | unresolved {}",
        "fired".bold(),
        event,
        summary.dispatched,
        summary.invoked,
        failed,
        summary.skipped,
        summary.unresolved,
    );
}
