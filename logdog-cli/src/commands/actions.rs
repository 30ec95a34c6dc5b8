//! `logdog actions`: list the registered actions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tabled::{settings::Style, Table, Tabled};

use logdog_actions::ActionRegistry;
use logdog_core::config;

/// Arguments for `logdog actions`.
#[derive(Args, Debug)]
pub struct ActionsArgs {
    /// Also report whether each action has a configuration block.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Tabled)]
struct ActionRow {
    #[tabled(rename = "action")]
    name: String,
    #[tabled(rename = "configured")]
    configured: String,
}

impl ActionsArgs {
    pub fn run(self) -> Result<()> {
        let registry = ActionRegistry::discover().context("failed to discover actions")?;
        let config = match &self.config {
            Some(path) => Some(
                config::load(path)
                    .with_context(|| format!("failed to load '{}'", path.display()))?,
            ),
            None => None,
        };

        let rows: Vec<ActionRow> = registry
            .names()
            .into_iter()
            .map(|name| ActionRow {
                name: name.to_string(),
                configured: match &config {
                    Some(config) if config.actions.contains_key(name) => "yes".to_string(),
                    Some(_) => "no".to_string(),
                    None => "-".to_string(),
                },
            })
            .collect();

        let mut table = Table::new(rows);
        table.with(Style::rounded());
        println!("{table}");
        Ok(())
    }
}
