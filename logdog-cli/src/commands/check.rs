//! `logdog check`: validate a configuration without starting anything.
//!
//! Problems are fatal (non-zero exit); warnings are printed only.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use logdog_actions::ActionRegistry;
use logdog_core::{config, Config, InternalEvent};
use logdog_daemon::{Dispatcher, Supervisor};

/// Arguments for `logdog check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Path to the YAML (or JSON) configuration file.
    pub config: PathBuf,
}

#[derive(Tabled)]
struct HandlerRow {
    #[tabled(rename = "handler")]
    handler: String,
    #[tabled(rename = "watcher")]
    watcher: String,
    #[tabled(rename = "active rules")]
    rules: usize,
    #[tabled(rename = "status")]
    status: String,
}

#[derive(Debug, Default)]
struct Findings {
    problems: Vec<String>,
    warnings: Vec<String>,
}

impl CheckArgs {
    pub fn run(self) -> Result<()> {
        let config = config::load(&self.config)
            .with_context(|| format!("failed to load '{}'", self.config.display()))?;
        let registry = ActionRegistry::discover().context("failed to discover actions")?;
        let config = Arc::new(config);
        let dispatcher = Arc::new(Dispatcher::new(config.clone(), Arc::new(registry)));

        let mut findings = Findings::default();
        let rows = check_handlers(&config, &dispatcher, &mut findings);
        check_internal_routes(&config, &mut findings);
        check_action_names(&config, dispatcher.registry(), &mut findings);

        if rows.is_empty() {
            println!("No handlers configured.");
        } else {
            let mut table = Table::new(rows);
            table.with(Style::rounded());
            println!("{table}");
        }
        for warning in &findings.warnings {
            println!("{} {warning}", "warning:".yellow().bold());
        }
        for problem in &findings.problems {
            eprintln!("{} {problem}", "error:".red().bold());
        }

        if !findings.problems.is_empty() {
            bail!(
                "{} problem(s) found in '{}'",
                findings.problems.len(),
                self.config.display()
            );
        }
        println!("{} {}", "ok".green().bold(), self.config.display());
        Ok(())
    }
}

fn check_handlers(
    config: &Config,
    dispatcher: &Arc<Dispatcher>,
    findings: &mut Findings,
) -> Vec<HandlerRow> {
    let mut rows = Vec::new();
    for (name, handler) in config.handlers.iter() {
        let mut status = "ok";

        let watcher = match config
            .resolve_watcher(name)
            .and_then(|watcher| watcher.command_for(&handler.file))
        {
            Ok(argv) => argv.join(" "),
            Err(e) => {
                findings.problems.push(format!("handler '{name}': {e}"));
                status = "error";
                "-".to_string()
            }
        };
        if let Some(named) = handler.watcher.as_deref() {
            if !config.watchers.contains(named) {
                findings.warnings.push(format!(
                    "handler '{name}' names unknown watcher '{named}'; the default watcher is used"
                ));
            }
        }
        if let Err(e) = Supervisor::new(name, dispatcher.clone()) {
            findings.problems.push(e.to_string());
            status = "error";
        }

        rows.push(HandlerRow {
            handler: name.to_string(),
            watcher,
            rules: handler.events.iter().filter(|(_, r)| r.active).count(),
            status: status.to_string(),
        });
    }
    rows
}

fn check_internal_routes(config: &Config, findings: &mut Findings) {
    let known: Vec<&str> = InternalEvent::all().iter().map(InternalEvent::as_str).collect();
    for (event, _) in config.internal_routes() {
        if !known.contains(&event) {
            findings.warnings.push(format!(
                "'{event}' is not an internal event (known: {})",
                known.join(", ")
            ));
        }
    }
}

fn check_action_names(config: &Config, registry: &ActionRegistry, findings: &mut Findings) {
    let mut referenced = BTreeSet::new();
    if let Some(defaults) = config.default_actions() {
        referenced.extend(defaults.iter().map(String::as_str));
    }
    for (_, routing) in config.internal_routes() {
        if let Some(actions) = routing.actions.as_deref() {
            referenced.extend(actions.iter().map(String::as_str));
        }
    }
    for (_, handler) in config.handlers.iter() {
        for (_, rule) in handler.events.iter() {
            if let Some(actions) = rule.actions.as_deref() {
                referenced.extend(actions.iter().map(String::as_str));
            }
        }
    }

    for name in referenced {
        match registry.requires_settings(name) {
            None => findings.problems.push(format!(
                "unknown action '{name}' (available: {})",
                registry.names().join(", ")
            )),
            Some(true) if !config.actions.contains_key(name) => findings
                .warnings
                .push(format!("action '{name}' has no 'actions.{name}' block")),
            Some(_) => {}
        }
    }
}
