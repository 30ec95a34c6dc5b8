//! logdog: watch log streams and turn matching lines into actions.
//!
//! # Usage
//!
//! ```text
//! logdog run <CONFIG>
//! logdog check <CONFIG>
//! logdog actions [--config <CONFIG>]
//! logdog fire <CONFIG> --event <NAME> [--handler <NAME>] [--brief ..] [--detailed ..] [--stdout ..] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{actions::ActionsArgs, check::CheckArgs, fire::FireArgs, run::RunArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "logdog",
    version,
    about = "Watch log streams and run actions when lines match",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the daemon in the foreground until SIGINT, SIGTERM or SIGHUP.
    Run(RunArgs),

    /// Validate a configuration without starting any watcher.
    Check(CheckArgs),

    /// List the available actions.
    Actions(ActionsArgs),

    /// Send one event through the dispatch protocol and report what ran.
    Fire(FireArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => args.run(),
        Commands::Check(args) => args.run(),
        Commands::Actions(args) => args.run(),
        Commands::Fire(args) => args.run(),
    }
}
