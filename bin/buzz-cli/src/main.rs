// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! # buzz
//!
//! Command-line interface for the resource-monitor sampling engine.
//!
//! ## Usage
//! ```bash
//! # One sampling cycle as pretty JSON (the default command)
//! buzz
//! buzz snapshot --output host.json
//! buzz snapshot --save
//!
//! # Signal a process; prints a JSON result
//! buzz kill 4242 --sigkill
//!
//! # Human-readable report, or a refreshing dashboard
//! buzz status
//! buzz top --refresh 1000 --sort mem --top 40
//! ```

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "buzz",
    about = "A lightweight resource monitor built on procfs counter deltas",
    version,
    author
)]
struct Cli {
    /// Path to a TOML sampling configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging (repeat for more: -v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Commands {
    /// Collect one snapshot and print it as JSON.
    Snapshot {
        /// Write the JSON to this file instead of stdout.
        #[arg(short, long, conflicts_with = "save")]
        output: Option<PathBuf>,

        /// Write the JSON to buzz-snapshot-<timestamp>.json in the current directory.
        #[arg(long)]
        save: bool,
    },

    /// Send a signal to a process (SIGTERM unless told otherwise).
    Kill {
        /// Target process id.
        #[arg(allow_negative_numbers = true)]
        pid: String,

        #[command(flatten)]
        signal: commands::kill::SignalArgs,
    },

    /// Display a one-cycle, human-readable resource report.
    Status,

    /// Refreshing terminal dashboard.
    Top(commands::top::TopArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    commands::init_tracing(cli.verbose);

    let config = commands::load_config(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Snapshot {
        output: None,
        save: false,
    }) {
        Commands::Snapshot { output, save } => {
            commands::snapshot::execute(config, output, save).await
        }
        Commands::Kill { pid, signal } => commands::kill::execute(&pid, &signal),
        Commands::Status => commands::status::execute(config).await,
        Commands::Top(args) => commands::top::execute(config, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_defaults_to_snapshot() {
        let cli = Cli::try_parse_from(["buzz"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from(["buzz", "status", "-vv", "--config", "buzz.toml"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("buzz.toml")));
        assert_eq!(cli.command, Some(Commands::Status));
    }

    #[test]
    fn test_snapshot_output_conflicts_with_save() {
        assert!(Cli::try_parse_from(["buzz", "snapshot", "--save", "-o", "x.json"]).is_err());
    }

    #[test]
    fn test_kill_parses_pid_and_flags() {
        let cli = Cli::try_parse_from(["buzz", "kill", "4242", "--sigkill"]).unwrap();
        match cli.command {
            Some(Commands::Kill { pid, signal }) => {
                assert_eq!(pid, "4242");
                assert_eq!(signal.resolve().unwrap(), libc::SIGKILL);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_kill_accepts_non_numeric_pid() {
        let cli = Cli::try_parse_from(["buzz", "kill", "abc"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Kill { pid, .. }) if pid == "abc"));
        let cli = Cli::try_parse_from(["buzz", "kill", "-5"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Kill { pid, .. }) if pid == "-5"));
    }

    #[test]
    fn test_kill_missing_pid_is_usage_error() {
        let err = Cli::try_parse_from(["buzz", "kill"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
