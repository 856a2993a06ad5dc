// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

const QUICKSTART_HELP: &str = "\
Get started:
  outbox submit items/1 --json '{\"title\": \"x\"}'   Queue an overwrite
  outbox submit items/2 --delete                    Queue a delete
  outbox pending                                    List queued mutations
  outbox sync                                       Deliver what can be delivered now
  outbox watch                                      Keep delivering until Ctrl-C";

#[derive(Parser)]
#[command(name = "outbox", version)]
#[command(about = "Offline-tolerant mutation queue for a remote path-addressed store")]
#[command(
    long_about = "Offline-tolerant mutation queue for a remote path-addressed store.\n\n\
    Mutations are written to a durable local queue first and delivered to the remote \
    store, in order per path, whenever it is reachable."
)]
#[command(after_help = QUICKSTART_HELP)]
pub struct Cli {
    /// Directory holding the queue, config and log
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Queue a mutation for delivery
    ///
    /// Takes the queue lock while writing, so it fails while `outbox watch`
    /// is running on the same state directory. Stop `watch` first, or submit
    /// through the embedding application instead.
    Submit {
        /// Target path (slash-delimited, e.g. items/1)
        path: String,

        /// Overwrite the value at the path with this JSON value
        #[arg(long, value_name = "VALUE", conflicts_with = "delete", required_unless_present = "delete")]
        json: Option<String>,

        /// Remove the value at the path
        #[arg(long)]
        delete: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// List queued mutations in delivery order
    Pending {
        /// Output format
        #[arg(short, long, value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Probe the remote once and, if reachable, deliver queued mutations
    Sync,

    /// Deliver queued mutations whenever the remote is reachable, until Ctrl-C
    ///
    /// Holds the queue lock for as long as it runs: `submit` and `sync` on
    /// the same state directory fail until it stops. `pending` still works.
    Watch,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

impl Command {
    /// Returns true if the command works on the state directory.
    pub fn uses_state_dir(&self) -> bool {
        !matches!(self, Command::Completion { .. })
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
