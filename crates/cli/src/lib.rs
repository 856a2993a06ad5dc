// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! outbox - offline-tolerant mutation sync.
//!
//! Applications submit mutations (overwrite or delete a value at a path) and
//! this crate gets them to a remote store, surviving restarts and network
//! loss along the way.
//!
//! # Main Components
//!
//! - [`sync::SyncEngine`] - drains the queue into the remote store
//! - [`sync::MutationQueue`] - ordered pending mutations, persisted on every change
//! - [`sync::ConnectivityMonitor`] - online/offline tracking
//! - [`sync::WebSocketRemote`] - remote store client
//! - [`Config`] - `outbox.toml` settings
//!
//! # Embedding
//!
//! ```rust,ignore
//! use outbox::sync::*;
//!
//! let store = FileQueueStore::open(&state_dir)?;
//! let monitor = Arc::new(ConnectivityMonitor::sample(&probe).await);
//! let engine = SyncEngine::new(
//!     EngineConfig::default(),
//!     MutationQueue::hydrate(store),
//!     WebSocketRemote::new(ClientConfig::default()),
//!     monitor.shared(),
//! );
//! engine.follow(&monitor);
//! let mut events = engine.subscribe()?;
//! engine.submit(Mutation::apply("items/1", json!({"title": "x"})));
//! ```

mod cli;
mod commands;
mod env;

pub mod config;
pub mod error;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{resolve_state_dir, Config};
pub use error::{Error, Result};

use clap::CommandFactory;
use clap_complete::generate;

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(cli: Cli) -> Result<()> {
    let Cli { state_dir, command } = cli;
    if let Command::Completion { shell } = command {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "outbox", &mut std::io::stdout());
        return Ok(());
    }

    let ctx = commands::Context::load(resolve_state_dir(state_dir)?)?;
    match command {
        Command::Submit { path, json, delete, output } => {
            commands::submit::run(&ctx, &path, json.as_deref(), delete, output)
        }
        Command::Pending { output } => commands::pending::run(&ctx, output),
        Command::Sync => commands::sync::run(&ctx),
        Command::Watch => commands::watch::run(&ctx),
        Command::Completion { .. } => Ok(()),
    }
}
