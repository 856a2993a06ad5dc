// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod pending;
pub mod submit;
pub mod sync;
pub mod watch;

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::sync::{
    FileQueueStore, MutationQueue, Outcome, SharedConnectivity, SyncEngine, SyncEvent, TcpProbe,
    WebSocketRemote,
};

/// Engine wired to the state directory's queue and the configured remote.
pub type Engine = SyncEngine<WebSocketRemote, FileQueueStore>;

/// State directory and settings shared by the commands.
pub struct Context {
    pub state_dir: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn load(state_dir: PathBuf) -> Result<Self> {
        let config = Config::load(&state_dir)?;
        Ok(Context { state_dir, config })
    }

    /// Opens the queue, taking the state directory's queue lock.
    pub fn open_queue(&self) -> Result<MutationQueue<FileQueueStore>> {
        let store = FileQueueStore::open(&self.state_dir)?;
        Ok(MutationQueue::hydrate(store))
    }

    pub fn probe(&self) -> Result<TcpProbe> {
        self.config.probe.probe_for(&self.config.remote)
    }

    pub fn engine(&self, connectivity: Arc<SharedConnectivity>) -> Result<Engine> {
        let remote = WebSocketRemote::new(self.config.remote.client_config());
        Ok(SyncEngine::new(
            self.config.sync.engine_config(),
            self.open_queue()?,
            remote,
            connectivity,
        ))
    }
}

/// Runtime for commands that talk to the network.
pub fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread().enable_all().build()?)
}

/// One line describing a resolved mutation.
pub fn format_event(event: &SyncEvent) -> String {
    match (&event.outcome, &event.detail) {
        (Outcome::Success, _) => format!("applied  {}  {}", event.record_id, event.path),
        (Outcome::TerminalFailure, Some(detail)) => {
            format!("failed   {}  {}: {}", event.record_id, event.path, detail)
        }
        (Outcome::TerminalFailure, None) => format!("failed   {}  {}", event.record_id, event.path),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
