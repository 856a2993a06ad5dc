// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-tolerant mutation sync.
//!
//! Mutations are queued durably first and delivered to the remote store
//! whenever it is reachable.
//!
//! # Architecture
//!
//! ```text
//! submit ──► ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//!            │ SyncEngine  │────►│ RemoteStore │────►│   Remote    │
//! events ◄── │   (drain)   │◄────│  (client)   │◄────│   Store     │
//!            └─────────────┘     └─────────────┘     └─────────────┘
//!              │        ▲
//!              ▼        │ online/offline
//! ┌─────────────┐     ┌──────────────┐
//! │MutationQueue│     │ Connectivity │
//! │ + QueueStore│     │   Monitor    │
//! └─────────────┘     └──────────────┘
//! ```
//!
//! # Guarantees
//!
//! - Every change to the queue is persisted before it returns
//! - Mutations on one path reach the remote in enqueue order
//! - At most one drain cycle runs at a time
//! - No network I/O while offline
//! - Retryable failures back off exponentially and are abandoned after a
//!   configurable number of attempts

mod backoff;
mod connectivity;
mod engine;
mod events;
mod queue;
mod remote;
mod store;
mod transport;

pub use connectivity::{
    probe_addr_from_url, ConnectivityMonitor, ConnectivityState, ReachabilityProbe,
    SharedConnectivity, TcpProbe,
};
pub use engine::{DrainReport, EngineConfig, SyncEngine, SyncError, SyncResult};
pub use events::{Outcome, SyncEvent};
pub use queue::MutationQueue;
pub use remote::{ApplyOutcome, ClientConfig, ConnectionState, RemoteStore, WebSocketRemote};
pub use store::{
    queue_path, FileQueueStore, MemoryQueueStore, QueueStore, StoreError, StoreResult, QUEUE_KEY,
};
pub use transport::{Transport, TransportError, WebSocketTransport};

#[cfg(test)]
mod test_helpers;
