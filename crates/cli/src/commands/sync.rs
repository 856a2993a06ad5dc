// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `outbox sync`: probe once and, if the remote is reachable, run one drain.

use crate::sync::{ConnectivityMonitor, ConnectivityState, DrainReport, TcpProbe};

use super::{format_event, runtime, Context};
use crate::error::Result;

pub fn run(ctx: &Context) -> Result<()> {
    let probe = ctx.probe()?;
    runtime()?.block_on(sync_once(ctx, &probe))
}

async fn sync_once(ctx: &Context, probe: &TcpProbe) -> Result<()> {
    let monitor = ConnectivityMonitor::sample(probe).await;
    let engine = ctx.engine(monitor.shared())?;

    if monitor.state() == ConnectivityState::Offline {
        println!(
            "Remote unreachable at {}; {} mutations stay queued.",
            probe.addr(),
            engine.pending_count()
        );
        return Ok(());
    }

    let mut events = engine.subscribe()?;
    let report = engine.drain().await;
    engine.shutdown();

    while let Ok(event) = events.try_recv() {
        println!("{}", format_event(&event));
    }
    println!("{}", summarize(&report, engine.pending_count()));
    engine.flush()?;
    Ok(())
}

pub(crate) fn summarize(report: &DrainReport, pending: usize) -> String {
    let mut line = format!(
        "Applied {}, failed {}, requeued {}.",
        report.applied,
        report.dropped + report.abandoned,
        report.requeued
    );
    if pending > 0 {
        line.push_str(&format!(" {} still pending.", pending));
    }
    line
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
