// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `outbox watch`: keep the queue draining until interrupted.
//!
//! The probe loop feeds the connectivity monitor, the engine follows its
//! transitions, and resolution events are printed as they arrive.

use std::sync::Arc;

use super::{format_event, runtime, Context};
use crate::error::Result;
use crate::sync::{ConnectivityMonitor, TcpProbe};

pub fn run(ctx: &Context) -> Result<()> {
    let probe = ctx.probe()?;
    runtime()?.block_on(watch(ctx, probe))
}

async fn watch(ctx: &Context, probe: TcpProbe) -> Result<()> {
    let monitor = Arc::new(ConnectivityMonitor::sample(&probe).await);
    let engine = ctx.engine(monitor.shared())?;
    let mut events = engine.subscribe()?;

    println!(
        "Watching {} ({}), {} pending. Press Ctrl-C to stop.",
        probe.addr(),
        monitor.state(),
        engine.pending_count()
    );
    tracing::info!("watch started, remote {}", monitor.state());

    let follower = engine.follow(&monitor);
    let prober = monitor.spawn_probe(probe, ctx.config.probe.interval());
    engine.trigger();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Some(event) => println!("{}", format_event(&event)),
                None => break,
            },
        }
    }

    engine.shutdown();
    monitor.cancel();
    let _ = follower.await;
    let _ = prober.await;
    engine.flush()?;

    tracing::info!("watch stopped, {} pending", engine.pending_count());
    println!("Stopped, {} pending.", engine.pending_count());
    Ok(())
}
