// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![deny(unsafe_code)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::fs;
use std::path::Path;

use clap::Parser;
use outbox::config::LOG_FILE_NAME;
use outbox::Cli;

fn main() {
    let cli = Cli::parse();
    if cli.command.uses_state_dir() {
        if let Ok(state_dir) = outbox::resolve_state_dir(cli.state_dir.clone()) {
            setup_logging(&state_dir);
        }
    }

    if let Err(e) = outbox::run(cli) {
        tracing::error!("{}", e);
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn setup_logging(state_dir: &Path) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    let file = fs::create_dir_all(state_dir).and_then(|()| {
        fs::OpenOptions::new().create(true).append(true).open(state_dir.join(LOG_FILE_NAME))
    });
    if let Ok(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}
