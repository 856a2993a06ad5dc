// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use clap::CommandFactory;
use yare::parameterized;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(std::iter::once("outbox").chain(args.iter().copied()))
}

#[test]
fn test_cli_definition_is_valid() {
    Cli::command().debug_assert();
}

#[test]
fn test_submit_apply() {
    let cli = parse(&["submit", "items/1", "--json", "{\"a\":1}"]).unwrap();
    let Command::Submit { path, json, delete, output } = cli.command else {
        unreachable!("submit parses as Command::Submit");
    };
    assert_eq!(path, "items/1");
    assert_eq!(json.as_deref(), Some("{\"a\":1}"));
    assert!(!delete);
    assert_eq!(output, OutputFormat::Text);
}

#[test]
fn test_submit_delete() {
    let cli = parse(&["submit", "items/1", "--delete", "-o", "json"]).unwrap();
    assert!(matches!(
        cli.command,
        Command::Submit { delete: true, json: None, output: OutputFormat::Json, .. }
    ));
}

#[parameterized(
    neither = { &["submit", "items/1"] },
    both = { &["submit", "items/1", "--delete", "--json", "1"] },
    no_path = { &["submit", "--delete"] },
)]
fn test_submit_rejects(args: &[&str]) {
    assert!(parse(args).is_err());
}

#[test]
fn test_global_state_dir() {
    let cli = parse(&["pending", "--state-dir", "/tmp/q"]).unwrap();
    assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/q")));
    assert!(cli.command.uses_state_dir());
}

#[test]
fn test_completion_skips_state_dir() {
    let cli = parse(&["completion", "bash"]).unwrap();
    assert!(!cli.command.uses_state_dir());
}
