// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::path::Path;

use clap::error::ErrorKind;
use clap::FromArgMatches;

use super::*;

fn parse(args: &[&str]) -> Cli {
    let matches = cli_command().try_get_matches_from(args).unwrap();
    Cli::from_arg_matches(&matches).unwrap()
}

// -- Arguments ---------------------------------------------------------------

#[test]
fn version_flag() {
    let err = cli_command()
        .try_get_matches_from(["tern", "--version"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DisplayVersion);
}

#[test]
fn run_collects_script_arguments() {
    let cli = parse(&["tern", "run", "-o", "pipefail", "tree.json", "a", "-b", "--c"]);
    let Some(Commands::Run(args)) = cli.command else {
        panic!("expected run");
    };
    assert_eq!(args.tree, Path::new("tree.json"));
    assert_eq!(args.args, ["a", "-b", "--c"]);
    assert_eq!(args.options, ["pipefail"]);
    assert!(!args.exec_last);
}

#[test]
fn config_flag_is_global() {
    let cli = parse(&["tern", "check", "tree.json", "--config", "/etc/tern.toml"]);
    assert_eq!(cli.config.as_deref(), Some(Path::new("/etc/tern.toml")));
    assert!(matches!(cli.command, Some(Commands::Check(_))));
}

#[test]
fn run_needs_a_tree() {
    let err = cli_command()
        .try_get_matches_from(["tern", "run"])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
}

// -- Config ------------------------------------------------------------------

#[test]
fn config_flag_loads_that_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tern.toml");
    fs::write(
        &path,
        "exec_last_command = true\nmax_function_depth = 64\n\n[options]\npipefail = true\n",
    )
    .unwrap();

    let config = load_config(Some(&path)).unwrap();
    assert!(config.exec_last_command);
    assert_eq!(config.max_function_depth, 64);
    assert!(config.options.pipefail);
}

#[test]
fn missing_config_flag_file_is_an_error() {
    assert!(load_config(Some(Path::new("/nonexistent/tern/config.toml"))).is_err());
}

// -- Errors ------------------------------------------------------------------

#[test]
fn redundant_error_chain_is_not_repeated() {
    let err = anyhow::Error::from(std::io::Error::other("disk gone")).context("reading tree: disk gone");
    assert_eq!(format_error(&err), "reading tree: disk gone");

    let err = anyhow::Error::from(std::io::Error::other("disk gone")).context("reading tree");
    assert_eq!(format_error(&err), "reading tree\n\nCaused by:\n    0: disk gone");
}
