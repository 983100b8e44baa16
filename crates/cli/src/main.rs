// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tern - run serialized shell command trees

mod commands;
mod env;
mod exit_error;
mod logging;
mod tree;

use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Result};
use clap::{CommandFactory, Parser, Subcommand};
use commands::{check, run};
use tern_core::ShellConfig;

/// Deeply recursive scripts nest the executor once per call level.
const INTERPRETER_STACK: usize = 256 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "tern", version, about = "tern - shell command tree interpreter")]
struct Cli {
    /// Config file (default: $TERN_CONFIG, then ~/.config/tern/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a command tree as a script
    Run(run::RunArgs),
    /// Validate a command tree without running it
    Check(check::CheckArgs),
}

fn cli_command() -> clap::Command {
    Cli::command()
}

fn main() {
    let result = thread::Builder::new()
        .name("tern".to_string())
        .stack_size(INTERPRETER_STACK)
        .spawn(run)
        .map_err(anyhow::Error::from)
        .and_then(|handle| {
            handle
                .join()
                .unwrap_or_else(|_| Err(anyhow!("interpreter thread panicked")))
        });
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            let code = e
                .downcast_ref::<exit_error::ExitError>()
                .map_or(1, |c| c.code);
            let msg = format_error(&e);
            if !msg.is_empty() {
                eprintln!("tern: {}", msg);
            }
            std::process::exit(code);
        }
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// thiserror variants that embed their source already show it, so the chain
/// is only rendered when it adds something.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }
    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        cli_command().print_help()?;
        println!();
        return Ok(0);
    };
    let _guard = logging::setup_logging()?;

    match command {
        Commands::Run(args) => {
            let config = load_config(cli.config.as_deref())?;
            run::handle(args, config)
        }
        Commands::Check(args) => check::handle(args),
    }
}

/// `--config`, then TERN_CONFIG, then the per-user file when it exists.
fn load_config(flag: Option<&Path>) -> Result<ShellConfig> {
    if let Some(path) = flag.map(Path::to_path_buf).or_else(env::config_path) {
        return Ok(ShellConfig::load(&path)?);
    }
    Ok(match ShellConfig::default_path() {
        Some(path) => ShellConfig::load_or_default(&path)?,
        None => ShellConfig::default(),
    })
}

#[cfg(test)]
#[path = "main_tests.rs"]
mod tests;
