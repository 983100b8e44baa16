// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tern run <tree.json> [args]` - Run a command tree as a script

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use tern_core::{status, validate, ShellConfig, ShellOptions};
use tern_shell::Shell;
use tracing::debug;

use crate::exit_error::ExitError;
use crate::tree::{self, describe_problems, JsonParser};

#[derive(Args)]
pub struct RunArgs {
    /// Serialized command tree (`-` reads standard input)
    pub tree: PathBuf,

    /// Positional parameters for the script
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Turn on a shell option, as `set -o NAME` would (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME")]
    pub options: Vec<String>,

    /// Let the last command replace the shell process
    #[arg(long)]
    pub exec_last: bool,
}

/// Apply command-line overrides to the loaded config.
pub fn configure(args: &RunArgs, mut config: ShellConfig) -> Result<ShellConfig> {
    for name in &args.options {
        if !config.options.set(name, true) {
            bail!(
                "{name}: unknown option (expected one of {})",
                ShellOptions::NAMES.join(", ")
            );
        }
    }
    if args.exec_last {
        config.exec_last_command = true;
    }
    Ok(config)
}

pub fn handle(args: RunArgs, config: ShellConfig) -> Result<i32> {
    let config = configure(&args, config)?;
    let tree = tree::load(&args.tree)?;
    let origin = args.tree.display().to_string();
    if let Err(errors) = validate(&tree) {
        for line in describe_problems(&origin, &errors) {
            eprintln!("{line}");
        }
        return Err(ExitError::new(status::USAGE, "").into());
    }

    let mut shell = Shell::builder()
        .config(config)
        .arg0(origin.as_str())
        .args(args.args)
        .parser(JsonParser)
        .build();
    debug!(script = %origin, "running");
    shell.run(&tree);
    let status = shell.finish();
    debug!(script = %origin, status, "finished");
    Ok(status)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
