// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `tern check <tree.json>` - Validate a command tree without running it

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tern_core::{status, validate_with_config, ValidatorConfig};

use crate::exit_error::ExitError;
use crate::tree::{self, describe_problems};

#[derive(Args)]
pub struct CheckArgs {
    /// Serialized command tree (`-` reads standard input)
    pub tree: PathBuf,

    /// Reject trees nested deeper than this (0 = unlimited)
    #[arg(long, default_value_t = 0)]
    pub max_depth: usize,
}

/// Problems found in the tree, one line each.
pub fn problems(args: &CheckArgs) -> Result<Vec<String>> {
    let tree = tree::load(&args.tree)?;
    let config = ValidatorConfig {
        max_nesting_depth: args.max_depth,
    };
    let origin = args.tree.display().to_string();
    Ok(match validate_with_config(&tree, config) {
        Ok(()) => Vec::new(),
        Err(errors) => describe_problems(&origin, &errors),
    })
}

pub fn handle(args: CheckArgs) -> Result<i32> {
    let problems = problems(&args)?;
    if problems.is_empty() {
        println!("{}: ok", args.tree.display());
        return Ok(status::SUCCESS);
    }
    for line in &problems {
        eprintln!("{line}");
    }
    Err(ExitError::new(status::FAILURE, format!("{} problem(s) found", problems.len())).into())
}

#[cfg(test)]
#[path = "check_tests.rs"]
mod tests;
