// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `echo`, `cd`, `pwd`, `times`.

use std::env;

use tern_core::status;
use tracing::debug;

use crate::error::ExecError;
use crate::shell::Shell;
use crate::times;
use crate::unwind::Unwind;

use super::print;

/// `echo [-n] arg...`. No escape processing.
pub(super) fn echo(_sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let args = argv.get(1..).unwrap_or_default();
    let (newline, words) = match args.split_first() {
        Some((flag, rest)) if flag == "-n" => (false, rest),
        _ => (true, args),
    };
    let mut text = words.join(" ");
    if newline {
        text.push('\n');
    }
    print(&text)?;
    Ok(status::SUCCESS)
}

/// `cd [dir|-]`. Without an operand changes to `$HOME`.
pub(super) fn cd(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let (target, announce) = match argv.get(1).map(String::as_str) {
        Some("-") => match sh.vars.get("OLDPWD") {
            Some(old) => (old.to_string(), true),
            None => return Err(ExecError::usage("OLDPWD not set").into()),
        },
        Some(dir) => (dir.to_string(), false),
        None => match sh.vars.get("HOME") {
            Some(home) => (home.to_string(), false),
            None => return Err(ExecError::usage("HOME not set").into()),
        },
    };
    let previous = env::current_dir().ok();
    env::set_current_dir(&target).map_err(|source| ExecError::Cd(target.clone(), source))?;
    let now = env::current_dir().map_err(ExecError::from)?;
    debug!(dir = %now.display(), "changed directory");
    if let Some(previous) = previous {
        sh.set_var("OLDPWD", previous.to_string_lossy())?;
    }
    sh.set_var("PWD", now.to_string_lossy())?;
    // Relative PATH entries now point elsewhere.
    sh.path.forget();
    sh.generation += 1;
    if announce {
        print(&format!("{}\n", now.display()))?;
    }
    Ok(status::SUCCESS)
}

pub(super) fn pwd(_sh: &mut Shell, _argv: &[String]) -> Result<i32, Unwind> {
    let dir = env::current_dir().map_err(ExecError::from)?;
    print(&format!("{}\n", dir.display()))?;
    Ok(status::SUCCESS)
}

/// Two lines: the shell's user and system time, then its children's.
pub(super) fn times(_sh: &mut Shell, _argv: &[String]) -> Result<i32, Unwind> {
    let (shell, children) = times::shell_and_children();
    print(&format!(
        "{}\n{}\n",
        times::format_pair(shell),
        times::format_pair(children)
    ))?;
    Ok(status::SUCCESS)
}
