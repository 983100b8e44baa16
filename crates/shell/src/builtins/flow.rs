// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `:`, `true`, `false`, `break`, `continue`, `return`, `exit`.

use tern_core::status;

use crate::error::ExecError;
use crate::shell::Shell;
use crate::unwind::Unwind;

use super::number;

pub(super) fn colon(_sh: &mut Shell, _argv: &[String]) -> Result<i32, Unwind> {
    Ok(status::SUCCESS)
}

pub(super) fn false_(_sh: &mut Shell, _argv: &[String]) -> Result<i32, Unwind> {
    Ok(status::FAILURE)
}

pub(super) fn break_(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    loop_control(sh, argv, 1)
}

pub(super) fn continue_(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    loop_control(sh, argv, -1)
}

/// Record a pending break (`sign` 1) or continue (`sign` -1) for the
/// enclosing loops. Outside a loop this does nothing.
fn loop_control(sh: &mut Shell, argv: &[String], sign: i64) -> Result<i32, Unwind> {
    let count = match argv.get(1) {
        Some(arg) => {
            let count = number(arg)?;
            if count < 1 {
                return Err(ExecError::BadNumber { value: arg.clone() }.into());
            }
            count
        }
        None => 1,
    };
    let loops = &mut sh.scopes.current_mut().loops;
    let depth = i64::try_from(loops.depth).unwrap_or(i64::MAX);
    loops.pending = sign * count.min(depth);
    Ok(status::SUCCESS)
}

/// `return [n]`. Outside any function or sourced script it exits the shell.
pub(super) fn return_(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let status = exit_status_arg(sh, argv)?;
    if sh.fn_depth == 0 && sh.dot_depth == 0 {
        return Err(Unwind::exit(status));
    }
    Err(Unwind::ret(status))
}

pub(super) fn exit(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let status = exit_status_arg(sh, argv)?;
    Err(Unwind::exit(status))
}

fn exit_status_arg(sh: &Shell, argv: &[String]) -> Result<i32, ExecError> {
    match argv.get(1) {
        Some(arg) => Ok((number(arg)? & 0xff) as i32),
        None => Ok(sh.exit_status),
    }
}
