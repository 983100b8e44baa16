// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-ins that run other code: `eval`, `.`, `trap`, `command`, `exec`.

use tern_core::{status, Node};

use crate::error::ExecError;
use crate::exec::ExecFlags;
use crate::redirect::Discipline;
use crate::shell::Shell;
use crate::traps::{Trap, TrapCondition};
use crate::unwind::{Catch, CheckpointKind, JumpLevel, Unwind};

use super::{print, quote, Builtin};

fn parse(sh: &Shell, text: &str, origin: &str) -> Result<Node, ExecError> {
    let Some(parser) = &sh.parser else {
        return Err(ExecError::NoParser(origin.to_string()));
    };
    parser
        .parse(text, origin)
        .map_err(|message| ExecError::Parse(format!("{origin}: {message}")))
}

/// `eval arg...`: parse the joined arguments and run them here.
pub(super) fn eval(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let text = argv.get(1..).unwrap_or_default().join(" ");
    if text.trim().is_empty() {
        return Ok(status::SUCCESS);
    }
    let tree = parse(sh, &text, "eval")?;
    match sh.guarded(CheckpointKind::Eval, Catch::UpTo(JumpLevel::Eval), |sh| {
        sh.execute(&tree, ExecFlags::ERREXIT)
    })? {
        Ok(status) => Ok(status),
        Err(unwind) => Ok(unwind.status),
    }
}

/// `. file [arg...]` and `source file [arg...]`.
pub(super) fn dot(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let Some(file) = argv.get(1) else {
        return Err(ExecError::usage("filename argument required").into());
    };
    let args = argv.get(2..).filter(|rest| !rest.is_empty()).map(<[String]>::to_vec);
    sh.source_file(file, args)
}

/// `trap [-p]`, `trap - cond...`, `trap '' cond...`, `trap action cond...`.
pub(super) fn trap(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let args = argv.get(1..).unwrap_or_default();
    let Some((first, rest)) = args.split_first().filter(|(first, _)| first.as_str() != "-p") else {
        return list_traps(sh);
    };

    // A lone condition resets it.
    if rest.is_empty() {
        if let Some(condition) = TrapCondition::parse(first) {
            sh.clear_trap(condition);
            return Ok(status::SUCCESS);
        }
        return Err(ExecError::BadTrap(first.clone()).into());
    }

    let action = first.as_str();
    let trap = match action {
        "-" => None,
        "" => Some(Trap::ignore()),
        text => Some(Trap::run(text, parse(sh, text, "trap")?)),
    };
    for name in rest {
        let Some(condition) = TrapCondition::parse(name) else {
            return Err(ExecError::BadTrap(name.clone()).into());
        };
        match &trap {
            None => sh.clear_trap(condition),
            Some(trap) => sh.set_trap(condition, trap.clone())?,
        }
    }
    Ok(status::SUCCESS)
}

fn list_traps(sh: &Shell) -> Result<i32, Unwind> {
    let listing: String = sh
        .scopes
        .current()
        .traps
        .iter()
        .map(|(condition, trap)| format!("trap -- {} {condition}\n", quote(&trap.text)))
        .collect();
    print(&listing)?;
    Ok(status::SUCCESS)
}

/// `command [-v] name [arg...]`
pub(super) fn command(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let args = argv.get(1..).unwrap_or_default();
    match args.split_first() {
        None => Ok(status::SUCCESS),
        Some((flag, names)) if flag == "-v" => describe(sh, names),
        Some(_) => sh.run_command(args.to_vec()),
    }
}

/// `command -v`: how each name would be run. Status 1 when any is unknown.
fn describe(sh: &mut Shell, names: &[String]) -> Result<i32, Unwind> {
    let mut result = status::SUCCESS;
    let mut listing = String::new();
    for name in names {
        if sh.builtins.contains(name) || sh.functions.contains_key(name) {
            listing.push_str(name);
            listing.push('\n');
            continue;
        }
        match sh.find_program(name, None) {
            Ok(path) => {
                listing.push_str(&path.to_string_lossy());
                listing.push('\n');
            }
            Err(_) => result = status::FAILURE,
        }
    }
    print(&listing)?;
    Ok(result)
}

/// `exec [cmd arg...]`. Without a command its redirections stay in effect
/// for the rest of the shell.
#[derive(Debug, Clone, Copy)]
pub(super) struct Exec;

impl Builtin for Exec {
    fn name(&self) -> &str {
        "exec"
    }

    fn special(&self) -> bool {
        true
    }

    fn redirect_discipline(&self, argv: &[String]) -> Discipline {
        if argv.len() > 1 {
            Discipline::Temporary
        } else {
            Discipline::Permanent
        }
    }

    fn run(&self, sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
        match argv.get(1..) {
            Some(program) if !program.is_empty() => sh.exec_program(program),
            _ => Ok(status::SUCCESS),
        }
    }
}
