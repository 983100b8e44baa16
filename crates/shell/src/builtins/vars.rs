// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Variable and option built-ins: `export`, `readonly`, `unset`, `local`,
//! `shift`, `set`.

use tern_core::{is_identifier, status, ShellOptions};
use tracing::debug;

use crate::error::ExecError;
use crate::shell::Shell;
use crate::unwind::Unwind;

use super::{number, print, quote};

/// Split `name=value` into its parts, checking the name.
fn split_assignment(arg: &str) -> Result<(&str, Option<String>), ExecError> {
    let (name, value) = match arg.split_once('=') {
        Some((name, value)) => (name, Some(value.to_string())),
        None => (arg, None),
    };
    if !is_identifier(name) {
        return Err(ExecError::InvalidName(name.to_string()));
    }
    Ok((name, value))
}

/// Arguments after leading `-p` style flags.
fn operands(argv: &[String]) -> &[String] {
    let rest = argv.get(1..).unwrap_or_default();
    match rest.iter().position(|arg| !arg.starts_with('-') || arg == "-") {
        Some(start) => &rest[start..],
        None => &[],
    }
}

pub(super) fn export(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let names = operands(argv);
    if names.is_empty() {
        let listing: String = sh
            .vars
            .exported()
            .iter()
            .map(|(name, value)| format!("export {name}={}\n", quote(value)))
            .collect();
        print(&listing)?;
        return Ok(status::SUCCESS);
    }
    for arg in names {
        let (name, value) = split_assignment(arg)?;
        sh.vars.export(name, value)?;
        if name == "PATH" {
            sh.path.forget();
            sh.generation += 1;
        }
    }
    Ok(status::SUCCESS)
}

pub(super) fn readonly(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let names = operands(argv);
    if names.is_empty() {
        let listing: String = sh
            .vars
            .visible()
            .iter()
            .filter(|(_, var)| var.readonly)
            .map(|(name, var)| {
                format!("readonly {name}={}\n", quote(var.value.as_deref().unwrap_or("")))
            })
            .collect();
        print(&listing)?;
        return Ok(status::SUCCESS);
    }
    for arg in names {
        let (name, value) = split_assignment(arg)?;
        sh.vars.set_readonly(name, value)?;
    }
    Ok(status::SUCCESS)
}

/// `unset [-f|-v] name...`
pub(super) fn unset(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let mut functions = false;
    let mut names = argv.get(1..).unwrap_or_default();
    while let Some((flag, rest)) = names.split_first() {
        match flag.as_str() {
            "-f" => functions = true,
            "-v" => functions = false,
            "--" => {
                names = rest;
                break;
            }
            _ if flag.starts_with('-') => {
                return Err(ExecError::usage(format!("{flag}: unknown option")).into());
            }
            _ => break,
        }
        names = rest;
    }
    for name in names {
        if functions {
            if sh.functions.remove(name).is_some() {
                debug!(function = %name, "unset function");
                sh.generation += 1;
            }
            continue;
        }
        if !is_identifier(name) {
            return Err(ExecError::InvalidName(name.clone()).into());
        }
        sh.vars.unset(name)?;
        if name == "PATH" {
            sh.path.forget();
            sh.generation += 1;
        }
    }
    Ok(status::SUCCESS)
}

/// `local [-x] [-S] name[=value]...`
///
/// `-S` declares a static: its value survives between calls of the
/// function and is initialized only on the first call.
pub(super) fn local(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    if sh.fn_depth == 0 {
        return Err(ExecError::usage("can only be used in a function").into());
    }
    let mut export = false;
    let mut statics = false;
    let mut names = argv.get(1..).unwrap_or_default();
    while let Some((flag, rest)) = names.split_first() {
        let Some(letters) = flag.strip_prefix('-').filter(|l| !l.is_empty()) else {
            break;
        };
        for letter in letters.chars() {
            match letter {
                'x' => export = true,
                'S' => statics = true,
                _ => return Err(ExecError::usage(format!("-{letter}: unknown option")).into()),
            }
        }
        names = rest;
    }
    for arg in names {
        let (name, value) = split_assignment(arg)?;
        if statics {
            let scope = sh.scopes.current_mut();
            if scope.statics.iter().any(|s| s == name) {
                continue;
            }
            scope.statics.push(name.to_string());
        }
        sh.vars.set_local(name, value)?;
        if export {
            sh.vars.export(name, None)?;
        }
    }
    Ok(status::SUCCESS)
}

pub(super) fn shift(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let count = match argv.get(1) {
        Some(arg) => number(arg)?,
        None => 1,
    };
    let positionals = &mut sh.scopes.current_mut().positionals;
    let count = usize::try_from(count)
        .ok()
        .filter(|n| *n <= positionals.len())
        .ok_or_else(|| ExecError::BadNumber {
            value: count.to_string(),
        })?;
    positionals.drain(..count);
    Ok(status::SUCCESS)
}

/// `set [-eumnCx] [+eumnCx] [-o name] [+o name] [--] [arg...]`
pub(super) fn set(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let args = argv.get(1..).unwrap_or_default();
    if args.is_empty() {
        let listing: String = sh
            .vars
            .visible()
            .iter()
            .map(|(name, var)| format!("{name}={}\n", quote(var.value.as_deref().unwrap_or(""))))
            .collect();
        print(&listing)?;
        return Ok(status::SUCCESS);
    }

    let mut positionals: Option<Vec<String>> = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            positionals = Some(iter.by_ref().cloned().collect());
            break;
        }
        let (on, letters) = match arg.as_bytes().first() {
            Some(b'-') if arg.len() > 1 => (true, &arg[1..]),
            Some(b'+') if arg.len() > 1 => (false, &arg[1..]),
            _ => {
                let mut rest = vec![arg.clone()];
                rest.extend(iter.by_ref().cloned());
                positionals = Some(rest);
                break;
            }
        };
        for letter in letters.chars() {
            if letter == 'o' {
                match iter.next() {
                    Some(name) => set_option(sh, name, on)?,
                    None => {
                        list_options(&sh.options)?;
                    }
                }
                continue;
            }
            let name = ShellOptions::name_for_flag(letter)
                .ok_or_else(|| ExecError::usage(format!("-{letter}: unknown option")))?;
            set_option(sh, name, on)?;
        }
    }
    if let Some(positionals) = positionals {
        sh.scopes.current_mut().positionals = positionals;
    }
    Ok(status::SUCCESS)
}

fn set_option(sh: &mut Shell, name: &str, on: bool) -> Result<(), ExecError> {
    if !sh.options.set(name, on) {
        return Err(ExecError::usage(format!("{name}: bad option")));
    }
    debug!(option = name, on, "option changed");
    Ok(())
}

fn list_options(options: &ShellOptions) -> Result<(), ExecError> {
    let listing: String = ShellOptions::NAMES
        .iter()
        .map(|name| {
            let state = if options.get(name).unwrap_or(false) {
                "on"
            } else {
                "off"
            };
            format!("{name:<12}{state}\n")
        })
        .collect();
    print(&listing)
}

