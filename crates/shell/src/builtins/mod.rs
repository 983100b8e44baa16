// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built-in commands.
//!
//! A built-in runs inside the shell process with full access to the
//! [`Shell`]. Special built-ins follow the POSIX rules: their prefix
//! assignments persist and their failures are fatal in a non-interactive
//! shell.

mod eval;
mod flow;
mod jobs;
mod misc;
mod vars;

use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

use crate::error::ExecError;
use crate::redirect::Discipline;
use crate::shell::Shell;
use crate::unwind::Unwind;

/// A command implemented inside the shell.
pub trait Builtin {
    fn name(&self) -> &str;

    /// Special built-ins: prefix assignments persist, errors are fatal.
    fn special(&self) -> bool {
        false
    }

    /// How redirections around this invocation are applied.
    fn redirect_discipline(&self, _argv: &[String]) -> Discipline {
        Discipline::Temporary
    }

    /// Run with `argv[0]` being the command name.
    fn run(&self, sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind>;
}

type BuiltinFn = fn(&mut Shell, &[String]) -> Result<i32, Unwind>;

/// A built-in backed by a plain function.
#[derive(Clone, Copy)]
pub struct FnBuiltin {
    name: &'static str,
    special: bool,
    run: BuiltinFn,
}

impl FnBuiltin {
    pub const fn regular(name: &'static str, run: BuiltinFn) -> Self {
        Self {
            name,
            special: false,
            run,
        }
    }

    pub const fn special(name: &'static str, run: BuiltinFn) -> Self {
        Self {
            name,
            special: true,
            run,
        }
    }
}

impl fmt::Debug for FnBuiltin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnBuiltin")
            .field("name", &self.name)
            .field("special", &self.special)
            .finish()
    }
}

impl Builtin for FnBuiltin {
    fn name(&self) -> &str {
        self.name
    }

    fn special(&self) -> bool {
        self.special
    }

    fn run(&self, sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
        (self.run)(sh, argv)
    }
}

/// Registered built-ins, addressed by index so resolutions can be cached.
#[derive(Default, Clone)]
pub struct BuiltinTable {
    entries: Vec<Arc<dyn Builtin>>,
    by_name: HashMap<String, usize>,
}

impl fmt::Debug for BuiltinTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.by_name.keys().collect();
        names.sort();
        f.debug_struct("BuiltinTable").field("names", &names).finish()
    }
}

impl BuiltinTable {
    /// Add `builtin`, replacing any built-in with the same name in place.
    pub fn register(&mut self, builtin: Arc<dyn Builtin>) {
        let name = builtin.name().to_string();
        match self.by_name.get(&name) {
            Some(&index) => self.entries[index] = builtin,
            None => {
                self.by_name.insert(name, self.entries.len());
                self.entries.push(builtin);
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<(usize, &Arc<dyn Builtin>)> {
        let index = *self.by_name.get(name)?;
        self.entries.get(index).map(|b| (index, b))
    }

    pub fn get(&self, index: usize) -> Option<Arc<dyn Builtin>> {
        self.entries.get(index).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The built-ins every shell starts with.
pub fn standard() -> BuiltinTable {
    let mut table = BuiltinTable::default();
    let all: [FnBuiltin; 19] = [
        FnBuiltin::special(":", flow::colon),
        FnBuiltin::regular("true", flow::colon),
        FnBuiltin::regular("false", flow::false_),
        FnBuiltin::special("break", flow::break_),
        FnBuiltin::special("continue", flow::continue_),
        FnBuiltin::special("return", flow::return_),
        FnBuiltin::special("exit", flow::exit),
        FnBuiltin::special("export", vars::export),
        FnBuiltin::special("readonly", vars::readonly),
        FnBuiltin::special("unset", vars::unset),
        FnBuiltin::regular("local", vars::local),
        FnBuiltin::special("shift", vars::shift),
        FnBuiltin::special("set", vars::set),
        FnBuiltin::regular("wait", jobs::wait),
        FnBuiltin::regular("jobs", jobs::jobs),
        FnBuiltin::regular("echo", misc::echo),
        FnBuiltin::regular("cd", misc::cd),
        FnBuiltin::regular("pwd", misc::pwd),
        FnBuiltin::special("times", misc::times),
    ];
    for builtin in all {
        table.register(Arc::new(builtin));
    }
    table.register(Arc::new(FnBuiltin::special("eval", eval::eval)));
    table.register(Arc::new(FnBuiltin::special(".", eval::dot)));
    table.register(Arc::new(FnBuiltin::special("source", eval::dot)));
    table.register(Arc::new(FnBuiltin::special("trap", eval::trap)));
    table.register(Arc::new(FnBuiltin::regular("command", eval::command)));
    table.register(Arc::new(eval::Exec));
    table
}

/// Write `text` to standard output, mapping failures to an I/O error.
pub(crate) fn print(text: &str) -> Result<(), ExecError> {
    let mut stdout = io::stdout().lock();
    stdout.write_all(text.as_bytes())?;
    stdout.flush()?;
    Ok(())
}

/// Quote `word` for re-input when it contains anything but plain
/// characters.
pub(crate) fn quote(word: &str) -> Cow<'_, str> {
    let plain = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=,+@%".contains(c));
    if plain {
        Cow::Borrowed(word)
    } else {
        Cow::Owned(format!("'{}'", word.replace('\'', r"'\''")))
    }
}

/// Parse an exit status or count argument.
pub(crate) fn number(arg: &str) -> Result<i64, ExecError> {
    arg.parse().map_err(|_| ExecError::BadNumber {
        value: arg.to_string(),
    })
}

#[cfg(test)]
#[path = "../builtins_tests/mod.rs"]
mod tests;
