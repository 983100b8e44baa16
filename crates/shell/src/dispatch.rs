// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command dispatcher.
//!
//! A simple command resolves to a special built-in, a function, a regular
//! built-in or an external program, in that order. The resolution is cached
//! on the tree node and stamped with the shell's generation counter.

use std::io::{self, Write};
use std::path::PathBuf;

use nix::unistd::{getpid, Pid};
use tern_core::ast::{Redirect, Resolution, SimpleCommand};
use tern_core::status;
use tracing::debug;

use crate::builtins::quote;
use crate::error::ExecError;
use crate::exec::ExecFlags;
use crate::launcher::{
    self, check_exec_optimization, exec_in_place, fork_process, reset_child_signals,
    ChildSignals, ExecOptContext, Forked, Launch,
};
use crate::path::Lookup;
use crate::redirect::{Discipline, ResolvedRedirect};
use crate::shell::{Shell, DEFAULT_PATH};
use crate::traps::TrapCondition;
use crate::unwind::{CheckpointKind, Unwind, UnwindKind};

/// DEBUG trap status that skips the command.
const DEBUG_SKIP: i32 = 2;

/// An expanded command on its way to a built-in, function or program.
struct Invocation<'a> {
    argv: Vec<String>,
    assignments: Vec<(String, String)>,
    redirects: Vec<ResolvedRedirect>,
    /// Unexpanded redirections, for the exec predicate.
    raw_redirects: &'a [Redirect],
    flags: ExecFlags,
    /// Reached through the `command` built-in.
    via_command: bool,
}

impl Shell {
    pub(crate) fn dispatch(&mut self, cmd: &SimpleCommand, flags: ExecFlags) -> Result<i32, Unwind> {
        let argv = self.expand_words(&cmd.words)?;
        let Some(name) = argv.first().cloned() else {
            return self.assign_only(cmd);
        };
        let mut assignments = Vec::with_capacity(cmd.assignments.len());
        for assignment in &cmd.assignments {
            let value = self.expand_text(&assignment.value)?;
            assignments.push((assignment.name.clone(), value));
        }
        let redirects = self.resolve_redirects(&cmd.redirects)?;

        if self.options.xtrace {
            self.trace(&assignments, &argv);
        }
        if self.run_trap(TrapCondition::Debug)? == Some(DEBUG_SKIP) {
            debug!(command = %name, "skipped by DEBUG trap");
            return Ok(status::SUCCESS);
        }

        let resolution = match cmd.cache.get(self.generation) {
            Some(resolution) => resolution,
            None => {
                let resolution = self.resolve_command(&name, false);
                cmd.cache.set(self.generation, resolution);
                resolution
            }
        };
        self.current_command = Some(name);
        let last_arg = argv.last().cloned().unwrap_or_default();
        let result = self.invoke(
            resolution,
            Invocation {
                argv,
                assignments,
                redirects,
                raw_redirects: &cmd.redirects,
                flags,
                via_command: false,
            },
        );
        self.current_command = None;
        self.last_arg = last_arg;
        result
    }

    /// Where `name` would run from. Functions are skipped for `command`.
    pub(crate) fn resolve_command(&self, name: &str, skip_functions: bool) -> Resolution {
        let builtin = self.builtins.lookup(name);
        if let Some((index, builtin)) = builtin {
            if builtin.special() {
                return Resolution::SpecialBuiltin(index);
            }
        }
        if !skip_functions && self.functions.contains_key(name) {
            return Resolution::Function;
        }
        match builtin {
            Some((index, _)) => Resolution::Builtin(index),
            None => Resolution::External,
        }
    }

    /// Run `argv` as `command` does: functions are not considered and
    /// special built-ins lose their special properties.
    pub(crate) fn run_command(&mut self, argv: Vec<String>) -> Result<i32, Unwind> {
        let Some(name) = argv.first() else {
            return Ok(status::SUCCESS);
        };
        let resolution = self.resolve_command(name, true);
        self.invoke(
            resolution,
            Invocation {
                argv,
                assignments: Vec::new(),
                redirects: Vec::new(),
                raw_redirects: &[],
                flags: ExecFlags::empty(),
                via_command: true,
            },
        )
    }

    /// Path of the program `name` runs. `path` overrides the `PATH`
    /// variable.
    pub(crate) fn find_program(&mut self, name: &str, path: Option<String>) -> Result<PathBuf, ExecError> {
        let path_value = path
            .or_else(|| self.vars.get("PATH").map(str::to_string))
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        match self.path.resolve(name, &path_value) {
            Lookup::Found(path) => Ok(path),
            Lookup::NotExecutable(_, reason) => Err(ExecError::NotExecutable {
                name: name.to_string(),
                reason,
            }),
            Lookup::NotFound => Err(ExecError::NotFound {
                name: name.to_string(),
            }),
        }
    }

    /// Replace the shell with `argv` (`exec cmd ...`). Only returns on
    /// failure.
    pub(crate) fn exec_program(&mut self, argv: &[String]) -> Result<i32, Unwind> {
        let Some(name) = argv.first() else {
            return Ok(status::SUCCESS);
        };
        let path = self.find_program(name, None)?;
        let env = self.vars.exported();
        let launch = Launch {
            path: &path,
            argv,
            env: &env,
            pgid: None,
        };
        Err(exec_in_place(&launch).into())
    }

    fn invoke(&mut self, resolution: Resolution, inv: Invocation<'_>) -> Result<i32, Unwind> {
        match resolution {
            Resolution::SpecialBuiltin(index) => self.run_builtin(index, inv, true),
            Resolution::Builtin(index) => self.run_builtin(index, inv, false),
            Resolution::Function => self.run_function(inv),
            Resolution::External => self.run_external(inv),
        }
    }

    /// `x=1 y=2` with no command word: assignments persist.
    fn assign_only(&mut self, cmd: &SimpleCommand) -> Result<i32, Unwind> {
        let mut traced = Vec::with_capacity(cmd.assignments.len());
        for assignment in &cmd.assignments {
            let value = self.expand_text(&assignment.value)?;
            self.set_var(&assignment.name, value.clone())?;
            traced.push((assignment.name.clone(), value));
        }
        if self.options.xtrace && !traced.is_empty() {
            self.trace(&traced, &[]);
        }
        if !cmd.redirects.is_empty() {
            let resolved = self.resolve_redirects(&cmd.redirects)?;
            match self
                .redirects
                .apply(&resolved, Discipline::Temporary, self.options.noclobber)
            {
                Ok(mark) => self.redirects.restore(mark),
                Err(err) => {
                    self.report(&err);
                    return Ok(err.status());
                }
            }
        }
        Ok(status::SUCCESS)
    }

    fn run_builtin(&mut self, index: usize, inv: Invocation<'_>, special: bool) -> Result<i32, Unwind> {
        let Some(builtin) = self.builtins.get(index) else {
            return self.run_external(inv);
        };
        let special = special && !inv.via_command;

        let frame = if special {
            for (name, value) in &inv.assignments {
                self.set_var(name, value.clone())?;
            }
            None
        } else if inv.assignments.is_empty() {
            None
        } else {
            Some(self.vars.push_temporary(inv.assignments))
        };

        let discipline = builtin.redirect_discipline(&inv.argv);
        let mark = match self
            .redirects
            .apply(&inv.redirects, discipline, self.options.noclobber)
        {
            Ok(mark) => mark,
            Err(err) => {
                if let Some(frame) = frame {
                    self.vars.truncate(frame);
                }
                self.report(&err);
                return self.builtin_status(err.status(), special || err.is_fatal());
            }
        };

        let result = builtin.run(self, &inv.argv);

        if discipline == Discipline::Temporary {
            self.redirects.restore(mark);
        }
        if let Some(frame) = frame {
            self.vars.truncate(frame);
        }
        match result {
            Err(Unwind {
                kind: UnwindKind::Error(err),
                ..
            }) => {
                self.report(&format_args!("{}: {err}", builtin.name()));
                self.builtin_status(err.status(), special || err.is_fatal())
            }
            other => other,
        }
    }

    /// A reported built-in failure: fatal ones abort, the rest are a status.
    fn builtin_status(&self, status: i32, fatal: bool) -> Result<i32, Unwind> {
        if fatal {
            Err(Unwind::abort(status, self.fatal_level()))
        } else {
            Ok(status)
        }
    }

    fn run_function(&mut self, inv: Invocation<'_>) -> Result<i32, Unwind> {
        let frame = self.vars.push_temporary(inv.assignments);
        let mark = match self
            .redirects
            .apply(&inv.redirects, Discipline::Temporary, self.options.noclobber)
        {
            Ok(mark) => mark,
            Err(err) => {
                self.vars.truncate(frame);
                self.report(&err);
                return Ok(err.status());
            }
        };
        let mut argv = inv.argv;
        let name = argv.remove(0);
        let result = self.call_function(&name, argv);
        self.redirects.restore(mark);
        self.vars.truncate(frame);
        result
    }

    fn run_external(&mut self, inv: Invocation<'_>) -> Result<i32, Unwind> {
        let name = inv.argv.first().cloned().unwrap_or_default();
        let path_value = inv
            .assignments
            .iter()
            .rev()
            .find(|(var, _)| var == "PATH")
            .map(|(_, value)| value.clone());
        let path = match self.find_program(&name, path_value) {
            Ok(path) => path,
            Err(err) => return self.fail(err),
        };

        let mut env = self.vars.exported();
        env.extend(inv.assignments.iter().cloned());
        let launch = Launch {
            path: &path,
            argv: &inv.argv,
            env: &env,
            pgid: None,
        };

        if check_exec_optimization(&self.exec_context(inv.flags), inv.raw_redirects) {
            return self.replace_process(&launch, &inv.redirects);
        }
        if self.job_control() {
            return self.fork_external(&launch, &inv.redirects);
        }

        let mark = match self
            .redirects
            .apply(&inv.redirects, Discipline::Temporary, self.options.noclobber)
        {
            Ok(mark) => mark,
            Err(err) => {
                self.report(&err);
                return Ok(err.status());
            }
        };
        let spawned = launcher::spawn(&launch, &self.config.fork_retry, &mut self.jobs);
        self.redirects.restore(mark);
        let pid = match spawned {
            Ok(pid) => pid,
            Err(err) => return self.fail(err),
        };
        let ctx = self.pipeline;
        let pgid = ctx.and_then(|c| c.pgid).unwrap_or(pid);
        self.jobs
            .post(pid, pgid, ctx.and_then(|c| c.job), false, inv.argv.join(" "));
        let status = self.jobs.wait_pid(pid);
        self.check_signals()?;
        Ok(status)
    }

    fn exec_context(&self, flags: ExecFlags) -> ExecOptContext {
        ExecOptContext {
            background: false,
            pipe_output: false,
            no_fork: flags.contains(ExecFlags::NO_FORK),
            fn_depth: self.fn_depth,
            forked: flags.contains(ExecFlags::FORKED),
            trap_dont_exec: self.in_trap || self.scopes.current().traps.forbids_exec(),
            in_subshell: self.subshell_depth > 0,
            in_eval: self.in_checkpoint(CheckpointKind::Eval),
            pipe_job: self.pipeline.is_some(),
            monitor: self.options.monitor,
            pipefail: self.options.pipefail,
            timing: self.timing > 0,
        }
    }

    /// Exec in place. Only returns when the exec failed, as an exit unwind.
    fn replace_process(
        &mut self,
        launch: &Launch<'_>,
        redirects: &[ResolvedRedirect],
    ) -> Result<i32, Unwind> {
        if let Err(err) = self
            .redirects
            .apply(redirects, Discipline::Permanent, self.options.noclobber)
        {
            self.report(&err);
            return Ok(err.status());
        }
        let err = exec_in_place(launch);
        self.report(&err);
        Err(Unwind::exit(err.status()))
    }

    /// Fork and exec so the child can join its own process group.
    fn fork_external(
        &mut self,
        launch: &Launch<'_>,
        redirects: &[ResolvedRedirect],
    ) -> Result<i32, Unwind> {
        let ctx = self.pipeline;
        let group = ctx.and_then(|c| c.pgid);
        match fork_process(&self.config.fork_retry, &mut self.jobs)? {
            Forked::Child => {
                launcher::join_group(getpid(), group.unwrap_or(Pid::from_raw(0)), true);
                reset_child_signals(ChildSignals {
                    job_control: true,
                    ignore_interrupts: false,
                });
                let err = match self
                    .redirects
                    .apply(redirects, Discipline::Permanent, self.options.noclobber)
                {
                    Ok(_) => exec_in_place(launch),
                    Err(err) => err,
                };
                self.report(&err);
                launcher::exit_child(err.status())
            }
            Forked::Parent(pid) => {
                let pgid = group.unwrap_or(pid);
                launcher::join_group(pid, pgid, true);
                self.jobs
                    .post(pid, pgid, ctx.and_then(|c| c.job), false, launch.argv.join(" "));
                let status = self.jobs.wait_pid(pid);
                launcher::reclaim_terminal();
                self.check_signals()?;
                Ok(status)
            }
        }
    }

    /// `set -x` output.
    fn trace(&self, assignments: &[(String, String)], argv: &[String]) {
        let prefix = self.vars.get("PS4").unwrap_or("+ ");
        let words: Vec<String> = assignments
            .iter()
            .map(|(name, value)| format!("{name}={}", quote(value)))
            .chain(argv.iter().map(|word| quote(word).into_owned()))
            .collect();
        let mut stderr = io::stderr().lock();
        let _ = writeln!(stderr, "{prefix}{}", words.join(" "));
        let _ = stderr.flush();
    }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
