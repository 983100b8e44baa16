// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subshells and forked commands.
//!
//! A `( ... )` subshell normally runs in the same process: the interpreter
//! state it may change is saved first and put back afterwards. Forked
//! commands (`&` and anything that must run in its own process) go through
//! [`fork_process`] and re-enter the executor in the child.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Write};
use std::os::fd::OwnedFd;
use std::path::PathBuf;

use nix::unistd::{getpid, Pid};
use tern_core::ast::{ForkCommand, Node};
use tern_core::{status, ShellOptions};
use tracing::debug;

use crate::error::ExecError;
use crate::launcher::{self, fork_process, reset_child_signals, ChildSignals, Forked};
use crate::redirect::FdSnapshot;
use crate::scope::ScopeStack;
use crate::shell::{FunctionEntry, Shell};
use crate::unwind::{Catch, CheckpointKind, Unwind, UnwindKind};
use crate::vars::Variables;

use super::{describe, ExecFlags};

/// Interpreter state a virtual subshell must not leak.
struct Saved {
    vars: Variables,
    functions: HashMap<String, FunctionEntry>,
    scopes: ScopeStack,
    options: ShellOptions,
    cwd: Option<PathBuf>,
    fds: FdSnapshot,
    last_bg_pid: Option<Pid>,
    last_arg: String,
}

impl Shell {
    pub(super) fn exec_subshell(&mut self, body: &Node, flags: ExecFlags) -> Result<i32, Unwind> {
        let traps = self.scopes.current().traps.clone();
        if flags.contains(ExecFlags::NO_FORK)
            && (flags.contains(ExecFlags::FORKED) || !traps.forbids_exec())
        {
            // Nothing follows in this process, so there is nothing to restore.
            self.scopes.current_mut().traps = traps.for_subshell();
            self.reseed();
            return self.execute(body, flags);
        }
        self.virtual_subshell(body, flags)
    }

    fn virtual_subshell(&mut self, body: &Node, flags: ExecFlags) -> Result<i32, Unwind> {
        let saved = Saved {
            vars: self.vars.clone(),
            functions: self.functions.clone(),
            scopes: self.scopes.clone(),
            options: self.options,
            cwd: std::env::current_dir().ok(),
            fds: FdSnapshot::capture()?,
            last_bg_pid: self.last_bg_pid,
            last_arg: self.last_arg.clone(),
        };
        self.subshell_depth += 1;
        self.reseed();
        let traps = self.scopes.current().traps.for_subshell();
        self.scopes.current_mut().traps = traps;
        debug!(depth = self.subshell_depth, "enter subshell");

        let result = self.guarded(CheckpointKind::Subshell, Catch::All, |sh| {
            sh.execute(body, flags.inner())
        });
        let mut outcome = match result {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(unwind)) | Err(unwind) => self.subshell_unwind(unwind),
        };
        if let Some(status) = outcome.as_ref().ok().copied() {
            self.exit_status = status;
            if let Some(status) = self.run_exit_trap() {
                outcome = Ok(status);
            }
        }

        self.subshell_depth -= 1;
        self.leave_subshell(saved);
        debug!(depth = self.subshell_depth, "leave subshell");
        outcome
    }

    /// How an unwind that reached the subshell boundary ends it.
    fn subshell_unwind(&mut self, unwind: Unwind) -> Result<i32, Unwind> {
        match unwind.kind {
            UnwindKind::Error(err) => {
                self.report(&err);
                Ok(err.status())
            }
            UnwindKind::Interrupt => Err(unwind),
            _ => Ok(unwind.status),
        }
    }

    fn leave_subshell(&mut self, saved: Saved) {
        self.vars = saved.vars;
        self.functions = saved.functions;
        self.scopes = saved.scopes;
        self.options = saved.options;
        self.last_bg_pid = saved.last_bg_pid;
        self.last_arg = saved.last_arg;
        if let Some(cwd) = saved.cwd {
            if std::env::current_dir().ok().as_ref() != Some(&cwd) {
                if let Err(err) = std::env::set_current_dir(&cwd) {
                    self.report(&format_args!("{}: cannot restore directory [{err}]", cwd.display()));
                }
            }
        }
        saved.fds.restore();
        self.path.forget();
        self.generation += 1;
    }

    pub(super) fn exec_fork(&mut self, cmd: &ForkCommand, flags: ExecFlags) -> Result<i32, Unwind> {
        if !cmd.background && flags.contains(ExecFlags::FORKED | ExecFlags::NO_FORK) {
            return self.execute(&cmd.body, flags);
        }
        let job_control = self.job_control();
        let background = cmd.background;
        match fork_process(&self.config.fork_retry, &mut self.jobs)? {
            Forked::Child => {
                self.enter_child();
                if job_control {
                    launcher::join_group(getpid(), Pid::from_raw(0), !background);
                }
                reset_child_signals(ChildSignals {
                    job_control,
                    ignore_interrupts: background && !job_control,
                });
                if background && !job_control {
                    if let Err(err) = self.stdin_from_null() {
                        self.report(&err);
                    }
                }
                self.run_in_child(&cmd.body)
            }
            Forked::Parent(pid) => {
                if job_control {
                    launcher::join_group(pid, pid, !background);
                }
                let job = self.jobs.post(pid, pid, None, background, describe(&cmd.body));
                if background {
                    self.last_bg_pid = Some(pid);
                    if self.config.interactive {
                        let mut stderr = io::stderr().lock();
                        let _ = writeln!(stderr, "[{}]\t{pid}", job.0);
                    }
                    return Ok(status::SUCCESS);
                }
                let status = self.jobs.wait_pid(pid);
                if job_control {
                    launcher::reclaim_terminal();
                }
                self.check_signals()?;
                Ok(status)
            }
        }
    }

    fn stdin_from_null(&mut self) -> Result<(), ExecError> {
        let null = File::open("/dev/null")?;
        let mark = self.redirects.attach(0, OwnedFd::from(null))?;
        self.redirects.forget(mark);
        Ok(())
    }

    /// Reset state a freshly forked child does not share with its parent.
    pub(super) fn enter_child(&mut self) {
        self.jobs.clear();
        self.subshell_depth = 0;
        self.pipeline = None;
        self.last_bg_pid = None;
        let traps = self.scopes.current().traps.for_subshell();
        self.scopes.current_mut().traps = traps;
        self.reseed();
    }

    /// Run `body` as the whole of a forked child and exit with its status.
    pub(super) fn run_in_child(&mut self, body: &Node) -> ! {
        let flags = ExecFlags::FORKED | ExecFlags::NO_FORK | ExecFlags::ERREXIT;
        let result = self.guarded(CheckpointKind::Subshell, Catch::All, |sh| sh.execute(body, flags));
        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(unwind)) | Err(unwind) => match unwind.kind {
                UnwindKind::Error(err) => {
                    self.report(&err);
                    err.status()
                }
                _ => unwind.status,
            },
        };
        self.exit_status = status;
        let status = self.run_exit_trap().unwrap_or(status);
        debug!(status, "child exiting");
        launcher::exit_child(status)
    }
}
