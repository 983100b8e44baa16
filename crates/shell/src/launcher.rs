// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process creation: spawn, fork and in-place exec.
//!
//! Foreground external commands normally go through [`spawn`], which leaves
//! process creation to `std::process::Command`. Anything that must keep
//! running interpreter code in the child (pipeline stages, background jobs)
//! goes through [`fork_process`]. When the shell itself has nothing left to
//! do after a command, [`exec_in_place`] replaces the shell image.

use std::collections::BTreeMap;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::Command;
use std::thread;

use nix::errno::Errno;
use nix::sys::signal::{signal, SigHandler, Signal};
use nix::unistd::{fork, getpgrp, setpgid, tcsetpgrp, ForkResult, Pid};
use tracing::debug;

use tern_core::ast::{Redirect, RedirectOp};
use tern_core::ForkRetry;

use crate::error::ExecError;
use crate::jobs::JobTable;
use crate::redirect::flush_stdio;

/// Facts about the current execution context that decide whether a command
/// may replace the shell process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptContext {
    /// The command is started without being waited for.
    pub background: bool,
    /// The command's output feeds a pipe read by this shell.
    pub pipe_output: bool,
    /// Nothing runs after this command in the current process.
    pub no_fork: bool,
    pub fn_depth: usize,
    /// Already running in a forked child.
    pub forked: bool,
    /// A trap is installed that exec would skip, or a trap is running.
    pub trap_dont_exec: bool,
    /// Inside a virtual subshell whose state must be restored.
    pub in_subshell: bool,
    /// Under an `eval` checkpoint.
    pub in_eval: bool,
    /// The command is the in-process stage of a pipeline.
    pub pipe_job: bool,
    pub monitor: bool,
    pub pipefail: bool,
    /// Under `time`.
    pub timing: bool,
}

/// Whether a command may run by replacing the current process image
/// instead of forking.
pub fn check_exec_optimization(ctx: &ExecOptContext, redirects: &[Redirect]) -> bool {
    if ctx.background || ctx.pipe_output {
        return false;
    }
    if !((ctx.no_fork && ctx.fn_depth == 0) || ctx.forked) {
        return false;
    }
    if ctx.trap_dont_exec || ctx.in_subshell || ctx.in_eval {
        return false;
    }
    // Someone still needs this stage's pid and status.
    if ctx.pipe_job && (ctx.monitor || ctx.pipefail || ctx.timing) {
        return false;
    }
    !redirects
        .iter()
        .any(|r| r.op == RedirectOp::ReadWriteRewrite)
}

/// An external program ready to start.
#[derive(Debug, Clone, Copy)]
pub struct Launch<'a> {
    pub path: &'a Path,
    pub argv: &'a [String],
    pub env: &'a BTreeMap<String, String>,
    /// Process group to join; `Some(0)` starts a new group.
    pub pgid: Option<Pid>,
}

impl Launch<'_> {
    fn command(&self) -> Command {
        let mut command = Command::new(self.path);
        if let Some((arg0, args)) = self.argv.split_first() {
            command.arg0(arg0).args(args);
        }
        command.env_clear().envs(self.env);
        if let Some(pgid) = self.pgid {
            command.process_group(pgid.as_raw());
        }
        command
    }

    fn name(&self) -> String {
        self.argv
            .first()
            .cloned()
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// Start `launch` as a child process, retrying while the system is out of
/// processes.
pub fn spawn(launch: &Launch<'_>, retry: &ForkRetry, jobs: &mut JobTable) -> Result<Pid, ExecError> {
    flush_stdio();
    let mut delays = retry.delays();
    loop {
        match launch.command().spawn() {
            Ok(child) => {
                let pid = Pid::from_raw(child.id() as i32);
                debug!(%pid, command = %launch.name(), "spawned");
                return Ok(pid);
            }
            Err(err) if err.raw_os_error() == Some(Errno::EAGAIN as i32) => {
                let Some(delay) = delays.next() else {
                    return Err(ExecError::ForkFailed(Errno::EAGAIN));
                };
                debug!(?delay, "spawn refused, retrying");
                thread::sleep(delay);
                jobs.reap();
            }
            Err(err) => return Err(exec_failure(&launch.name(), err)),
        }
    }
}

/// Replace the current process with `launch`. Only returns on failure.
pub fn exec_in_place(launch: &Launch<'_>) -> ExecError {
    flush_stdio();
    debug!(command = %launch.name(), "exec in place");
    let err = launch.command().exec();
    exec_failure(&launch.name(), err)
}

fn exec_failure(name: &str, err: io::Error) -> ExecError {
    match err.kind() {
        io::ErrorKind::NotFound => ExecError::NotFound {
            name: name.to_string(),
        },
        io::ErrorKind::PermissionDenied => ExecError::NotExecutable {
            name: name.to_string(),
            reason: err.to_string(),
        },
        _ => match err.raw_os_error() {
            Some(code) if code == Errno::ENOEXEC as i32 => ExecError::NotExecutable {
                name: name.to_string(),
                reason: err.to_string(),
            },
            _ => ExecError::Spawn {
                name: name.to_string(),
                source: err,
            },
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Forked {
    Child,
    Parent(Pid),
}

/// Fork the shell, retrying with backoff on `EAGAIN`.
pub fn fork_process(retry: &ForkRetry, jobs: &mut JobTable) -> Result<Forked, ExecError> {
    flush_stdio();
    let mut delays = retry.delays();
    loop {
        match fork_once() {
            Ok(ForkResult::Child) => return Ok(Forked::Child),
            Ok(ForkResult::Parent { child }) => {
                debug!(pid = %child, "forked");
                return Ok(Forked::Parent(child));
            }
            Err(Errno::EAGAIN) => {
                let Some(delay) = delays.next() else {
                    return Err(ExecError::ForkFailed(Errno::EAGAIN));
                };
                debug!(?delay, "fork refused, retrying");
                thread::sleep(delay);
                jobs.reap();
            }
            Err(errno) => return Err(ExecError::ForkFailed(errno)),
        }
    }
}

#[allow(unsafe_code)]
fn fork_once() -> nix::Result<ForkResult> {
    // SAFETY: the interpreter runs on one thread; the child either keeps
    // running the interpreter on that thread or execs.
    unsafe { fork() }
}

/// End a forked child with `status`. Buffered built-in output is written
/// first since the child never returns to the caller's loop.
pub fn exit_child(status: i32) -> ! {
    flush_stdio();
    std::process::exit(status & 0xff)
}

/// Signal dispositions a forked child starts with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildSignals {
    /// Job control is on: stop signals get their default action back.
    pub job_control: bool,
    /// Background job without job control: keyboard signals are ignored.
    pub ignore_interrupts: bool,
}

pub fn reset_child_signals(setup: ChildSignals) {
    if setup.job_control {
        for sig in [Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU] {
            set_disposition(sig, SigHandler::SigDfl);
        }
    }
    if setup.ignore_interrupts {
        for sig in [Signal::SIGINT, Signal::SIGQUIT] {
            set_disposition(sig, SigHandler::SigIgn);
        }
    }
}

/// Stop signals are ignored by a job-control shell so that only its
/// children stop.
pub fn ignore_stop_signals() {
    for sig in [Signal::SIGTSTP, Signal::SIGTTIN, Signal::SIGTTOU] {
        set_disposition(sig, SigHandler::SigIgn);
    }
}

#[allow(unsafe_code)]
fn set_disposition(sig: Signal, handler: SigHandler) {
    // SAFETY: only the default and ignore dispositions are installed here;
    // no Rust code runs in signal context.
    if let Err(errno) = unsafe { signal(sig, handler) } {
        debug!(signal = sig.as_str(), %errno, "cannot change signal disposition");
    }
}

/// Put `pid` in group `pgid` (0 for its own) and optionally hand it the
/// terminal. Called from both sides of a fork.
pub fn join_group(pid: Pid, pgid: Pid, foreground: bool) {
    if let Err(errno) = setpgid(pid, pgid) {
        debug!(%pid, %pgid, %errno, "setpgid failed");
    }
    if foreground {
        let group = if pgid.as_raw() == 0 { pid } else { pgid };
        if let Err(errno) = tcsetpgrp(io::stdin(), group) {
            debug!(%group, %errno, "tcsetpgrp failed");
        }
    }
}

/// Give the terminal back to the shell's own process group after a
/// foreground job.
pub fn reclaim_terminal() {
    let group = getpgrp();
    if let Err(errno) = tcsetpgrp(io::stdin(), group) {
        debug!(%group, %errno, "cannot reclaim terminal");
    }
}

#[cfg(test)]
#[path = "launcher_tests.rs"]
mod tests;
