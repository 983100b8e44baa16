// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipelines.
//!
//! Every stage but the last is forked left to right, each child reading the
//! previous pipe and writing a new one. The last stage runs in the shell
//! with its standard input attached to the final pipe, so `a | read x`
//! style constructs affect the current shell.

use std::os::fd::OwnedFd;

use nix::fcntl::OFlag;
use nix::unistd::{getpid, pipe2, Pid};
use tern_core::ast::Node;
use tern_core::status;
use tracing::debug;

use crate::error::ExecError;
use crate::launcher::{self, fork_process, reset_child_signals, ChildSignals, Forked};
use crate::shell::{PipelineCtx, Shell};
use crate::unwind::Unwind;

use super::{describe, ExecFlags};

impl Shell {
    pub(super) fn exec_pipeline(&mut self, stages: &[Node], flags: ExecFlags) -> Result<i32, Unwind> {
        let Some((last, rest)) = stages.split_last() else {
            return Ok(status::SUCCESS);
        };
        if rest.is_empty() {
            return self.execute(last, flags.inner());
        }
        let outer = self.pipeline;
        self.jobs.lock();
        let result = self.run_pipeline(rest, last, flags);
        self.jobs.unlock();
        self.pipeline = outer;
        self.jobs.prune();
        result
    }

    fn run_pipeline(&mut self, rest: &[Node], last: &Node, flags: ExecFlags) -> Result<i32, Unwind> {
        let job_control = self.job_control();
        let mut ctx = PipelineCtx {
            job: None,
            pgid: None,
        };
        let mut input: Option<OwnedFd> = None;
        for stage in rest {
            let (read, write) =
                pipe2(OFlag::O_CLOEXEC).map_err(|errno| ExecError::Io(errno.into()))?;
            match fork_process(&self.config.fork_retry, &mut self.jobs)? {
                Forked::Child => {
                    drop(read);
                    self.enter_child();
                    if job_control {
                        launcher::join_group(getpid(), ctx.pgid.unwrap_or(Pid::from_raw(0)), true);
                    }
                    reset_child_signals(ChildSignals {
                        job_control,
                        ignore_interrupts: false,
                    });
                    if let Err(err) = self.wire_stage(input.take(), write) {
                        self.report(&err);
                        launcher::exit_child(status::FAILURE);
                    }
                    self.run_in_child(stage)
                }
                Forked::Parent(pid) => {
                    let pgid = ctx.pgid.unwrap_or(pid);
                    if job_control {
                        launcher::join_group(pid, pgid, true);
                    }
                    ctx.pgid = Some(pgid);
                    ctx.job = Some(self.jobs.post(pid, pgid, ctx.job, false, describe(stage)));
                    drop(write);
                    input = Some(read);
                }
            }
        }
        let Some(job) = ctx.job else {
            return self.execute(last, flags.inner());
        };
        debug!(%job, stages = rest.len() + 1, "pipeline started");

        let mark = self.redirects.mark();
        if let Some(input) = input {
            if let Err(err) = self.redirects.attach(0, input) {
                self.jobs.release(job);
                return Err(err.into());
            }
        }
        self.pipeline = Some(ctx);
        let result = self.execute(last, flags & (ExecFlags::NO_FORK | ExecFlags::FORKED));
        self.redirects.restore(mark);
        let last_status = match result {
            Ok(status) => status,
            Err(unwind) => {
                self.jobs.release(job);
                return Err(unwind);
            }
        };

        let mut status = last_status;
        if self.options.pipefail || self.options.monitor || self.timing > 0 {
            self.jobs.wait_job(job);
            if self.options.pipefail {
                let earlier: Vec<i32> = self
                    .jobs
                    .statuses(job)
                    .into_iter()
                    .take(rest.len())
                    .map(|s| s.unwrap_or(status::SUCCESS))
                    .collect();
                status = pipefail_status(&earlier, last_status);
            }
        }
        if job_control {
            launcher::reclaim_terminal();
        }
        self.jobs.release(job);
        Ok(status)
    }

    /// Connect a forked stage to its pipes.
    fn wire_stage(&mut self, input: Option<OwnedFd>, output: OwnedFd) -> Result<(), ExecError> {
        if let Some(input) = input {
            let mark = self.redirects.attach(0, input)?;
            self.redirects.forget(mark);
        }
        let mark = self.redirects.attach(1, output)?;
        self.redirects.forget(mark);
        Ok(())
    }
}

/// Rightmost non-zero status, or zero.
pub(crate) fn pipefail_status(earlier: &[i32], last: i32) -> i32 {
    std::iter::once(last)
        .chain(earlier.iter().rev().copied())
        .find(|s| *s != status::SUCCESS)
        .unwrap_or(status::SUCCESS)
}
