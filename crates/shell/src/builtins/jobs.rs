// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `wait` and `jobs`.

use nix::unistd::Pid;
use tern_core::status;

use crate::error::ExecError;
use crate::jobs::JobId;
use crate::shell::Shell;
use crate::unwind::Unwind;

use super::print;

/// A `wait` operand: a process id or `%n`.
enum Target {
    Pid(Pid),
    Job(JobId),
}

fn target(arg: &str) -> Result<Target, ExecError> {
    let bad = || ExecError::usage(format!("{arg}: bad process or job id"));
    match arg.strip_prefix('%') {
        Some(job) => job.parse().map(|n| Target::Job(JobId(n))).map_err(|_| bad()),
        None => arg.parse().map(|n| Target::Pid(Pid::from_raw(n))).map_err(|_| bad()),
    }
}

/// `wait [pid|%job...]`. Without operands every known child is waited for
/// and the status is 0; otherwise the status is that of the last operand.
pub(super) fn wait(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let operands = argv.get(1..).unwrap_or_default();
    if operands.is_empty() {
        sh.jobs.wait_all();
        sh.check_signals()?;
        return Ok(status::SUCCESS);
    }
    let mut last = status::SUCCESS;
    for arg in operands {
        last = match target(arg)? {
            Target::Pid(pid) => sh.jobs.wait_pid(pid),
            Target::Job(job) => {
                let result = sh.jobs.wait_job(job).unwrap_or(status::NOT_FOUND);
                sh.jobs.release(job);
                sh.jobs.prune();
                result
            }
        };
        sh.check_signals()?;
    }
    Ok(last)
}

/// `jobs [-p]`
pub(super) fn jobs(sh: &mut Shell, argv: &[String]) -> Result<i32, Unwind> {
    let pids_only = match argv.get(1).map(String::as_str) {
        Some("-p") => true,
        Some(flag) => return Err(ExecError::usage(format!("{flag}: unknown option")).into()),
        None => false,
    };
    let listing: String = sh
        .jobs
        .list()
        .iter()
        .map(|job| match job.pids.first() {
            Some(pid) if pids_only => format!("{pid}\n"),
            _ => format!("{job}\n"),
        })
        .collect();
    print(&listing)?;
    Ok(status::SUCCESS)
}
