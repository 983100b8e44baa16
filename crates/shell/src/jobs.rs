// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job table: every child process the shell started, grouped into jobs.
//!
//! Entries live in an arena indexed by [`ProcHandle`]; a job's processes are
//! chained through `next` in pipeline order. Child termination is observed
//! either by a blocking wait or by [`JobTable::reap`], which the shell calls
//! at safe points after a `SIGCHLD` notice. While the table is locked
//! (pipeline construction) a notice only marks a reap as deferred.

use std::fmt;

use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;
use tracing::debug;

use tern_core::status;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Index of a process entry in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcHandle(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcState {
    Running,
    Stopped(i32),
    Exited(i32),
    Signaled { signal: i32, core: bool },
}

impl ProcState {
    pub fn is_terminal(self) -> bool {
        matches!(self, ProcState::Exited(_) | ProcState::Signaled { .. })
    }

    /// Exit status as the shell reports it, `None` while running.
    pub fn status(self) -> Option<i32> {
        match self {
            ProcState::Running => None,
            ProcState::Exited(code) => Some(code),
            ProcState::Stopped(signal) | ProcState::Signaled { signal, .. } => {
                Some(status::from_signal(signal))
            }
        }
    }

    fn from_wait(wait: WaitStatus) -> Option<Self> {
        match wait {
            WaitStatus::Exited(_, code) => Some(ProcState::Exited(code)),
            WaitStatus::Signaled(_, signal, core) => Some(ProcState::Signaled {
                signal: signal as i32,
                core,
            }),
            WaitStatus::Stopped(_, signal) => Some(ProcState::Stopped(signal as i32)),
            WaitStatus::Continued(_) => Some(ProcState::Running),
            _ => None,
        }
    }
}

impl fmt::Display for ProcState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcState::Running => f.write_str("Running"),
            ProcState::Stopped(_) => f.write_str("Stopped"),
            ProcState::Exited(0) => f.write_str("Done"),
            ProcState::Exited(code) => write!(f, "Done({code})"),
            ProcState::Signaled { signal, core } => {
                let name = Signal::try_from(*signal)
                    .map(|s| s.as_str().trim_start_matches("SIG").to_string())
                    .unwrap_or_else(|_| signal.to_string());
                if *core {
                    write!(f, "{name}(coredump)")
                } else {
                    f.write_str(&name)
                }
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProcessEntry {
    pub pid: Pid,
    pub pgid: Pid,
    pub job: JobId,
    pub state: ProcState,
    pub background: bool,
    pub command: String,
    /// A `wait` consumed the status.
    waited: bool,
    /// `jobs` showed the final state.
    reported: bool,
    next: Option<ProcHandle>,
}

/// One line of `jobs` output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSummary {
    pub id: JobId,
    pub pids: Vec<Pid>,
    pub state: ProcState,
    pub command: String,
}

impl fmt::Display for JobSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]  {}\t{}", self.id.0, self.state, self.command)
    }
}

#[derive(Debug, Default)]
pub struct JobTable {
    procs: Vec<Option<ProcessEntry>>,
    free: Vec<usize>,
    critical: u32,
    deferred: bool,
}

impl JobTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a started process. With `job: None` a new job is allocated
    /// using the smallest free id.
    pub fn post(
        &mut self,
        pid: Pid,
        pgid: Pid,
        job: Option<JobId>,
        background: bool,
        command: impl Into<String>,
    ) -> JobId {
        if !self.is_locked() {
            self.prune();
        }
        let job = job.unwrap_or_else(|| self.free_job_id());
        let entry = ProcessEntry {
            pid,
            pgid,
            job,
            state: ProcState::Running,
            background,
            command: command.into(),
            waited: false,
            reported: false,
            next: None,
        };
        let tail = self.handles(job).last();
        let handle = match self.free.pop() {
            Some(slot) => {
                self.procs[slot] = Some(entry);
                ProcHandle(slot)
            }
            None => {
                self.procs.push(Some(entry));
                ProcHandle(self.procs.len() - 1)
            }
        };
        if let Some(tail) = tail.and_then(|ProcHandle(i)| self.procs[i].as_mut()) {
            tail.next = Some(handle);
        }
        debug!(%pid, %job, background, "posted process");
        job
    }

    /// Enter a critical section; `SIGCHLD` reaping is deferred until the
    /// matching [`unlock`](Self::unlock).
    pub fn lock(&mut self) {
        self.critical += 1;
    }

    pub fn unlock(&mut self) {
        self.critical = self.critical.saturating_sub(1);
        if self.critical == 0 && self.deferred {
            self.deferred = false;
            self.reap();
        }
    }

    pub fn is_locked(&self) -> bool {
        self.critical > 0
    }

    /// A child-termination notice arrived.
    pub fn notify(&mut self) {
        if self.is_locked() {
            self.deferred = true;
        } else {
            self.reap();
        }
    }

    /// Collect state changes without blocking. Returns how many processes
    /// changed state.
    pub fn reap(&mut self) -> usize {
        let mut changed = 0;
        for entry in self.procs.iter_mut().flatten() {
            if entry.state.is_terminal() {
                continue;
            }
            let flags = WaitPidFlag::WNOHANG | WaitPidFlag::WUNTRACED;
            let state = match waitpid(entry.pid, Some(flags)) {
                Ok(WaitStatus::StillAlive) => continue,
                Ok(wait) => ProcState::from_wait(wait),
                Err(Errno::ECHILD) => Some(ProcState::Exited(status::NOT_FOUND)),
                Err(errno) => {
                    debug!(pid = %entry.pid, %errno, "reap failed");
                    continue;
                }
            };
            if let Some(state) = state {
                if state != entry.state {
                    debug!(pid = %entry.pid, ?state, "reaped");
                    entry.state = state;
                    changed += 1;
                }
            }
        }
        changed
    }

    /// Block until `pid` finishes or stops. Unknown pids give 127.
    pub fn wait_pid(&mut self, pid: Pid) -> i32 {
        let Some(handle) = self.find(pid) else {
            return status::NOT_FOUND;
        };
        let state = self.wait_handle(handle);
        self.prune();
        state.status().unwrap_or(status::NOT_FOUND)
    }

    /// Block until every process of `job` finishes; the job's status is the
    /// last process's status.
    pub fn wait_job(&mut self, job: JobId) -> Option<i32> {
        let handles: Vec<_> = self.handles(job).collect();
        let mut last = None;
        for handle in handles {
            last = self.wait_handle(handle).status();
        }
        last
    }

    /// Statuses of `job`'s processes in pipeline order, `None` for running
    /// ones.
    pub fn statuses(&self, job: JobId) -> Vec<Option<i32>> {
        self.handles(job)
            .filter_map(|ProcHandle(i)| self.procs[i].as_ref())
            .map(|entry| entry.state.status())
            .collect()
    }

    /// Mark every process of `job` as waited so the next prune drops it once
    /// it is done.
    pub fn release(&mut self, job: JobId) {
        let handles: Vec<_> = self.handles(job).collect();
        for ProcHandle(i) in handles {
            if let Some(entry) = self.procs[i].as_mut() {
                entry.waited = true;
            }
        }
    }

    /// Wait for every known child.
    pub fn wait_all(&mut self) {
        let live: Vec<_> = self
            .procs
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ProcHandle(i))
            .collect();
        for handle in live {
            self.wait_handle(handle);
        }
        self.prune();
    }

    /// Forget jobs whose status can no longer be asked for: every process
    /// is done and the job was either waited for or shown by `jobs`.
    pub fn prune(&mut self) {
        let done: Vec<JobId> = self
            .job_ids()
            .into_iter()
            .filter(|job| {
                let entries: Vec<&ProcessEntry> = self.entries(*job).collect();
                entries.iter().all(|e| e.state.is_terminal())
                    && entries.iter().any(|e| e.waited || e.reported)
            })
            .collect();
        for job in done {
            self.remove_job(job);
        }
    }

    /// Snapshot for `jobs`; finished background jobs count as reported.
    pub fn list(&mut self) -> Vec<JobSummary> {
        self.reap();
        let summaries: Vec<JobSummary> = self
            .job_ids()
            .into_iter()
            .filter_map(|job| {
                let entries: Vec<&ProcessEntry> = self.entries(job).collect();
                let last = entries.last()?;
                Some(JobSummary {
                    id: job,
                    pids: entries.iter().map(|e| e.pid).collect(),
                    state: last.state,
                    command: last.command.clone(),
                })
            })
            .collect();
        for entry in self.procs.iter_mut().flatten() {
            if entry.state.is_terminal() {
                entry.reported = true;
            }
        }
        self.prune();
        summaries
    }

    pub fn find(&self, pid: Pid) -> Option<ProcHandle> {
        self.procs
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.pid == pid))
            .map(ProcHandle)
    }

    pub fn get(&self, handle: ProcHandle) -> Option<&ProcessEntry> {
        self.procs.get(handle.0).and_then(Option::as_ref)
    }

    pub fn job_exists(&self, job: JobId) -> bool {
        self.entries(job).next().is_some()
    }

    pub fn len(&self) -> usize {
        self.procs.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry without waiting; a forked child does not own its
    /// parent's jobs.
    pub fn clear(&mut self) {
        self.procs.clear();
        self.free.clear();
        self.critical = 0;
        self.deferred = false;
    }

    fn wait_handle(&mut self, handle: ProcHandle) -> ProcState {
        loop {
            let Some(entry) = self.procs.get_mut(handle.0).and_then(Option::as_mut) else {
                return ProcState::Exited(status::NOT_FOUND);
            };
            if entry.state.is_terminal() {
                entry.waited = true;
                return entry.state;
            }
            match waitpid(entry.pid, Some(WaitPidFlag::WUNTRACED)) {
                Ok(wait) => {
                    if let Some(state) = ProcState::from_wait(wait) {
                        debug!(pid = %entry.pid, ?state, "waited");
                        entry.state = state;
                        if let ProcState::Stopped(_) = state {
                            return state;
                        }
                    }
                }
                Err(Errno::EINTR) => continue,
                Err(errno) => {
                    debug!(pid = %entry.pid, %errno, "wait failed");
                    entry.state = ProcState::Exited(status::NOT_FOUND);
                }
            }
        }
    }

    fn handles(&self, job: JobId) -> impl Iterator<Item = ProcHandle> + '_ {
        let first = self
            .procs
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.job == job))
            .map(ProcHandle);
        let mut first = first.and_then(|head| self.head_of(head));
        std::iter::from_fn(move || {
            let current = first?;
            first = self.procs[current.0].as_ref().and_then(|e| e.next);
            Some(current)
        })
    }

    /// Walk back to the process no other entry links to.
    fn head_of(&self, member: ProcHandle) -> Option<ProcHandle> {
        let mut head = member;
        while let Some(prev) = self
            .procs
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|e| e.next == Some(head)))
        {
            head = ProcHandle(prev);
        }
        Some(head)
    }

    fn entries(&self, job: JobId) -> impl Iterator<Item = &ProcessEntry> + '_ {
        self.handles(job)
            .filter_map(move |ProcHandle(i)| self.procs[i].as_ref())
    }

    fn job_ids(&self) -> Vec<JobId> {
        let mut ids: Vec<JobId> = self.procs.iter().flatten().map(|e| e.job).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    fn free_job_id(&self) -> JobId {
        let used = self.job_ids();
        (1..)
            .map(JobId)
            .find(|id| !used.contains(id))
            .unwrap_or(JobId(1))
    }

    fn remove_job(&mut self, job: JobId) {
        for (i, slot) in self.procs.iter_mut().enumerate() {
            if slot.as_ref().is_some_and(|e| e.job == job) {
                *slot = None;
                self.free.push(i);
            }
        }
        debug!(%job, "forgot job");
    }
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
