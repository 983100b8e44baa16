// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CPU time sampling for `time` and `times`.

use std::time::Duration;

use nix::sys::resource::{getrusage, UsageWho};
use nix::sys::time::TimeVal;

/// User and system CPU time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: Duration,
    pub sys: Duration,
}

impl CpuTimes {
    pub fn saturating_sub(self, earlier: CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user.saturating_sub(earlier.user),
            sys: self.sys.saturating_sub(earlier.sys),
        }
    }

    fn add(self, other: CpuTimes) -> CpuTimes {
        CpuTimes {
            user: self.user + other.user,
            sys: self.sys + other.sys,
        }
    }
}

/// Times of the shell itself and of its waited-for children.
pub fn shell_and_children() -> (CpuTimes, CpuTimes) {
    (usage(UsageWho::RUSAGE_SELF), usage(UsageWho::RUSAGE_CHILDREN))
}

/// Shell plus children, the total `time` measures against.
pub fn total() -> CpuTimes {
    let (shell, children) = shell_and_children();
    shell.add(children)
}

fn usage(who: UsageWho) -> CpuTimes {
    match getrusage(who) {
        Ok(usage) => CpuTimes {
            user: to_duration(usage.user_time()),
            sys: to_duration(usage.system_time()),
        },
        Err(_) => CpuTimes::default(),
    }
}

fn to_duration(tv: TimeVal) -> Duration {
    let secs = u64::try_from(tv.tv_sec()).unwrap_or(0);
    let micros = u32::try_from(tv.tv_usec()).unwrap_or(0);
    Duration::from_secs(secs) + Duration::from_micros(u64::from(micros))
}

/// `times` output line: `1m2.500s 0m0.010s`.
pub fn format_pair(times: CpuTimes) -> String {
    format!("{} {}", minutes(times.user), minutes(times.sys))
}

fn minutes(d: Duration) -> String {
    let total_ms = d.as_millis();
    let mins = total_ms / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{mins}m{secs}.{millis:03}s")
}

#[cfg(test)]
#[path = "times_tests.rs"]
mod tests;
