// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Exit status conventions shared by the engine and the CLI.
//!
//! | status  | meaning                              |
//! |---------|--------------------------------------|
//! | 0       | success                              |
//! | 1..=125 | command-defined failure              |
//! | 126     | found but not executable             |
//! | 127     | not found                            |
//! | 128+N   | terminated (or stopped) by signal N  |

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
/// Usage errors reported by built-ins.
pub const USAGE: i32 = 2;
pub const NOT_EXECUTABLE: i32 = 126;
pub const NOT_FOUND: i32 = 127;
pub const SIGNAL_BASE: i32 = 128;

/// Status of a process terminated by `signal`.
pub fn from_signal(signal: i32) -> i32 {
    SIGNAL_BASE + signal
}

/// The signal number encoded in a status, if any.
pub fn signal_of(status: i32) -> Option<i32> {
    (status > SIGNAL_BASE && status < SIGNAL_BASE + 65).then(|| status - SIGNAL_BASE)
}

/// Logical negation used by `!` and `[[ ! ]]`.
pub fn negate(status: i32) -> i32 {
    if status == SUCCESS {
        FAILURE
    } else {
        SUCCESS
    }
}

/// Status as seen by a parent: only the low 8 bits survive `exit`.
pub fn truncate(status: i32) -> i32 {
    status & 0xff
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
