// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for command execution.

use std::io;

use tern_core::status;
use tern_core::TimeFormatError;
use thiserror::Error;

use crate::arith::ArithError;

/// Errors raised while executing a command tree.
///
/// Every error maps to an exit status via [`ExecError::status`] and to a
/// severity via [`ExecError::is_fatal`]. Fatal errors terminate a
/// non-interactive shell; the rest become a diagnostic plus a status.
#[derive(Debug, Error)]
pub enum ExecError {
    /// Command name did not resolve to a built-in, function or file.
    #[error("{name}: not found")]
    NotFound { name: String },

    /// A file was found but could not be executed.
    #[error("{name}: cannot execute [{reason}]")]
    NotExecutable { name: String, reason: String },

    /// Starting a process failed for a reason other than the two above.
    #[error("{name}: cannot spawn: {source}")]
    Spawn {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Process creation kept failing after every retry.
    #[error("cannot fork: {0}")]
    ForkFailed(nix::errno::Errno),

    #[error("{target}: cannot open [{source}]")]
    Redirect {
        target: String,
        #[source]
        source: io::Error,
    },

    #[error("{target}: file already exists")]
    Clobber { target: String },

    #[error("{target}: bad file descriptor")]
    BadDescriptor { target: String },

    #[error(transparent)]
    Arith(#[from] ArithError),

    #[error("{name}: parameter not set")]
    Unset { name: String },

    #[error("{name}: is read only")]
    ReadOnly { name: String },

    #[error("{0}: invalid variable name")]
    InvalidName(String),

    #[error("{value}: bad number")]
    BadNumber { value: String },

    /// Nested function calls or sourced scripts exceeded the configured limit.
    #[error("{name}: recursion too deep")]
    TooDeep { name: String },

    #[error("{0}")]
    Usage(String),

    #[error("{0}: cannot change directory [{1}]")]
    Cd(String, #[source] io::Error),

    #[error("{0}: no script parser available")]
    NoParser(String),

    #[error("{0}")]
    Parse(String),

    #[error("{0}: bad trap")]
    BadTrap(String),

    #[error(transparent)]
    TimeFormat(#[from] TimeFormatError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ExecError {
    pub fn usage(message: impl Into<String>) -> Self {
        ExecError::Usage(message.into())
    }

    /// Exit status a command reports for this error.
    pub fn status(&self) -> i32 {
        match self {
            ExecError::NotFound { .. } => status::NOT_FOUND,
            ExecError::NotExecutable { .. } => status::NOT_EXECUTABLE,
            ExecError::Usage(_) => status::USAGE,
            _ => status::FAILURE,
        }
    }

    /// Whether the error aborts the current command list instead of just
    /// failing one command.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ExecError::ForkFailed(_)
                | ExecError::Arith(_)
                | ExecError::Unset { .. }
                | ExecError::ReadOnly { .. }
                | ExecError::BadNumber { .. }
                | ExecError::TooDeep { .. }
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
