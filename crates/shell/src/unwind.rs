// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structured non-local control transfer.
//!
//! Anything that abandons the normal flow of execution (`return`, `exit`,
//! `set -e`, fatal errors, runaway recursion, interrupts) travels up the Rust
//! stack as `Err(Unwind)`. Checkpoints established with
//! [`Shell::guarded`](crate::Shell::guarded) decide by [`JumpLevel`] whether
//! to absorb an unwind or let it continue.

use std::fmt;

use tern_core::status;

use crate::error::ExecError;

/// Severity of an unwind. Higher levels travel further.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum JumpLevel {
    Dot,
    Eval,
    Trap,
    /// Abandon the current command (interactive errors).
    Cmd,
    /// `return`
    Fun,
    /// Recursion limit, handled by the outermost function boundary.
    ErrFn,
    Sub,
    ErrExit,
    Exit,
}

#[derive(Debug)]
pub enum UnwindKind {
    Return,
    Exit,
    ErrExit,
    TooDeep { name: String },
    Interrupt,
    /// A fatal error whose diagnostic has already been printed.
    Abort,
    /// An error not yet reported; the nearest command boundary reports it
    /// and decides its severity.
    Error(ExecError),
}

/// A non-local transfer of control with the status it carries.
#[derive(Debug)]
pub struct Unwind {
    pub kind: UnwindKind,
    pub level: JumpLevel,
    pub status: i32,
}

impl Unwind {
    pub fn ret(status: i32) -> Self {
        Self {
            kind: UnwindKind::Return,
            level: JumpLevel::Fun,
            status,
        }
    }

    pub fn exit(status: i32) -> Self {
        Self {
            kind: UnwindKind::Exit,
            level: JumpLevel::Exit,
            status,
        }
    }

    pub fn errexit(status: i32) -> Self {
        Self {
            kind: UnwindKind::ErrExit,
            level: JumpLevel::ErrExit,
            status,
        }
    }

    pub fn too_deep(name: impl Into<String>) -> Self {
        Self {
            kind: UnwindKind::TooDeep { name: name.into() },
            level: JumpLevel::ErrFn,
            status: status::FAILURE,
        }
    }

    pub fn interrupt(signal: i32) -> Self {
        Self {
            kind: UnwindKind::Interrupt,
            level: JumpLevel::Exit,
            status: status::from_signal(signal),
        }
    }

    pub fn abort(status: i32, level: JumpLevel) -> Self {
        Self {
            kind: UnwindKind::Abort,
            level,
            status,
        }
    }
}

impl From<ExecError> for Unwind {
    fn from(err: ExecError) -> Self {
        Self {
            status: err.status(),
            kind: UnwindKind::Error(err),
            level: JumpLevel::Cmd,
        }
    }
}

impl fmt::Display for Unwind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            UnwindKind::Return => write!(f, "return {}", self.status),
            UnwindKind::Exit => write!(f, "exit {}", self.status),
            UnwindKind::ErrExit => write!(f, "errexit {}", self.status),
            UnwindKind::TooDeep { name } => write!(f, "{name}: recursion too deep"),
            UnwindKind::Interrupt => f.write_str("interrupted"),
            UnwindKind::Abort => write!(f, "aborted with status {}", self.status),
            UnwindKind::Error(err) => err.fmt(f),
        }
    }
}

/// Which unwinds a checkpoint absorbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Catch {
    /// Everything at or below the level.
    UpTo(JumpLevel),
    /// Exactly one level.
    Only(JumpLevel),
    All,
}

impl Catch {
    pub fn catches(self, level: JumpLevel) -> bool {
        match self {
            Catch::UpTo(max) => level <= max,
            Catch::Only(exact) => level == exact,
            Catch::All => true,
        }
    }
}

/// What kind of boundary a checkpoint marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointKind {
    TopLevel,
    Function,
    Source,
    Eval,
    Trap,
    Subshell,
}

#[cfg(test)]
#[path = "unwind_tests.rs"]
mod tests;
