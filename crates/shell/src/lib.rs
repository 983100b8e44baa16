// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tern-shell: the command execution engine.
//!
//! A [`Shell`] walks a [`tern_core::Node`] tree produced by a parser
//! collaborator and runs it: built-ins and functions in process, external
//! programs through fork/exec or spawn, pipelines as process groups.
//!
//! # Quick Start
//!
//! ```ignore
//! use tern_core::Node;
//! use tern_shell::Shell;
//!
//! let mut shell = Shell::builder().build();
//! let tree = Node::pipeline([Node::command(["echo", "hi"]), Node::command(["cat"])]);
//! shell.run(&tree);
//! std::process::exit(shell.finish());
//! ```
//!
//! # Components
//!
//! - Tree executor: [`Shell::execute`] and [`ExecFlags`]
//! - Command dispatcher: special built-in, function, built-in, program
//! - Scope manager: [`scope::ScopeStack`]
//! - Redirection manager: [`redirect::RedirectionManager`]
//! - Process launcher: [`launcher`]
//! - Job table: [`jobs::JobTable`]
//!
//! Non-local exits (`return`, `exit`, `set -e`, fatal errors) travel as
//! `Err(`[`Unwind`]`)` and are absorbed by checkpoints set up with
//! [`Shell::guarded`].

pub mod arith;
pub mod builtins;
mod cond;
mod dispatch;
mod error;
mod exec;
mod expand;
pub mod jobs;
pub mod launcher;
pub mod path;
pub mod pattern;
pub mod redirect;
pub mod scope;
mod shell;
pub mod signals;
#[cfg(test)]
mod test_support;
pub mod times;
pub mod traps;
pub mod unwind;
pub mod vars;

pub use builtins::{Builtin, BuiltinTable, FnBuiltin};
pub use error::ExecError;
pub use exec::ExecFlags;
pub use jobs::{JobId, JobTable};
pub use launcher::{check_exec_optimization, ExecOptContext};
pub use pattern::{GlobMatcher, PatternMatcher};
pub use redirect::Discipline;
pub use shell::{FunctionEntry, ScriptParser, Shell, ShellBuilder, DEFAULT_PATH};
pub use traps::{Trap, TrapCondition};
pub use unwind::{Catch, CheckpointKind, JumpLevel, Unwind, UnwindKind};
