// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tree executor.
//!
//! [`Shell::execute`] walks a command tree recursively. Every call is a safe
//! point: pending `break`/`continue` short-circuit it and pending signals
//! are drained before the node runs. Non-local exits travel as
//! `Err(Unwind)`.

mod compound;
mod function;
mod pipeline;
mod subshell;

use bitflags::bitflags;
use tern_core::ast::{Node, Redirect};
use tern_core::status;

use crate::error::ExecError;
use crate::redirect::ResolvedRedirect;
use crate::shell::Shell;
use crate::traps::TrapCondition;
use crate::unwind::{Unwind, UnwindKind};

bitflags! {
    /// Context a node executes in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExecFlags: u8 {
        /// A failure here runs the ERR trap and honours `set -e`.
        const ERREXIT = 1 << 0;
        /// Nothing runs after this node in the current process.
        const NO_FORK = 1 << 1;
        /// The last thing a forked child does. Always paired with `NO_FORK`.
        const FORKED = 1 << 2;
    }
}

impl ExecFlags {
    /// Flags for a condition (`if`/`while` tests, `&&` left side, `!`).
    pub fn condition(self) -> Self {
        self - (ExecFlags::ERREXIT | ExecFlags::NO_FORK | ExecFlags::FORKED)
    }

    /// Flags for a node that is followed by more work.
    pub fn inner(self) -> Self {
        self - (ExecFlags::NO_FORK | ExecFlags::FORKED)
    }
}

impl Shell {
    /// Execute `node` and return its exit status.
    pub fn execute(&mut self, node: &Node, flags: ExecFlags) -> Result<i32, Unwind> {
        if self.scopes.current().loops.pending != 0 {
            return Ok(self.exit_status);
        }
        self.check_signals()?;
        let location = node.location();
        if !location.is_unknown() {
            self.lineno = location.line_number();
        }
        if self.options.noexec && !self.config.interactive {
            return Ok(status::SUCCESS);
        }

        let result = match node {
            Node::Simple(cmd) => self.dispatch(cmd, flags),
            Node::Sequence(nodes) => self.exec_sequence(nodes, flags),
            Node::And(left, right) => {
                let status = self.execute(left, flags.condition())?;
                if status == status::SUCCESS {
                    self.execute(right, flags)
                } else {
                    Ok(status)
                }
            }
            Node::Or(left, right) => {
                let status = self.execute(left, flags.condition())?;
                if status == status::SUCCESS {
                    Ok(status)
                } else {
                    self.execute(right, flags)
                }
            }
            Node::Not(body) => self
                .execute(body, flags.condition())
                .map(status::negate),
            Node::If(clause) => self.exec_if(clause, flags),
            Node::Case(clause) => self.exec_case(clause, flags),
            Node::For(lp) => self.exec_for(lp, flags),
            Node::While(lp) => self.exec_while(lp, flags),
            Node::Arith(cmd) => self.exec_arith(cmd),
            Node::Test(cmd) => self
                .eval_test(&cmd.expr)
                .map(|result| {
                    if result != cmd.negate {
                        status::SUCCESS
                    } else {
                        status::FAILURE
                    }
                })
                .map_err(Unwind::from),
            Node::Time(body) => self.exec_time(body.as_deref(), flags),
            Node::Function(def) => {
                self.define_function(def.name.clone(), def.body.clone(), def.location);
                Ok(status::SUCCESS)
            }
            Node::Redirect(cmd) => self.exec_redirected(&cmd.redirects, &cmd.body, flags),
            Node::Pipeline(stages) => self.exec_pipeline(stages, flags),
            Node::Subshell(body) => self.exec_subshell(body, flags),
            Node::Fork(cmd) => self.exec_fork(cmd, flags),
        };

        let status = match result {
            Ok(status) => status,
            Err(Unwind {
                kind: UnwindKind::Error(err),
                ..
            }) => self.fail(err)?,
            Err(unwind) => return Err(unwind),
        };
        self.exit_status = status;

        if status != status::SUCCESS && flags.contains(ExecFlags::ERREXIT) && checks_errexit(node) {
            self.run_trap(TrapCondition::Err)?;
            if self.options.errexit {
                return Err(Unwind::errexit(status));
            }
        }
        Ok(status)
    }

    fn exec_sequence(&mut self, nodes: &[Node], flags: ExecFlags) -> Result<i32, Unwind> {
        let Some((last, init)) = nodes.split_last() else {
            return Ok(status::SUCCESS);
        };
        for node in init {
            self.execute(node, flags.inner())?;
        }
        self.execute(last, flags)
    }

    /// Expand redirection targets.
    pub(crate) fn resolve_redirects(
        &mut self,
        redirects: &[Redirect],
    ) -> Result<Vec<ResolvedRedirect>, ExecError> {
        redirects
            .iter()
            .map(|redirect| {
                let target = self.expand_text(&redirect.target)?;
                Ok(ResolvedRedirect::new(redirect.target_fd(), redirect.op, target))
            })
            .collect()
    }
}

/// Node kinds whose failure counts for `set -e` and the ERR trap.
fn checks_errexit(node: &Node) -> bool {
    matches!(
        node,
        Node::Simple(_)
            | Node::Pipeline(_)
            | Node::Subshell(_)
            | Node::Fork(_)
            | Node::Redirect(_)
            | Node::Time(_)
            | Node::Arith(_)
            | Node::Test(_)
    )
}

/// Command text recorded in the job table.
pub(crate) fn describe(node: &Node) -> String {
    match node {
        Node::Simple(cmd) => {
            let words: Vec<String> = cmd.words.iter().map(ToString::to_string).collect();
            words.join(" ")
        }
        Node::Fork(fork) => describe(&fork.body),
        Node::Redirect(cmd) => describe(&cmd.body),
        Node::Pipeline(stages) => stages
            .iter()
            .map(describe)
            .collect::<Vec<_>>()
            .join(" | "),
        other => other.kind_name().to_string(),
    }
}

#[cfg(test)]
#[path = "../exec_tests/mod.rs"]
mod tests;
