// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conditionals, loops, arithmetic, `time` and redirection wrappers.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use tern_core::ast::{ArithCommand, CaseClause, ForLoop, IfClause, Node, Redirect, WhileLoop};
use tern_core::{cumulative_format, format_times, status, Times};
use tracing::debug;

use crate::arith;
use crate::error::ExecError;
use crate::redirect::Discipline;
use crate::scope::LoopState;
use crate::shell::Shell;
use crate::times;
use crate::traps::TrapCondition;
use crate::unwind::Unwind;

use super::ExecFlags;

impl Shell {
    pub(super) fn exec_if(&mut self, clause: &IfClause, flags: ExecFlags) -> Result<i32, Unwind> {
        let test = self.execute(&clause.test, flags.condition())?;
        if self.loops().pending != 0 {
            return Ok(test);
        }
        if test == status::SUCCESS {
            self.execute(&clause.then, flags)
        } else if let Some(otherwise) = &clause.otherwise {
            self.execute(otherwise, flags)
        } else {
            Ok(status::SUCCESS)
        }
    }

    pub(super) fn exec_case(&mut self, clause: &CaseClause, flags: ExecFlags) -> Result<i32, Unwind> {
        let subject = self.expand_text(&clause.subject)?;
        let mut status = status::SUCCESS;
        let mut matched = false;
        for arm in &clause.arms {
            if !matched {
                for pattern in &arm.patterns {
                    let text = self.expand_text(&pattern.word)?;
                    let hit = if pattern.raw {
                        text == subject
                    } else {
                        self.matcher.matches(&subject, &text)
                    };
                    if hit {
                        matched = true;
                        break;
                    }
                }
            }
            if matched {
                if let Some(body) = &arm.body {
                    status = self.execute(body, flags)?;
                }
                if !arm.fallthrough {
                    break;
                }
            }
        }
        Ok(status)
    }

    pub(super) fn exec_for(&mut self, lp: &ForLoop, flags: ExecFlags) -> Result<i32, Unwind> {
        let values = match &lp.words {
            Some(words) => self.expand_words(words)?,
            None => self.scopes.current().positionals.clone(),
        };
        self.enter_loop();
        let result = self.for_body(lp, values, flags.inner());
        self.leave_loop();
        result
    }

    fn for_body(&mut self, lp: &ForLoop, values: Vec<String>, flags: ExecFlags) -> Result<i32, Unwind> {
        let mut status = status::SUCCESS;
        for value in values {
            self.vars.set(&lp.var, value)?;
            if let Some(trap_status) = self.run_trap(TrapCondition::Debug)? {
                if trap_status == 2 {
                    continue;
                }
            }
            status = self.execute(&lp.body, flags)?;
            if self.after_pass() {
                break;
            }
        }
        Ok(status)
    }

    pub(super) fn exec_while(&mut self, lp: &WhileLoop, flags: ExecFlags) -> Result<i32, Unwind> {
        self.enter_loop();
        let result = self.while_body(lp, flags);
        self.leave_loop();
        result
    }

    fn while_body(&mut self, lp: &WhileLoop, flags: ExecFlags) -> Result<i32, Unwind> {
        let mut status = status::SUCCESS;
        loop {
            let test = self.execute(&lp.test, flags.condition())?;
            if self.loops().pending != 0 || (test == status::SUCCESS) == lp.until {
                break;
            }
            status = self.execute(&lp.body, flags.inner())?;
            if self.after_pass() {
                break;
            }
            if let Some(step) = &lp.step {
                arith::eval(step, &mut self.vars)?;
            }
        }
        Ok(status)
    }

    fn loops(&self) -> LoopState {
        self.scopes.current().loops
    }

    fn enter_loop(&mut self) {
        self.scopes.current_mut().loops.depth += 1;
    }

    fn leave_loop(&mut self) {
        let loops = &mut self.scopes.current_mut().loops;
        loops.depth = loops.depth.saturating_sub(1);
        if loops.pending > 0 {
            loops.pending -= 1;
        }
    }

    /// Account for one finished body pass. Returns whether the loop ends.
    fn after_pass(&mut self) -> bool {
        let loops = &mut self.scopes.current_mut().loops;
        if loops.pending < 0 {
            loops.pending += 1;
        }
        loops.pending != 0
    }

    pub(super) fn exec_arith(&mut self, cmd: &ArithCommand) -> Result<i32, Unwind> {
        let value = arith::eval(&cmd.expr, &mut self.vars)?;
        Ok(if value != 0 {
            status::SUCCESS
        } else {
            status::FAILURE
        })
    }

    pub(super) fn exec_time(&mut self, body: Option<&Node>, flags: ExecFlags) -> Result<i32, Unwind> {
        let format = match self.vars.get("TIMEFORMAT") {
            Some(format) => format.to_string(),
            None => self.config.time_format.clone(),
        };
        let Some(body) = body else {
            let (shell, children) = times::shell_and_children();
            let spent = Times {
                real: Duration::ZERO,
                user: shell.user + children.user,
                sys: shell.sys + children.sys,
            };
            let text = format_times(cumulative_format(&format), &spent).map_err(ExecError::from)?;
            emit_times(&text);
            return Ok(status::SUCCESS);
        };

        let started = Instant::now();
        let before = times::total();
        self.timing += 1;
        let result = self.execute(body, flags.inner());
        self.timing -= 1;
        let status = result?;
        let spent = times::total().saturating_sub(before);
        let measured = Times {
            real: started.elapsed(),
            user: spent.user,
            sys: spent.sys,
        };
        debug!(real = ?measured.real, status, "timed");
        let text = format_times(&format, &measured).map_err(ExecError::from)?;
        emit_times(&text);
        Ok(status)
    }

    pub(super) fn exec_redirected(
        &mut self,
        redirects: &[Redirect],
        body: &Node,
        flags: ExecFlags,
    ) -> Result<i32, Unwind> {
        let resolved = self.resolve_redirects(redirects)?;
        let noclobber = self.options.noclobber;
        let mark = match self.redirects.apply(&resolved, Discipline::Temporary, noclobber) {
            Ok(mark) => mark,
            Err(err) => {
                self.report(&err);
                return Ok(err.status());
            }
        };
        let result = self.execute(body, flags.inner());
        self.redirects.restore(mark);
        result
    }
}

fn emit_times(text: &str) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "{text}");
    let _ = stderr.flush();
}
