// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `[[ ... ]]` evaluation.

use std::fs::{self, Metadata};
use std::os::unix::fs::{FileTypeExt, MetadataExt};
use std::path::Path;

use nix::unistd::{access, isatty, AccessFlags};
use tern_core::ast::{TestBinaryOp, TestExpr, TestUnaryOp};
use tern_core::is_identifier;

use crate::arith::parse_number;
use crate::error::ExecError;
use crate::shell::Shell;

impl Shell {
    pub fn eval_test(&mut self, expr: &TestExpr) -> Result<bool, ExecError> {
        match expr {
            TestExpr::Not(inner) => Ok(!self.eval_test(inner)?),
            TestExpr::And(lhs, rhs) => Ok(self.eval_test(lhs)? && self.eval_test(rhs)?),
            TestExpr::Or(lhs, rhs) => Ok(self.eval_test(lhs)? || self.eval_test(rhs)?),
            TestExpr::Unary { op, operand } => {
                let operand = self.expand_text(operand)?;
                Ok(self.unary(*op, &operand))
            }
            TestExpr::Binary { op, lhs, rhs, raw } => {
                let lhs = self.expand_text(lhs)?;
                let rhs = self.expand_text(rhs)?;
                self.binary(*op, &lhs, &rhs, *raw)
            }
        }
    }

    fn unary(&self, op: TestUnaryOp, operand: &str) -> bool {
        match op {
            TestUnaryOp::NonEmpty => !operand.is_empty(),
            TestUnaryOp::Empty => operand.is_empty(),
            TestUnaryOp::VarSet => self.param_is_set(operand),
            TestUnaryOp::OptionSet => self.options.get(operand).unwrap_or(false),
            TestUnaryOp::Terminal => operand
                .parse::<i32>()
                .ok()
                .and_then(|fd| isatty(fd).ok())
                .unwrap_or(false),
            TestUnaryOp::Readable => permitted(operand, AccessFlags::R_OK),
            TestUnaryOp::Writable => permitted(operand, AccessFlags::W_OK),
            TestUnaryOp::Executable => permitted(operand, AccessFlags::X_OK),
            TestUnaryOp::Symlink => fs::symlink_metadata(operand)
                .map(|m| m.file_type().is_symlink())
                .unwrap_or(false),
            TestUnaryOp::Exists => fs::metadata(operand).is_ok(),
            TestUnaryOp::Regular => file_is(operand, Metadata::is_file),
            TestUnaryOp::Directory => file_is(operand, Metadata::is_dir),
            TestUnaryOp::Fifo => file_is(operand, |m| m.file_type().is_fifo()),
            TestUnaryOp::NonEmptyFile => file_is(operand, |m| m.len() > 0),
        }
    }

    fn binary(&mut self, op: TestBinaryOp, lhs: &str, rhs: &str, raw: bool) -> Result<bool, ExecError> {
        Ok(match op {
            TestBinaryOp::Match => self.string_matches(lhs, rhs, raw),
            TestBinaryOp::NotMatch => !self.string_matches(lhs, rhs, raw),
            TestBinaryOp::Before => lhs < rhs,
            TestBinaryOp::After => lhs > rhs,
            TestBinaryOp::IntEq => self.integer(lhs)? == self.integer(rhs)?,
            TestBinaryOp::IntNe => self.integer(lhs)? != self.integer(rhs)?,
            TestBinaryOp::IntLt => self.integer(lhs)? < self.integer(rhs)?,
            TestBinaryOp::IntLe => self.integer(lhs)? <= self.integer(rhs)?,
            TestBinaryOp::IntGt => self.integer(lhs)? > self.integer(rhs)?,
            TestBinaryOp::IntGe => self.integer(lhs)? >= self.integer(rhs)?,
            TestBinaryOp::NewerThan => match (modified(lhs), modified(rhs)) {
                (Some(a), Some(b)) => a > b,
                (Some(_), None) => true,
                _ => false,
            },
            TestBinaryOp::OlderThan => match (modified(lhs), modified(rhs)) {
                (Some(a), Some(b)) => a < b,
                (None, Some(_)) => true,
                _ => false,
            },
            TestBinaryOp::SameFile => match (fs::metadata(lhs), fs::metadata(rhs)) {
                (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
                _ => false,
            },
        })
    }

    fn string_matches(&self, subject: &str, pattern: &str, raw: bool) -> bool {
        if raw {
            subject == pattern
        } else {
            self.matcher.matches(subject, pattern)
        }
    }

    /// Integer operand; a bare name stands for the variable's value.
    fn integer(&mut self, text: &str) -> Result<i64, ExecError> {
        let text = text.trim();
        if is_identifier(text) {
            let value = self.param(text)?;
            return Ok(parse_number(value.trim())?);
        }
        Ok(parse_number(text)?)
    }
}

fn permitted(path: &str, mode: AccessFlags) -> bool {
    !path.is_empty() && access(Path::new(path), mode).is_ok()
}

fn file_is(path: &str, check: impl Fn(&Metadata) -> bool) -> bool {
    fs::metadata(path).map(|m| check(&m)).unwrap_or(false)
}

fn modified(path: &str) -> Option<std::time::SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

#[cfg(test)]
#[path = "cond_tests.rs"]
mod tests;
