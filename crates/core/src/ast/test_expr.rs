// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

use super::Word;

/// Expression inside `[[ ... ]]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestExpr {
    Unary {
        op: TestUnaryOp,
        operand: Word,
    },
    Binary {
        op: TestBinaryOp,
        lhs: Word,
        rhs: Word,
        /// Right-hand side was quoted: `==` compares literally.
        #[serde(default)]
        raw: bool,
    },
    Not(Box<TestExpr>),
    And(Box<TestExpr>, Box<TestExpr>),
    Or(Box<TestExpr>, Box<TestExpr>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestUnaryOp {
    /// `-n`
    NonEmpty,
    /// `-z`
    Empty,
    /// `-e`, `-a`
    Exists,
    /// `-f`
    Regular,
    /// `-d`
    Directory,
    /// `-L`, `-h`
    Symlink,
    /// `-p`
    Fifo,
    /// `-s`
    NonEmptyFile,
    /// `-r`
    Readable,
    /// `-w`
    Writable,
    /// `-x`
    Executable,
    /// `-t fd`
    Terminal,
    /// `-v name`
    VarSet,
    /// `-o option`
    OptionSet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestBinaryOp {
    /// `==`, `=`: pattern match unless raw
    Match,
    /// `!=`
    NotMatch,
    /// `<`
    Before,
    /// `>`
    After,
    IntEq,
    IntNe,
    IntLt,
    IntLe,
    IntGt,
    IntGe,
    /// `-nt`
    NewerThan,
    /// `-ot`
    OlderThan,
    /// `-ef`
    SameFile,
}

impl TestExpr {
    pub fn unary(op: TestUnaryOp, operand: impl Into<Word>) -> Self {
        TestExpr::Unary {
            op,
            operand: operand.into(),
        }
    }

    pub fn binary(op: TestBinaryOp, lhs: impl Into<Word>, rhs: impl Into<Word>) -> Self {
        TestExpr::Binary {
            op,
            lhs: lhs.into(),
            rhs: rhs.into(),
            raw: false,
        }
    }
}
