// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Arithmetic expression as produced by the parser.
///
/// Evaluation is 64-bit signed with wrapping on overflow; division by zero
/// is an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithExpr {
    Num(i64),
    Var(String),
    Unary {
        op: ArithUnaryOp,
        expr: Box<ArithExpr>,
    },
    Binary {
        op: ArithOp,
        lhs: Box<ArithExpr>,
        rhs: Box<ArithExpr>,
    },
    /// `name = value`, or `name op= value` when `op` is set.
    Assign {
        name: String,
        #[serde(default)]
        op: Option<ArithOp>,
        value: Box<ArithExpr>,
    },
    /// `++name`, `name--` and friends.
    Incr {
        name: String,
        delta: i64,
        #[serde(default)]
        post: bool,
    },
    Cond {
        test: Box<ArithExpr>,
        then: Box<ArithExpr>,
        #[serde(rename = "else")]
        otherwise: Box<ArithExpr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithUnaryOp {
    Neg,
    Not,
    BitNot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Shl,
    Shr,
    BitAnd,
    BitOr,
    BitXor,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    /// `&&`, short-circuit
    And,
    /// `||`, short-circuit
    Or,
}

impl ArithExpr {
    pub fn num(n: i64) -> Self {
        ArithExpr::Num(n)
    }

    pub fn var(name: impl Into<String>) -> Self {
        ArithExpr::Var(name.into())
    }

    pub fn binary(op: ArithOp, lhs: ArithExpr, rhs: ArithExpr) -> Self {
        ArithExpr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn assign(name: impl Into<String>, value: ArithExpr) -> Self {
        ArithExpr::Assign {
            name: name.into(),
            op: None,
            value: Box::new(value),
        }
    }

    /// `name += delta` style post-increment used by arithmetic `for` steps.
    pub fn incr(name: impl Into<String>, delta: i64) -> Self {
        ArithExpr::Incr {
            name: name.into(),
            delta,
            post: true,
        }
    }
}
