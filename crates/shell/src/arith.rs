// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Evaluation of `(( ... ))` expression trees.
//!
//! Integers are 64-bit and wrap on overflow. A variable that is unset or
//! empty reads as 0; any other value must be a number (`42`, `-7`, `0x1f`,
//! `8#17`).

use thiserror::Error;

use tern_core::ast::{ArithExpr, ArithOp, ArithUnaryOp};

use crate::error::ExecError;
use crate::vars::Variables;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArithError {
    #[error("divide by zero")]
    DivisionByZero,
    #[error("{value}: arithmetic syntax error")]
    BadNumber { value: String },
}

/// Evaluate `expr`, assigning through `vars`.
pub fn eval(expr: &ArithExpr, vars: &mut Variables) -> Result<i64, ExecError> {
    match expr {
        ArithExpr::Num(n) => Ok(*n),
        ArithExpr::Var(name) => read(vars, name),
        ArithExpr::Unary { op, expr } => {
            let value = eval(expr, vars)?;
            Ok(match op {
                ArithUnaryOp::Neg => value.wrapping_neg(),
                ArithUnaryOp::Not => i64::from(value == 0),
                ArithUnaryOp::BitNot => !value,
            })
        }
        ArithExpr::Binary { op, lhs, rhs } => match op {
            ArithOp::And => {
                if eval(lhs, vars)? == 0 {
                    return Ok(0);
                }
                Ok(i64::from(eval(rhs, vars)? != 0))
            }
            ArithOp::Or => {
                if eval(lhs, vars)? != 0 {
                    return Ok(1);
                }
                Ok(i64::from(eval(rhs, vars)? != 0))
            }
            _ => {
                let left = eval(lhs, vars)?;
                let right = eval(rhs, vars)?;
                Ok(apply(*op, left, right)?)
            }
        },
        ArithExpr::Assign { name, op, value } => {
            let rhs = eval(value, vars)?;
            let result = match op {
                Some(op) => apply(*op, read(vars, name)?, rhs)?,
                None => rhs,
            };
            vars.set(name, result.to_string())?;
            Ok(result)
        }
        ArithExpr::Incr { name, delta, post } => {
            let old = read(vars, name)?;
            let new = old.wrapping_add(*delta);
            vars.set(name, new.to_string())?;
            Ok(if *post { old } else { new })
        }
        ArithExpr::Cond {
            test,
            then,
            otherwise,
        } => {
            if eval(test, vars)? != 0 {
                eval(then, vars)
            } else {
                eval(otherwise, vars)
            }
        }
    }
}

fn read(vars: &Variables, name: &str) -> Result<i64, ExecError> {
    match vars.get(name) {
        None => Ok(0),
        Some(text) => Ok(parse_number(text)?),
    }
}

fn apply(op: ArithOp, left: i64, right: i64) -> Result<i64, ArithError> {
    Ok(match op {
        ArithOp::Add => left.wrapping_add(right),
        ArithOp::Sub => left.wrapping_sub(right),
        ArithOp::Mul => left.wrapping_mul(right),
        ArithOp::Div => {
            if right == 0 {
                return Err(ArithError::DivisionByZero);
            }
            left.wrapping_div(right)
        }
        ArithOp::Rem => {
            if right == 0 {
                return Err(ArithError::DivisionByZero);
            }
            left.wrapping_rem(right)
        }
        ArithOp::Shl => left.wrapping_shl(right as u32),
        ArithOp::Shr => left.wrapping_shr(right as u32),
        ArithOp::BitAnd => left & right,
        ArithOp::BitOr => left | right,
        ArithOp::BitXor => left ^ right,
        ArithOp::Lt => i64::from(left < right),
        ArithOp::Le => i64::from(left <= right),
        ArithOp::Gt => i64::from(left > right),
        ArithOp::Ge => i64::from(left >= right),
        ArithOp::Eq => i64::from(left == right),
        ArithOp::Ne => i64::from(left != right),
        ArithOp::And => i64::from(left != 0 && right != 0),
        ArithOp::Or => i64::from(left != 0 || right != 0),
    })
}

/// Parse a shell integer. Empty text is 0.
pub fn parse_number(text: &str) -> Result<i64, ArithError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    let bad = || ArithError::BadNumber {
        value: text.to_string(),
    };
    let (negative, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let (radix, digits) = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        (16, hex)
    } else if let Some((base, rest)) = digits.split_once('#') {
        let base: u32 = base.parse().map_err(|_| bad())?;
        if !(2..=36).contains(&base) {
            return Err(bad());
        }
        (base, rest)
    } else {
        (10, digits)
    };
    let magnitude = u64::from_str_radix(digits, radix).map_err(|_| bad())? as i64;
    Ok(if negative {
        magnitude.wrapping_neg()
    } else {
        magnitude
    })
}

#[cfg(test)]
#[path = "arith_tests.rs"]
mod tests;
