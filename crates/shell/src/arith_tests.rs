// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use tern_core::ast::{ArithExpr, ArithOp, ArithUnaryOp};

use super::*;

fn bin(op: ArithOp, lhs: i64, rhs: i64) -> ArithExpr {
    ArithExpr::binary(op, ArithExpr::num(lhs), ArithExpr::num(rhs))
}

#[yare::parameterized(
    add       = { bin(ArithOp::Add, 2, 3), 5 },
    sub       = { bin(ArithOp::Sub, 2, 3), -1 },
    mul       = { bin(ArithOp::Mul, 4, 5), 20 },
    div       = { bin(ArithOp::Div, 7, 2), 3 },
    rem       = { bin(ArithOp::Rem, -7, 2), -1 },
    shl       = { bin(ArithOp::Shl, 1, 4), 16 },
    shr       = { bin(ArithOp::Shr, 16, 2), 4 },
    bit_and   = { bin(ArithOp::BitAnd, 6, 3), 2 },
    bit_xor   = { bin(ArithOp::BitXor, 6, 3), 5 },
    lt        = { bin(ArithOp::Lt, 1, 2), 1 },
    ge        = { bin(ArithOp::Ge, 1, 2), 0 },
    and_short = { bin(ArithOp::And, 0, 9), 0 },
    or_short  = { bin(ArithOp::Or, 3, 0), 1 },
    overflow  = { bin(ArithOp::Add, i64::MAX, 1), i64::MIN },
    min_div   = { bin(ArithOp::Div, i64::MIN, -1), i64::MIN },
)]
fn binary_operators(expr: ArithExpr, expected: i64) {
    let mut vars = Variables::new();
    assert_eq!(eval(&expr, &mut vars).unwrap(), expected);
}

#[test]
fn unary_operators() {
    let mut vars = Variables::new();
    let not = ArithExpr::Unary {
        op: ArithUnaryOp::Not,
        expr: Box::new(ArithExpr::num(0)),
    };
    let neg = ArithExpr::Unary {
        op: ArithUnaryOp::Neg,
        expr: Box::new(ArithExpr::num(5)),
    };
    let inv = ArithExpr::Unary {
        op: ArithUnaryOp::BitNot,
        expr: Box::new(ArithExpr::num(0)),
    };
    assert_eq!(eval(&not, &mut vars).unwrap(), 1);
    assert_eq!(eval(&neg, &mut vars).unwrap(), -5);
    assert_eq!(eval(&inv, &mut vars).unwrap(), -1);
}

#[test]
fn division_by_zero_is_an_error() {
    let mut vars = Variables::new();
    let err = eval(&bin(ArithOp::Rem, 1, 0), &mut vars).unwrap_err();
    assert!(matches!(err, ExecError::Arith(ArithError::DivisionByZero)));
}

#[test]
fn assignment_and_increment_write_back() {
    let mut vars = Variables::new();
    vars.set("i", "0x10").unwrap();

    let post = ArithExpr::incr("i", 1);
    assert_eq!(eval(&post, &mut vars).unwrap(), 16);
    assert_eq!(vars.get("i"), Some("17"));

    let pre = ArithExpr::Incr {
        name: "i".into(),
        delta: -1,
        post: false,
    };
    assert_eq!(eval(&pre, &mut vars).unwrap(), 16);

    let compound = ArithExpr::Assign {
        name: "i".into(),
        op: Some(ArithOp::Mul),
        value: Box::new(ArithExpr::num(3)),
    };
    assert_eq!(eval(&compound, &mut vars).unwrap(), 48);
    assert_eq!(vars.get("i"), Some("48"));
}

#[test]
fn unset_and_empty_variables_read_as_zero() {
    let mut vars = Variables::new();
    vars.set("empty", "").unwrap();
    let expr = ArithExpr::binary(ArithOp::Add, ArithExpr::var("missing"), ArithExpr::var("empty"));
    assert_eq!(eval(&expr, &mut vars).unwrap(), 0);
}

#[test]
fn non_numeric_variable_is_rejected() {
    let mut vars = Variables::new();
    vars.set("word", "abc").unwrap();
    let err = eval(&ArithExpr::var("word"), &mut vars).unwrap_err();
    assert!(matches!(err, ExecError::Arith(ArithError::BadNumber { .. })));
}

#[test]
fn conditional_evaluates_one_branch() {
    let mut vars = Variables::new();
    let expr = ArithExpr::Cond {
        test: Box::new(ArithExpr::num(0)),
        then: Box::new(ArithExpr::assign("hit", ArithExpr::num(1))),
        otherwise: Box::new(ArithExpr::num(7)),
    };
    assert_eq!(eval(&expr, &mut vars).unwrap(), 7);
    assert!(!vars.is_set("hit"));
}

#[yare::parameterized(
    decimal  = { "42", 42 },
    negative = { "-7", -7 },
    spaced   = { " 3 ", 3 },
    hex      = { "0xff", 255 },
    based    = { "8#17", 15 },
    binary   = { "2#101", 5 },
    empty    = { "", 0 },
)]
fn parses_numbers(text: &str, expected: i64) {
    assert_eq!(parse_number(text), Ok(expected));
}

#[yare::parameterized(
    word      = { "ten" },
    bad_base  = { "1#0" },
    bad_digit = { "8#9" },
)]
fn rejects_numbers(text: &str) {
    assert!(parse_number(text).is_err());
}

proptest! {
    #[test]
    fn formatted_numbers_parse_back(n in any::<i64>()) {
        prop_assert_eq!(parse_number(&n.to_string()), Ok(n));
    }
}
