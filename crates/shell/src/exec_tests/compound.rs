// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tern_core::ast::{ArithExpr, ArithOp, CaseArm, CasePattern, ForLoop, WhileLoop, Word};
use yare::parameterized;

use super::*;
use crate::test_support::Recorder;

fn recording_shell() -> (Shell, Recorder) {
    let recorder = Recorder::default();
    let mut sh = shell();
    sh.register_builtin(recorder.clone());
    (sh, recorder)
}

#[parameterized(
    then_branch = { true, "then" },
    else_branch = { false, "else" },
)]
fn if_picks_a_branch(test: bool, expected: &str) {
    let (mut sh, recorder) = recording_shell();
    let tree = Node::if_then(
        truth(test),
        line("record then"),
        Some(line("record else")),
    );
    assert_eq!(sh.run(&tree), 0);
    assert_eq!(recorder.entries(), vec![expected.to_string()]);
}

#[test]
fn if_without_else_succeeds_when_test_fails() {
    let mut sh = shell();
    sh.run(&line("false"));
    assert_eq!(sh.run(&Node::if_then(truth(false), truth(false), None)), 0);
}

#[test]
fn for_iterates_words_in_order() {
    let (mut sh, recorder) = recording_shell();
    let tree = Node::for_in("v", ["a", "b", "c"], line("record $v"));
    assert_eq!(sh.run(&tree), 0);
    assert_eq!(recorder.entries(), ["a", "b", "c"]);
    assert_eq!(sh.var("v"), Some("c"));
}

#[test]
fn for_without_words_walks_positionals() {
    let (mut sh, recorder) = recording_shell();
    sh.run(&line("set -- x y"));
    let tree = Node::For(ForLoop {
        var: "v".into(),
        words: None,
        body: Box::new(line("record $v")),
        location: Default::default(),
    });
    sh.run(&tree);
    assert_eq!(recorder.entries(), ["x", "y"]);
}

#[test]
fn for_over_nothing_succeeds() {
    let mut sh = shell();
    sh.run(&line("false"));
    let tree = Node::for_in("v", Vec::<&str>::new(), line("false"));
    assert_eq!(sh.run(&tree), 0);
}

#[test]
fn while_runs_until_the_test_fails() {
    let (mut sh, recorder) = recording_shell();
    let tree = WhileLoop::arith_for(
        ArithExpr::assign("i", ArithExpr::num(0)),
        ArithExpr::binary(ArithOp::Lt, ArithExpr::var("i"), ArithExpr::num(3)),
        ArithExpr::incr("i", 1),
        line("record $i"),
    );
    assert_eq!(sh.run(&tree), 0);
    assert_eq!(recorder.entries(), ["0", "1", "2"]);
    assert_eq!(sh.var("i"), Some("3"));
}

#[test]
fn until_runs_while_the_test_fails() {
    let (mut sh, recorder) = recording_shell();
    sh.run(&line("n=0"));
    let test = Node::arith(ArithExpr::binary(ArithOp::Ge, ArithExpr::var("n"), ArithExpr::num(2)));
    let body = Node::sequence([
        line("record $n"),
        Node::arith(ArithExpr::incr("n", 1)),
    ]);
    sh.run(&Node::until_do(test, body));
    assert_eq!(recorder.entries(), ["0", "1"]);
}

#[test]
fn break_leaves_the_innermost_loop() {
    let (mut sh, recorder) = recording_shell();
    let inner = Node::for_in(
        "j",
        ["1", "2"],
        Node::sequence([line("record $i $j"), line("break"), line("record unreachable")]),
    );
    let tree = Node::for_in("i", ["a", "b"], inner);
    sh.run(&tree);
    assert_eq!(recorder.entries(), ["a 1", "b 1"]);
    assert_eq!(sh.scopes.current().loops, Default::default());
}

#[test]
fn break_with_a_count_leaves_outer_loops() {
    let (mut sh, recorder) = recording_shell();
    let inner = Node::for_in("j", ["1", "2"], Node::sequence([line("record $i $j"), line("break 2")]));
    let tree = Node::sequence([Node::for_in("i", ["a", "b"], inner), line("record after")]);
    sh.run(&tree);
    assert_eq!(recorder.entries(), ["a 1", "after"]);
}

#[test]
fn break_count_is_clamped_to_the_nesting_depth() {
    let (mut sh, recorder) = recording_shell();
    let tree = Node::sequence([
        Node::for_in("i", ["a", "b"], line("break 9")),
        line("record after"),
    ]);
    sh.run(&tree);
    assert_eq!(recorder.entries(), ["after"]);
    assert_eq!(sh.scopes.current().loops.pending, 0);
}

#[test]
fn continue_skips_the_rest_of_the_pass() {
    let (mut sh, recorder) = recording_shell();
    let body = Node::sequence([line("record $i"), line("continue"), line("record skipped")]);
    sh.run(&Node::for_in("i", ["a", "b"], body));
    assert_eq!(recorder.entries(), ["a", "b"]);
}

#[test]
fn continue_with_a_count_resumes_the_outer_loop() {
    let (mut sh, recorder) = recording_shell();
    let inner = Node::for_in(
        "j",
        ["1", "2"],
        Node::sequence([line("record $i $j"), line("continue 2")]),
    );
    let body = Node::sequence([inner, line("record skipped")]);
    sh.run(&Node::for_in("i", ["a", "b"], body));
    assert_eq!(recorder.entries(), ["a 1", "b 1"]);
}

#[test]
fn break_outside_a_loop_does_nothing() {
    let (mut sh, recorder) = recording_shell();
    sh.run(&script(&["break", "record still-here"]));
    assert_eq!(recorder.entries(), ["still-here"]);
}

#[test]
fn break_rejects_a_zero_count() {
    let mut sh = shell();
    let tree = Node::for_in("i", ["a"], line("break 0"));
    assert_ne!(sh.run(&tree), 0);
}

#[test]
fn break_inside_a_function_does_not_reach_the_callers_loop() {
    let (mut sh, recorder) = recording_shell();
    let tree = Node::sequence([
        Node::function("f", line("break")),
        Node::for_in("i", ["a", "b"], Node::sequence([line("f"), line("record $i")])),
    ]);
    sh.run(&tree);
    assert_eq!(recorder.entries(), ["a", "b"]);
}

fn arm(pattern: &str, body: &str) -> CaseArm {
    CaseArm::new([pattern], Some(line(body)))
}

#[parameterized(
    literal = { "apple", "fruit" },
    glob = { "beet", "root" },
    alternative = { "kale", "leaf" },
    default = { "stone", "other" },
)]
fn case_runs_the_first_matching_arm(subject: &str, expected: &str) {
    let (mut sh, recorder) = recording_shell();
    let arms = [
        arm("apple", "record fruit"),
        arm("b*", "record root"),
        CaseArm::new(["chard", "kale"], Some(line("record leaf"))),
        arm("*", "record other"),
    ];
    sh.run(&Node::case(subject, arms));
    assert_eq!(recorder.entries(), [expected]);
}

#[test]
fn case_without_a_match_succeeds() {
    let mut sh = shell();
    sh.run(&line("false"));
    assert_eq!(sh.run(&Node::case("x", [arm("y", "false")])), 0);
}

#[test]
fn case_fallthrough_runs_the_next_body() {
    let (mut sh, recorder) = recording_shell();
    let arms = [
        arm("a", "record first").fallthrough(),
        arm("zzz", "record second"),
        arm("*", "record third"),
    ];
    sh.run(&Node::case("a", arms));
    assert_eq!(recorder.entries(), ["first", "second"]);
}

#[test]
fn quoted_case_pattern_matches_literally() {
    let (mut sh, recorder) = recording_shell();
    let literal = CaseArm {
        patterns: vec![CasePattern {
            word: Word::literal("a*"),
            raw: true,
        }],
        body: Some(line("record literal")),
        fallthrough: false,
    };
    sh.run(&Node::case("abc", [literal.clone(), arm("*", "record glob")]));
    sh.run(&Node::case("a*", [literal]));
    assert_eq!(recorder.entries(), ["glob", "literal"]);
}

#[test]
fn case_subject_is_expanded() {
    let (mut sh, recorder) = recording_shell();
    sh.run(&line("fruit=pear"));
    sh.run(&Node::case(Word::param("fruit"), [arm("p*", "record yes")]));
    assert_eq!(recorder.entries(), ["yes"]);
}

#[parameterized(
    nonzero = { ArithExpr::num(5), 0 },
    zero = { ArithExpr::num(0), 1 },
    comparison = { ArithExpr::binary(ArithOp::Eq, ArithExpr::num(2), ArithExpr::num(2)), 0 },
)]
fn arith_status_reflects_the_value(expr: ArithExpr, expected: i32) {
    let mut sh = shell();
    assert_eq!(sh.run(&Node::arith(expr)), expected);
}

#[test]
fn arith_division_by_zero_is_fatal_in_scripts() {
    let mut sh = shell();
    let tree = Node::sequence([
        Node::arith(ArithExpr::binary(ArithOp::Div, ArithExpr::num(1), ArithExpr::num(0))),
        line("after=1"),
    ]);
    assert_eq!(sh.run(&tree), 1);
    assert!(sh.has_exited());
    assert_eq!(sh.var("after"), None);
}
