// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;

use serial_test::serial;
use tern_core::ast::{ArithExpr, ArithOp};
use tern_core::ShellConfig;
use yare::parameterized;

use super::*;
use crate::test_support::{shell_with, Recorder};

fn with_functions(defs: Vec<(&str, Node)>) -> (Shell, Recorder) {
    let recorder = Recorder::default();
    let mut sh = shell();
    sh.register_builtin(recorder.clone());
    for (name, body) in defs {
        sh.run(&Node::function(name, body));
    }
    (sh, recorder)
}

#[test]
fn arguments_become_positionals_for_the_call() {
    let (mut sh, recorder) = with_functions(vec![("f", line("record $1 $2 $#"))]);
    sh.run(&line("set -- outer"));
    sh.run(&line("f a b"));
    assert_eq!(recorder.entries(), ["a b 2"]);
    assert_eq!(sh.positionals(), ["outer"]);
}

#[parameterized(
    explicit = { "return 4", 4 },
    truncated = { "return 258", 2 },
    previous_status = { "false; return", 1 },
)]
fn return_sets_the_call_status(body: &str, expected: i32) {
    let body = Node::sequence(body.split("; ").map(line));
    let (mut sh, _) = with_functions(vec![("f", Node::sequence([body, line("after=1")]))]);
    assert_eq!(sh.run(&line("f")), expected);
    assert_eq!(sh.var("after"), None);
    assert!(!sh.has_exited());
}

#[test]
fn body_status_is_the_call_status() {
    let (mut sh, _) = with_functions(vec![("f", line("false"))]);
    assert_eq!(sh.run(&line("f")), 1);
}

#[test]
fn return_outside_a_function_exits() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("return 6")), 6);
    assert!(sh.has_exited());
}

#[test]
fn return_leaves_nested_loops_in_the_function() {
    let loop_body = Node::sequence([line("record $i"), line("return 3")]);
    let (mut sh, recorder) = with_functions(vec![(
        "f",
        Node::for_in("i", ["a", "b"], loop_body),
    )]);
    let tree = Node::for_in("j", ["x", "y"], line("f"));
    sh.run(&tree);
    assert_eq!(recorder.entries(), ["a", "a"]);
    assert_eq!(sh.scopes.current().loops, Default::default());
}

#[test]
fn local_shadows_and_restores_the_global() {
    let body = script(&["local v=inner", "record $v"]);
    let (mut sh, recorder) = with_functions(vec![("f", body)]);
    sh.run(&line("v=outer"));
    sh.run(&line("f"));
    assert_eq!(recorder.entries(), ["inner"]);
    assert_eq!(sh.var("v"), Some("outer"));
}

#[test]
fn plain_assignment_in_a_function_is_global() {
    let (mut sh, _) = with_functions(vec![("f", line("g=set-inside"))]);
    sh.run(&line("f"));
    assert_eq!(sh.var("g"), Some("set-inside"));
}

#[test]
fn callee_sees_the_callers_locals() {
    let (mut sh, recorder) = with_functions(vec![
        ("inner", line("record $v")),
        ("outer", script(&["local v=from-outer", "inner"])),
    ]);
    sh.run(&line("outer"));
    assert_eq!(recorder.entries(), ["from-outer"]);
    assert_eq!(sh.var("v"), None);
}

#[test]
fn local_outside_a_function_is_a_usage_error() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("local v=1")), status::USAGE);
    assert_eq!(sh.var("v"), None);
    assert!(!sh.has_exited());
}

#[test]
fn static_locals_keep_their_value_between_calls() {
    let body = Node::sequence([
        line("local -S n"),
        Node::arith(ArithExpr::incr("n", 1)),
        line("record $n"),
    ]);
    let (mut sh, recorder) = with_functions(vec![("counter", body)]);
    sh.run(&line("counter"));
    sh.run(&line("counter"));
    sh.run(&line("counter"));
    assert_eq!(recorder.entries(), ["1", "2", "3"]);
    assert_eq!(sh.var("n"), None);
}

#[test]
fn redefinition_resets_static_locals() {
    let body = Node::sequence([
        line("local -S n"),
        Node::arith(ArithExpr::incr("n", 1)),
        line("record $n"),
    ]);
    let (mut sh, recorder) = with_functions(vec![("counter", body.clone())]);
    sh.run(&line("counter"));
    sh.run(&Node::function("counter", body));
    sh.run(&line("counter"));
    assert_eq!(recorder.entries(), ["1", "1"]);
}

#[test]
fn exit_trap_set_in_a_function_runs_when_it_returns() {
    let body = script(&["trap left=1 EXIT", "record inside"]);
    let (mut sh, recorder) = with_functions(vec![("f", body)]);
    assert_eq!(sh.run(&line("f")), 0);
    assert_eq!(recorder.entries(), ["inside"]);
    assert_eq!(sh.var("left"), Some("1"));
    assert!(sh.scopes.current().traps.get(TrapCondition::Exit).is_none());
}

#[test]
fn runaway_recursion_is_fatal() {
    let config = ShellConfig {
        max_function_depth: 8,
        ..ShellConfig::default()
    };
    let mut sh = shell_with(config);
    sh.run(&Node::function("f", line("f")));
    let status = sh.run(&Node::sequence([line("f"), line("after=1")]));
    assert_eq!(status, 1);
    assert!(sh.has_exited());
    assert_eq!(sh.var("after"), None);
    assert_eq!(sh.error_count(), 1);
    assert_eq!(sh.function_depth(), 0);
}

#[test]
fn recursion_below_the_limit_completes() {
    let config = ShellConfig {
        max_function_depth: 16,
        ..ShellConfig::default()
    };
    let mut sh = shell_with(config);
    // countdown: n=$1; (( n > 0 )) && countdown $((n-1))
    let body = Node::sequence([
        line("n=$1"),
        Node::and(
            Node::arith(ArithExpr::binary(ArithOp::Gt, ArithExpr::var("n"), ArithExpr::num(0))),
            Node::sequence([
                Node::arith(ArithExpr::assign(
                    "n",
                    ArithExpr::binary(ArithOp::Sub, ArithExpr::var("n"), ArithExpr::num(1)),
                )),
                line("countdown $n"),
            ]),
        ),
    ]);
    sh.run(&Node::function("countdown", body));
    sh.run(&line("countdown 10"));
    assert!(!sh.has_exited());
    assert_eq!(sh.var("n"), Some("0"));
}

#[test]
fn calling_an_undefined_function_is_not_found() {
    let mut sh = shell();
    let err = sh.call_function("missing", Vec::new()).unwrap_err();
    assert!(matches!(err.kind, UnwindKind::Error(ExecError::NotFound { .. })));
}

#[test]
#[serial(fds)]
fn sourced_script_runs_in_the_current_scope() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("lib.sh");
    fs::write(&file, "x=1\nreturn 5\ny=2\n").unwrap();

    let mut sh = shell();
    let status = sh.run(&Node::command([".", file.to_str().unwrap()]));
    assert_eq!(status, 5);
    assert_eq!(sh.var("x"), Some("1"));
    assert_eq!(sh.var("y"), None);
    assert!(!sh.has_exited());
}

#[test]
#[serial(fds)]
fn sourced_script_arguments_replace_positionals_temporarily() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("args.sh");
    fs::write(&file, "record $1 $#\n").unwrap();

    let (mut sh, recorder) = with_functions(Vec::new());
    sh.run(&line("set -- keep"));
    sh.run(&Node::command(["source", file.to_str().unwrap(), "a", "b"]));
    sh.run(&Node::command(["source", file.to_str().unwrap()]));
    assert_eq!(recorder.entries(), ["a 2", "keep 1"]);
    assert_eq!(sh.positionals(), ["keep"]);
}

#[test]
fn sourcing_a_missing_file_fails() {
    let mut sh = shell();
    let status = sh.run(&line(". /nonexistent/tern/lib.sh"));
    assert_ne!(status, 0);
    assert_eq!(sh.dot_depth, 0);
}

#[test]
fn dot_without_a_file_is_a_usage_error() {
    let mut sh = shell();
    assert_eq!(sh.run(&line(".")), status::USAGE);
}
