// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use proptest::prelude::*;
use tern_core::ast::Node;
use tern_core::status;
use yare::parameterized;

use super::*;
use crate::test_support::{line, shell};
use crate::traps::Trap;

mod compound;
mod function;
mod subshell;

// ---------------------------------------------------------------------------
// Shared test helpers
// ---------------------------------------------------------------------------

/// One simple command per entry, run in order.
fn script(lines: &[&str]) -> Node {
    Node::sequence(lines.iter().copied().map(line))
}

fn truth(ok: bool) -> Node {
    Node::command([if ok { "true" } else { "false" }])
}

// ---------------------------------------------------------------------------
// Flags
// ---------------------------------------------------------------------------

#[test]
fn condition_clears_all_context() {
    let all = ExecFlags::all();
    assert_eq!(all.condition(), ExecFlags::empty());
    assert_eq!(ExecFlags::empty().condition(), ExecFlags::empty());
}

#[test]
fn inner_keeps_errexit_only() {
    let flags = ExecFlags::ERREXIT | ExecFlags::NO_FORK | ExecFlags::FORKED;
    assert_eq!(flags.inner(), ExecFlags::ERREXIT);
}

// ---------------------------------------------------------------------------
// Lists and negation
// ---------------------------------------------------------------------------

#[parameterized(
    and_both = { Node::and(truth(true), truth(true)), 0 },
    and_short_circuits = { Node::and(truth(false), truth(true)), 1 },
    and_right_fails = { Node::and(truth(true), truth(false)), 1 },
    or_short_circuits = { Node::or(truth(true), truth(false)), 0 },
    or_falls_through = { Node::or(truth(false), truth(true)), 0 },
    or_both_fail = { Node::or(truth(false), truth(false)), 1 },
    not_true = { Node::not(truth(true)), 1 },
    not_false = { Node::not(truth(false)), 0 },
)]
fn list_status(tree: Node, expected: i32) {
    let mut sh = shell();
    assert_eq!(sh.run(&tree), expected);
    assert_eq!(sh.exit_status(), expected);
}

#[test]
fn and_does_not_run_right_side_after_failure() {
    let mut sh = shell();
    sh.run(&Node::and(truth(false), line("ran=1")));
    assert_eq!(sh.var("ran"), None);

    sh.run(&Node::or(truth(true), line("ran=1")));
    assert_eq!(sh.var("ran"), None);

    sh.run(&Node::or(truth(false), line("ran=1")));
    assert_eq!(sh.var("ran"), Some("1"));
}

#[test]
fn sequence_status_is_the_last_command() {
    let mut sh = shell();
    assert_eq!(sh.run(&script(&["false", "true"])), 0);
    assert_eq!(sh.run(&script(&["true", "false"])), 1);
    assert_eq!(sh.run(&Node::sequence([])), 0);
}

#[test]
fn negated_status_is_normalised() {
    let mut sh = shell();
    assert_eq!(sh.run(&Node::not(line("tern-missing-command"))), 0);
    assert_eq!(sh.run(&Node::not(Node::not(truth(false)))), 1);
}

fn status_tree() -> impl Strategy<Value = (Node, i32)> {
    let leaf = any::<bool>().prop_map(|ok| (truth(ok), if ok { 0 } else { 1 }));
    leaf.prop_recursive(4, 32, 2, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|((l, ls), (r, rs))| {
                (Node::and(l, r), if ls == 0 { rs } else { ls })
            }),
            (inner.clone(), inner.clone()).prop_map(|((l, ls), (r, rs))| {
                (Node::or(l, r), if ls == 0 { ls } else { rs })
            }),
            inner.prop_map(|(node, s)| (Node::not(node), status::negate(s))),
        ]
    })
}

proptest! {
    #[test]
    fn list_status_follows_short_circuit_rules((tree, expected) in status_tree()) {
        let mut sh = shell();
        prop_assert_eq!(sh.run(&tree), expected);
        prop_assert!(!sh.has_exited());
    }
}

// ---------------------------------------------------------------------------
// set -e and the ERR trap
// ---------------------------------------------------------------------------

#[test]
fn errexit_stops_a_script_at_the_first_failure() {
    let mut sh = shell();
    let status = sh.run(&script(&["set -e", "false", "after=1"]));
    assert_eq!(status, 1);
    assert!(sh.has_exited());
    assert_eq!(sh.var("after"), None);
}

#[parameterized(
    if_test = { Node::if_then(truth(false), truth(true), None) },
    and_left = { Node::and(truth(false), truth(true)) },
    or_left = { Node::or(truth(false), truth(true)) },
    negated = { Node::not(truth(true)) },
    while_test = { Node::while_do(truth(false), truth(true)) },
)]
fn errexit_ignores_conditions(tree: Node) {
    let mut sh = shell();
    sh.run(&line("set -e"));
    sh.run(&Node::sequence([tree, line("after=1")]));
    assert!(!sh.has_exited());
    assert_eq!(sh.var("after"), Some("1"));
}

#[test]
fn errexit_leaves_through_function_calls() {
    let mut sh = shell();
    let body = script(&["false", "inner=1"]);
    let tree = Node::sequence([
        line("set -e"),
        Node::function("f", body),
        line("f"),
        line("after=1"),
    ]);
    assert_eq!(sh.run(&tree), 1);
    assert!(sh.has_exited());
    assert_eq!(sh.var("inner"), None);
    assert_eq!(sh.var("after"), None);
}

#[test]
fn err_trap_skips_conditions() {
    let mut sh = shell();
    sh.set_trap(TrapCondition::Err, Trap::run("seen=yes", line("seen=yes")))
        .unwrap();
    sh.run(&Node::if_then(truth(false), truth(true), None));
    sh.run(&Node::and(truth(false), truth(true)));
    assert_eq!(sh.var("seen"), None);

    sh.run(&Node::if_then(truth(true), truth(false), None));
    assert_eq!(sh.var("seen"), Some("yes"));
}

#[test]
fn err_trap_runs_before_errexit_leaves() {
    let mut sh = shell();
    sh.set_trap(TrapCondition::Err, Trap::run("seen=yes", line("seen=yes")))
        .unwrap();
    assert_eq!(sh.run(&script(&["set -e", "false", "after=1"])), 1);
    assert_eq!(sh.var("seen"), Some("yes"));
    assert_eq!(sh.var("after"), None);
}

// ---------------------------------------------------------------------------
// Miscellany
// ---------------------------------------------------------------------------

#[test]
fn noexec_skips_commands_in_scripts() {
    let mut sh = shell();
    sh.options_mut().noexec = true;
    assert_eq!(sh.run(&line("x=1")), 0);
    assert_eq!(sh.var("x"), None);
}

#[test]
fn timed_command_keeps_its_status() {
    let mut sh = shell();
    assert_eq!(sh.run(&Node::time(Some(truth(false)))), 1);
    assert_eq!(sh.timing, 0);
    assert_eq!(sh.run(&Node::time(None)), 0);
}

#[test]
fn function_definition_succeeds_without_running_the_body() {
    let mut sh = shell();
    assert_eq!(sh.run(&Node::function("f", line("ran=1"))), 0);
    assert!(sh.function("f").is_some());
    assert_eq!(sh.var("ran"), None);
}

#[test]
fn location_updates_lineno() {
    let mut sh = shell();
    sh.run(&truth(true).at_line(42));
    assert_eq!(sh.lineno, 42);
    assert_eq!(sh.param("LINENO").unwrap(), "42");
}

#[parameterized(
    simple = { Node::command(["echo", "hi"]), "echo hi" },
    pipeline = { Node::pipeline([Node::command(["a", "b"]), Node::command(["c"])]), "a b | c" },
    background = { Node::background(Node::command(["sleep", "1"])), "sleep 1" },
    compound = { Node::if_then(truth(true), truth(true), None), "if" },
)]
fn describe_names_commands(tree: Node, expected: &str) {
    assert_eq!(describe(&tree), expected);
}
