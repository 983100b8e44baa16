// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipelines with real processes.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{capture, line, sh_c, shell, Slurp};
use serial_test::serial;
use tern_core::Node;

#[test]
#[serial(children)]
fn output_flows_between_stages() {
    let mut sh = shell();
    let tree = Node::pipeline([Node::command(["echo", "through", "the", "pipe"]), Node::command(["cat"])]);
    let (status, text) = capture(&mut sh, tree);
    assert_eq!(status, 0);
    assert_eq!(text, "through the pipe\n");
}

#[test]
#[serial(children)]
fn three_stages_chain_in_order() {
    let mut sh = shell();
    let tree = Node::pipeline([
        sh_c("printf 'b\\na\\nc\\n'"),
        Node::command(["sort"]),
        Node::command(["head", "-n", "2"]),
    ]);
    let (status, text) = capture(&mut sh, tree);
    assert_eq!(status, 0);
    assert_eq!(text, "a\nb\n");
}

#[test]
#[serial(children)]
fn last_stage_runs_in_the_current_shell() {
    let mut sh = shell();
    sh.register_builtin(Slurp);
    let tree = Node::pipeline([sh_c("echo from-child"), line("slurp")]);
    assert_eq!(sh.run(&tree), 0);
    assert_eq!(sh.var("input"), Some("from-child\n"));

    sh.run(&Node::pipeline([line("true"), line("last=5")]));
    assert_eq!(sh.var("last"), Some("5"));
}

#[test]
#[serial(children)]
fn earlier_stages_run_in_children() {
    let mut sh = shell();
    sh.run(&Node::pipeline([line("first=1"), line("true")]));
    assert_eq!(sh.var("first"), None);
}

#[test]
#[serial(children)]
fn status_is_the_last_stage_by_default() {
    let mut sh = shell();
    let tree = Node::pipeline([line("true"), sh_c("exit 5"), line("true")]);
    assert_eq!(sh.run(&tree), 0);

    let tree = Node::pipeline([line("true"), sh_c("exit 3")]);
    assert_eq!(sh.run(&tree), 3);
}

#[test]
#[serial(children)]
fn pipefail_reports_the_rightmost_failure() {
    let mut sh = shell();
    sh.run(&line("set -o pipefail"));

    let tree = Node::pipeline([line("true"), sh_c("exit 5"), line("true")]);
    assert_eq!(sh.run(&tree), 5);

    let tree = Node::pipeline([sh_c("exit 2"), sh_c("exit 4"), line("true")]);
    assert_eq!(sh.run(&tree), 4);

    let tree = Node::pipeline([line("true"), line("true")]);
    assert_eq!(sh.run(&tree), 0);
}

#[test]
#[serial(children)]
fn function_can_be_a_stage() {
    let mut sh = shell();
    sh.run(&Node::function("produce", line("echo made $1")));
    let tree = Node::pipeline([line("produce here"), Node::command(["cat"])]);
    let (status, text) = capture(&mut sh, tree);
    assert_eq!(status, 0);
    assert_eq!(text, "made here\n");
}

#[test]
#[serial(children)]
fn negated_pipeline_flips_the_status() {
    let mut sh = shell();
    let tree = Node::not(Node::pipeline([line("true"), sh_c("exit 3")]));
    assert_eq!(sh.run(&tree), 0);
    let tree = Node::not(Node::pipeline([line("false"), line("true")]));
    assert_eq!(sh.run(&tree), 1);
}

#[test]
#[serial(children)]
fn errexit_applies_to_the_pipeline_status() {
    let mut sh = shell();
    let tree = Node::sequence([
        line("set -e"),
        Node::pipeline([line("true"), sh_c("exit 2")]),
        line("after=1"),
    ]);
    assert_eq!(sh.run(&tree), 2);
    assert!(sh.has_exited());
    assert_eq!(sh.var("after"), None);
}
