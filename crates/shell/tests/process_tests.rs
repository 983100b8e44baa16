// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External programs, background jobs and process replacement.

#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use std::fs;

use common::{capture, fd_target, line, read_from, sh_c, shell, write_to};
use serial_test::serial;
use tern_core::ast::{Assignment, Redirect, RedirectOp};
use tern_core::{status, Node};

fn with_prefix(name: &str, value: &str, node: Node) -> Node {
    let Node::Simple(mut cmd) = node else {
        panic!("expected a simple command");
    };
    cmd.assignments.push(Assignment::new(name, value));
    Node::Simple(cmd)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[test]
#[serial(children)]
fn program_status_is_the_command_status() {
    let mut sh = shell();
    assert_eq!(sh.run(&sh_c("exit 7")), 7);
    assert_eq!(sh.run(&line("true")), 0);
    assert_eq!(sh.run(&Node::command(["/bin/sh", "-c", "exit 0"])), 0);
}

#[test]
#[serial(children)]
fn killed_program_reports_the_signal() {
    let mut sh = shell();
    assert_eq!(sh.run(&sh_c("kill -TERM $$")), status::from_signal(15));
}

#[test]
#[serial(children)]
fn missing_program_is_not_found() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("tern-missing-command")), status::NOT_FOUND);
    assert!(!sh.has_exited());
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

#[test]
#[serial(children)]
fn only_exported_variables_reach_children() {
    let mut sh = shell();
    sh.run(&line("export seen=yes"));
    sh.run(&line("hidden=no"));
    assert_eq!(sh.run(&sh_c("test \"$seen\" = yes")), 0);
    assert_eq!(sh.run(&sh_c("test -z \"$hidden\"")), 0);
}

#[test]
#[serial(children)]
fn prefix_assignment_goes_only_to_the_child() {
    let mut sh = shell();
    let tree = with_prefix("only", "child", sh_c("test \"$only\" = child"));
    assert_eq!(sh.run(&tree), 0);
    assert_eq!(sh.var("only"), None);
}

// ---------------------------------------------------------------------------
// Redirections
// ---------------------------------------------------------------------------

#[test]
#[serial(children, fds)]
fn program_output_follows_its_redirection() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let before = fd_target(1);
    let mut sh = shell();

    let tree = sh_c("echo redirected").with_redirects([write_to(&out)]);
    assert_eq!(sh.run(&tree), 0);
    assert_eq!(fs::read_to_string(&out).unwrap(), "redirected\n");
    assert_eq!(fd_target(1), before);
}

#[test]
#[serial(children, fds)]
fn program_reads_from_its_input_redirection() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input");
    fs::write(&input, "line one\nline two\n").unwrap();
    let mut sh = shell();

    let tree = Node::command(["wc", "-l"]).with_redirects([read_from(&input)]);
    let (status, text) = capture(&mut sh, tree);
    assert_eq!(status, 0);
    assert_eq!(text.trim(), "2");
}

#[test]
#[serial(children, fds)]
fn unopenable_redirection_skips_the_program() {
    let mut sh = shell();
    let tree =
        sh_c("exit 0").with_redirects([Redirect::new(RedirectOp::Read, "/nonexistent/tern/in")]);
    assert_eq!(sh.run(&tree), 1);
    assert!(!sh.has_exited());
}

#[test]
#[serial(fds)]
fn exec_redirections_persist_until_closed() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("fd9");
    let mut sh = shell();

    let open = Node::command(["exec"]).with_redirects([write_to(&out).with_fd(9)]);
    assert_eq!(sh.run(&open), 0);
    assert_eq!(fd_target(9), Some(fs::canonicalize(&out).unwrap()));

    let close = Node::command(["exec"])
        .with_redirects([Redirect::new(RedirectOp::DupWrite, "-").with_fd(9)]);
    assert_eq!(sh.run(&close), 0);
    assert_eq!(fd_target(9), None);
}

// ---------------------------------------------------------------------------
// Background jobs
// ---------------------------------------------------------------------------

#[test]
#[serial(children)]
fn background_job_status_comes_from_wait() {
    let mut sh = shell();
    assert_eq!(sh.run(&Node::background(sh_c("exit 3"))), 0);
    assert!(sh.last_background_pid().is_some());
    assert_eq!(sh.run(&line("wait $!")), 3);
}

#[test]
#[serial(children)]
fn forked_builtin_exits_with_its_status_and_output() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let mut sh = shell();

    let echo = Node::command(["echo", "kid"]).with_redirects([write_to(&out)]);
    sh.run(&Node::background(Node::sequence([echo, line("exit 5")])));
    assert_eq!(sh.run(&line("wait $!")), 5);
    assert_eq!(fs::read_to_string(&out).unwrap(), "kid\n");
}

#[test]
#[serial(children)]
fn background_job_does_not_change_the_shell() {
    let mut sh = shell();
    sh.run(&Node::background(line("inside=1")));
    sh.run(&line("wait"));
    assert_eq!(sh.var("inside"), None);
}

// ---------------------------------------------------------------------------
// Process replacement
// ---------------------------------------------------------------------------

fn parent_of(sh: &mut tern_shell::Shell, tree: Node) -> u32 {
    let (status, text) = capture(sh, tree);
    assert_eq!(status, 0);
    text.trim().parse().unwrap()
}

#[test]
#[serial(children, fds)]
fn forked_stage_replaces_itself_with_the_program() {
    let mut sh = shell();
    let tree = Node::pipeline([sh_c("echo $PPID"), Node::command(["cat"])]);
    assert_eq!(parent_of(&mut sh, tree), std::process::id());
}

#[test]
#[serial(children, fds)]
fn background_program_replaces_the_child() {
    let mut sh = shell();
    let tree = Node::sequence([Node::background(sh_c("echo $PPID")), line("wait")]);
    assert_eq!(parent_of(&mut sh, tree), std::process::id());
}

#[test]
#[serial(children, fds)]
fn function_stage_keeps_its_own_process() {
    let mut sh = shell();
    sh.run(&Node::function("parent", sh_c("echo $PPID")));
    let tree = Node::pipeline([line("parent"), Node::command(["cat"])]);
    assert_ne!(parent_of(&mut sh, tree), std::process::id());
}

#[test]
#[serial(children, fds)]
fn foreground_program_is_a_child_of_the_shell() {
    let mut sh = shell();
    assert_eq!(parent_of(&mut sh, sh_c("echo $PPID")), std::process::id());
}
