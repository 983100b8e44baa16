// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::env;
use std::fs;
use std::path::PathBuf;

use serial_test::serial;
use tern_core::ast::{Redirect, RedirectOp};

use super::*;
use crate::test_support::Recorder;

fn fd_target(fd: i32) -> Option<PathBuf> {
    fs::read_link(format!("/proc/self/fd/{fd}")).ok()
}

#[test]
#[serial(fds)]
fn changes_inside_do_not_leak() {
    let mut sh = shell();
    sh.run(&line("x=1"));
    let body = Node::sequence([
        line("x=2"),
        line("y=new"),
        Node::function("f", line("true")),
        line("set -e"),
        line("set -- a b"),
    ]);
    assert_eq!(sh.run(&Node::subshell(body)), 0);

    assert_eq!(sh.var("x"), Some("1"));
    assert_eq!(sh.var("y"), None);
    assert!(sh.function("f").is_none());
    assert!(!sh.options().errexit);
    assert!(sh.positionals().is_empty());
    assert_eq!(sh.subshell_depth, 0);
}

#[test]
#[serial(fds)]
fn exit_ends_only_the_subshell() {
    let mut sh = shell();
    let tree = Node::sequence([
        Node::subshell(script(&["exit 3", "inner=1"])),
        line("after=$?"),
    ]);
    sh.run(&tree);
    assert!(!sh.has_exited());
    assert_eq!(sh.var("after"), Some("3"));
}

#[test]
#[serial(fds)]
fn errexit_ends_only_the_subshell() {
    let mut sh = shell();
    let status = sh.run(&Node::subshell(script(&["set -e", "false", "inner=1"])));
    assert_eq!(status, 1);
    assert!(!sh.has_exited());
    assert!(!sh.options().errexit);
}

#[test]
#[serial(fds)]
fn fatal_error_ends_only_the_subshell() {
    let mut sh = shell();
    sh.run(&line("readonly r=1"));
    let status = sh.run(&Node::subshell(script(&["r=2", "inner=1"])));
    assert_eq!(status, 1);
    assert!(!sh.has_exited());
    assert_eq!(sh.var("r"), Some("1"));
}

#[test]
#[serial(fds)]
fn subshell_exit_trap_runs_when_it_ends() {
    let recorder = Recorder::default();
    let mut sh = shell();
    sh.register_builtin(recorder.clone());
    let body = Node::sequence([
        Node::command(["trap", "record bye", "EXIT"]),
        line("record body"),
    ]);
    sh.run(&Node::subshell(body));
    assert_eq!(recorder.entries(), ["body", "bye"]);
    assert!(sh.scopes.current().traps.get(TrapCondition::Exit).is_none());
}

#[test]
#[serial(fds)]
fn parent_traps_do_not_run_in_the_subshell() {
    let recorder = Recorder::default();
    let mut sh = shell();
    sh.register_builtin(recorder.clone());
    sh.run(&Node::command(["trap", "record parent", "EXIT"]));
    sh.run(&Node::subshell(line("record child")));
    assert_eq!(recorder.entries(), ["child"]);

    sh.finish();
    assert_eq!(recorder.entries(), ["child", "parent"]);
}

#[test]
#[serial(fds)]
fn working_directory_is_restored() {
    let dir = tempfile::tempdir().unwrap();
    let before = env::current_dir().unwrap();
    let mut sh = shell();
    let target = dir.path().to_str().unwrap();

    sh.run(&Node::subshell(Node::command(["cd", target])));
    assert_eq!(env::current_dir().unwrap(), before);
    assert_ne!(sh.var("PWD").map(PathBuf::from), Some(dir.path().to_path_buf()));
}

#[test]
#[serial(fds)]
fn permanent_redirections_are_undone() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let before = fd_target(7);
    let mut sh = shell();

    let exec = Node::command(["exec"])
        .with_redirects([Redirect::new(RedirectOp::Write, out.to_str().unwrap()).with_fd(7)]);
    assert_eq!(sh.run(&Node::subshell(exec)), 0);

    assert!(out.exists());
    assert_eq!(fd_target(7), before);
}

#[test]
#[serial(fds)]
fn last_subshell_runs_in_place_when_nothing_follows() {
    let mut sh = shell();
    let result = sh.execute(&Node::subshell(line("x=2")), ExecFlags::NO_FORK);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(sh.var("x"), Some("2"));
}

#[test]
#[serial(fds)]
fn exit_trap_keeps_a_subshell_virtual() {
    let mut sh = shell();
    sh.set_trap(TrapCondition::Exit, Trap::run("true", line("true")))
        .unwrap();
    let result = sh.execute(&Node::subshell(line("x=2")), ExecFlags::NO_FORK);
    assert_eq!(result.unwrap(), 0);
    assert_eq!(sh.var("x"), None);
}
