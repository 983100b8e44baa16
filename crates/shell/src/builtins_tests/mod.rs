// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use tern_core::{status, Node};
use yare::parameterized;

use super::*;
use crate::shell::Shell;
use crate::test_support::{line, shell, Recorder};
use crate::traps::TrapCondition;

fn script(lines: &[&str]) -> Node {
    Node::sequence(lines.iter().copied().map(line))
}

fn recording_shell() -> (Shell, Recorder) {
    let recorder = Recorder::default();
    let mut sh = shell();
    sh.register_builtin(recorder.clone());
    (sh, recorder)
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[test]
fn standard_table_marks_special_builtins() {
    let table = standard();
    for name in [":", "break", "continue", "return", "exit", "export", "readonly", "unset"] {
        let (_, builtin) = table.lookup(name).unwrap();
        assert!(builtin.special(), "{name} should be special");
    }
    for name in ["true", "false", "echo", "cd", "local", "command", "wait"] {
        let (_, builtin) = table.lookup(name).unwrap();
        assert!(!builtin.special(), "{name} should be regular");
    }
    assert!(table.lookup("tern-nothing").is_none());
}

#[test]
fn register_replaces_in_place() {
    let mut table = standard();
    let len = table.len();
    let (index, _) = table.lookup("echo").unwrap();

    table.register(Arc::new(FnBuiltin::special("echo", |_, _| Ok(7))));
    assert_eq!(table.len(), len);
    let (replaced, builtin) = table.lookup("echo").unwrap();
    assert_eq!(replaced, index);
    assert!(builtin.special());
    assert_eq!(table.get(index).unwrap().name(), "echo");
}

#[test]
fn exec_keeps_redirections_only_without_a_command() {
    let exec = eval::Exec;
    let bare = vec!["exec".to_string()];
    let with_command = vec!["exec".to_string(), "ls".to_string()];
    assert_eq!(exec.redirect_discipline(&bare), Discipline::Permanent);
    assert_eq!(exec.redirect_discipline(&with_command), Discipline::Temporary);
}

#[parameterized(
    plain = { "7", Some(7) },
    negative = { "-2", Some(-2) },
    word = { "seven", None },
    empty = { "", None },
)]
fn number_parses_counts(arg: &str, expected: Option<i64>) {
    assert_eq!(number(arg).ok(), expected);
}

// ---------------------------------------------------------------------------
// set and shift
// ---------------------------------------------------------------------------

#[test]
fn set_toggles_options() {
    let mut sh = shell();
    sh.run(&line("set -eu"));
    assert!(sh.options().errexit);
    assert!(sh.options().nounset);

    sh.run(&line("set +e -o pipefail"));
    assert!(!sh.options().errexit);
    assert!(sh.options().pipefail);

    sh.run(&line("set +o pipefail"));
    assert!(!sh.options().pipefail);
}

#[parameterized(
    after_double_dash = { "set -- a -b", &["a", "-b"] },
    after_options = { "set -x one two", &["one", "two"] },
    plain_words = { "set one", &["one"] },
    cleared = { "set --", &[] },
)]
fn set_replaces_positionals(command: &str, expected: &[&str]) {
    let mut sh = shell();
    sh.run(&line("set -- old values"));
    sh.run(&line(command));
    assert_eq!(sh.positionals(), expected);
}

#[test]
fn set_rejects_unknown_options() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("set -Q")), status::USAGE);
    assert!(sh.has_exited());

    let mut sh = shell();
    assert_eq!(sh.run(&line("set -o no-such-option")), status::USAGE);
}

#[test]
fn shift_drops_leading_positionals() {
    let mut sh = shell();
    sh.run(&line("set -- a b c d"));
    sh.run(&line("shift"));
    assert_eq!(sh.positionals(), ["b", "c", "d"]);
    sh.run(&line("shift 2"));
    assert_eq!(sh.positionals(), ["d"]);
    sh.run(&line("shift 1"));
    assert!(sh.positionals().is_empty());
}

#[test]
fn shift_past_the_end_is_fatal() {
    let mut sh = shell();
    sh.run(&line("set -- a"));
    assert_eq!(sh.run(&script(&["shift 2", "after=1"])), 1);
    assert_eq!(sh.var("after"), None);
    assert_eq!(sh.positionals(), ["a"]);
}

// ---------------------------------------------------------------------------
// Variables
// ---------------------------------------------------------------------------

#[test]
fn export_marks_variables_for_children() {
    let mut sh = shell();
    sh.run(&script(&["plain=1", "early=2", "export early late=3"]));
    let exported = sh.vars().exported();
    assert_eq!(exported.get("early").map(String::as_str), Some("2"));
    assert_eq!(exported.get("late").map(String::as_str), Some("3"));
    assert!(!exported.contains_key("plain"));
}

#[test]
fn export_of_path_invalidates_resolutions() {
    let mut sh = shell();
    let before = sh.generation;
    sh.run(&line("export PATH=/bin"));
    assert!(sh.generation > before);
}

#[test]
fn export_rejects_bad_names() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("export 1abc=x")), status::FAILURE);
    assert!(sh.has_exited());
}

#[test]
fn readonly_blocks_assignment_and_unset() {
    let mut sh = shell_interactive();
    sh.run(&line("readonly r=1"));
    assert_eq!(sh.run(&line("r=2")), 1);
    assert_eq!(sh.run(&line("unset r")), 1);
    assert_eq!(sh.var("r"), Some("1"));
}

fn shell_interactive() -> Shell {
    crate::test_support::shell_with(tern_core::ShellConfig {
        interactive: true,
        ..Default::default()
    })
}

#[test]
fn unset_removes_variables_and_functions() {
    let mut sh = shell();
    sh.run(&script(&["x=1", "y=2"]));
    sh.run(&Node::function("f", line("true")));

    sh.run(&line("unset x"));
    assert_eq!(sh.var("x"), None);
    assert_eq!(sh.var("y"), Some("2"));

    let before = sh.generation;
    sh.run(&line("unset -f f"));
    assert!(sh.function("f").is_none());
    assert!(sh.generation > before);
}

#[test]
fn unset_of_a_missing_name_succeeds() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("unset never_set")), 0);
    assert_eq!(sh.run(&line("unset -f never_defined")), 0);
}

#[test]
fn unset_rejects_unknown_options() {
    let mut sh = shell_interactive();
    assert_eq!(sh.run(&line("unset -q x")), status::USAGE);
}

// ---------------------------------------------------------------------------
// return, exit, eval
// ---------------------------------------------------------------------------

#[parameterized(
    explicit = { "exit 3", 3 },
    wraps = { "exit 300", 44 },
    previous = { "false; exit", 1 },
)]
fn exit_status_argument(text: &str, expected: i32) {
    let mut sh = shell();
    let tree = Node::sequence(text.split("; ").map(line));
    assert_eq!(sh.run(&tree), expected);
    assert!(sh.has_exited());
}

#[test]
fn exit_rejects_a_bad_status() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("exit nope")), 1);
    assert!(sh.has_exited());
}

#[test]
fn eval_runs_joined_arguments_here() {
    let (mut sh, recorder) = recording_shell();
    assert_eq!(sh.run(&line("eval x=1 ; record evaluated")), 0);
    sh.run(&line("eval record a b"));
    assert_eq!(sh.var("x"), Some("1"));
    assert_eq!(recorder.entries(), ["evaluated", "a b"]);
}

#[test]
fn eval_status_is_the_last_command() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("eval false")), 1);
    assert_eq!(sh.run(&line("eval")), 0);
}

#[test]
fn exit_inside_eval_leaves_the_shell() {
    let mut sh = shell();
    assert_eq!(sh.run(&script(&["eval exit 5", "after=1"])), 5);
    assert!(sh.has_exited());
    assert_eq!(sh.var("after"), None);
}

#[test]
fn return_inside_eval_leaves_the_function() {
    let (mut sh, recorder) = recording_shell();
    sh.run(&Node::function("f", script(&["eval return 4", "record unreachable"])));
    assert_eq!(sh.run(&line("f")), 4);
    assert!(recorder.entries().is_empty());
}

#[test]
fn eval_without_a_parser_fails() {
    let mut sh = Shell::builder().build();
    assert_eq!(sh.run(&line("eval true")), 1);
}

// ---------------------------------------------------------------------------
// trap
// ---------------------------------------------------------------------------

#[test]
fn trap_sets_and_clears_actions() {
    let mut sh = shell();
    sh.run(&Node::command(["trap", "x=1", "EXIT", "ERR"]));
    let traps = &sh.scopes.current().traps;
    assert_eq!(traps.get(TrapCondition::Exit).unwrap().text, "x=1");
    assert!(traps.get(TrapCondition::Err).is_some());

    sh.run(&line("trap - ERR"));
    assert!(sh.scopes.current().traps.get(TrapCondition::Err).is_none());

    sh.run(&line("trap EXIT"));
    assert!(sh.scopes.current().traps.get(TrapCondition::Exit).is_none());
}

#[test]
fn empty_trap_action_ignores_the_condition() {
    let mut sh = shell();
    sh.run(&Node::command(["trap", "", "ERR"]));
    let trap = sh.scopes.current().traps.get(TrapCondition::Err).cloned();
    assert!(trap.is_some_and(|t| t.is_ignore()));
    assert_eq!(sh.run(&line("false")), 1);
}

#[test]
fn trap_rejects_unknown_conditions() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("trap x=1 NOT_A_SIGNAL")), 1);
    assert!(sh.has_exited());
}

#[test]
fn trap_listing_succeeds() {
    let mut sh = shell();
    sh.run(&Node::command(["trap", "x=1", "EXIT"]));
    assert_eq!(sh.run(&line("trap")), 0);
    assert_eq!(sh.run(&line("trap -p")), 0);
}

// ---------------------------------------------------------------------------
// wait and jobs
// ---------------------------------------------------------------------------

#[test]
fn wait_without_children_succeeds() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("wait")), 0);
    assert_eq!(sh.run(&line("jobs")), 0);
}

#[test]
fn wait_for_an_unknown_job_is_not_found() {
    let mut sh = shell();
    assert_eq!(sh.run(&line("wait %9")), status::NOT_FOUND);
}

#[parameterized(
    word = { "wait abc" },
    bad_job = { "wait %x" },
    jobs_flag = { "jobs -z" },
)]
fn job_builtins_reject_bad_operands(command: &str) {
    let mut sh = shell();
    assert_eq!(sh.run(&line(command)), status::USAGE);
    assert!(!sh.has_exited());
}
