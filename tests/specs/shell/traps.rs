//! Trap specs

use serde_json::json;

use crate::prelude::*;

fn trap(action: serde_json::Value, condition: &str) -> serde_json::Value {
    cmd(&["trap", &action.to_string(), condition])
}

#[test]
fn exit_trap_runs_at_the_end() {
    let temp = Project::empty();
    let tree = seq(vec![trap(cmd(&["echo", "bye"]), "EXIT"), cmd(&["echo", "hi"])]);
    temp.run(&tree).passes().stdout_eq("hi\nbye\n");
}

#[test]
fn exit_trap_runs_after_exit_and_keeps_its_status() {
    let temp = Project::empty();
    let tree = seq(vec![
        trap(cmd(&["echo", "bye"]), "EXIT"),
        cmd(&["exit", "3"]),
        cmd(&["echo", "unreachable"]),
    ]);
    temp.run(&tree).exits_with(3).stdout_eq("bye\n");
}

#[test]
fn err_trap_runs_after_a_failing_command() {
    let temp = Project::empty();
    let tree = seq(vec![
        trap(cmd(&["echo", "caught"]), "ERR"),
        cmd(&["false"]),
        cmd(&["echo", "after"]),
    ]);
    temp.run(&tree).passes().stdout_eq("caught\nafter\n");
}

#[test]
fn signal_trap_runs_before_the_next_command() {
    let temp = Project::empty();
    let tree = seq(vec![
        trap(cmd(&["echo", "got term"]), "TERM"),
        sh("kill -TERM $PPID"),
        cmd(&["echo", "after"]),
    ]);
    temp.run(&tree).passes().stdout_eq("got term\nafter\n");
}

#[test]
fn ignored_signal_does_not_stop_the_shell() {
    let temp = Project::empty();
    let tree = seq(vec![
        cmd(&["trap", "", "TERM"]),
        sh("kill -TERM $PPID"),
        cmd(&["echo", "still here"]),
    ]);
    temp.run(&tree).passes().stdout_eq("still here\n");
}

#[test]
fn malformed_trap_action_is_an_error() {
    let temp = Project::empty();
    let tree = json!({"sequence": [
        {"simple": {"words": ["trap", "{not json", "EXIT"]}},
        {"simple": {"words": ["echo", "after"]}},
    ]});
    temp.run(&tree).exits_with(1).stdout_eq("").stderr_has("trap");
}
