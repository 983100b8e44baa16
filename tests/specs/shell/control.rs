//! Control flow through the binary

use serde_json::json;

use crate::prelude::*;

#[test]
fn if_test_selects_the_branch() {
    let temp = Project::empty();
    let tree = seq(vec![
        assign("x", "1"),
        json!({"if": {
            "test": {"test": {"expr": {"binary": {"op": "match", "lhs": param("x"), "rhs": "1"}}}},
            "then": cmd(&["echo", "ok"]),
            "else": cmd(&["echo", "fail"]),
        }}),
    ]);
    temp.run(&tree).passes().stdout_eq("ok\n");
}

#[test]
fn break_ends_the_loop_before_the_matching_word() {
    let temp = Project::empty();
    let body = seq(vec![
        json!({"if": {
            "test": {"test": {"expr": {"binary": {"op": "match", "lhs": param("x"), "rhs": "b"}}}},
            "then": cmd(&["break"]),
        }}),
        cmd_words(vec![json!("echo"), param("x")]),
    ]);
    let tree = json!({"for": {"var": "x", "words": ["a", "b", "c"], "body": body}});
    temp.run(&tree).passes().stdout_eq("a\n");
}

#[test]
fn script_arguments_are_positional_parameters() {
    let temp = Project::empty();
    let tree = seq(vec![
        cmd_words(vec![json!("echo"), param("#"), param("1"), param("2")]),
        json!({"for": {"var": "a", "body": cmd_words(vec![json!("echo"), param("a")])}}),
    ]);
    let path = temp.tree("args.json", &tree);
    temp.tern()
        .args(&["run", path.to_str().unwrap(), "one", "two"])
        .passes()
        .stdout_eq("2 one two\none\ntwo\n");
}

#[test]
fn exit_status_is_the_process_status() {
    let temp = Project::empty();
    temp.run(&seq(vec![cmd(&["echo", "before"]), cmd(&["exit", "7"]), cmd(&["echo", "after"])]))
        .exits_with(7)
        .stdout_eq("before\n");
}

#[test]
fn errexit_from_the_command_line_stops_the_script() {
    let temp = Project::empty();
    let path = temp.tree("t.json", &seq(vec![cmd(&["false"]), cmd(&["echo", "after"])]));
    temp.tern()
        .args(&["run", "-o", "errexit", path.to_str().unwrap()])
        .exits_with(1)
        .stdout_eq("");
}

#[test]
fn runaway_recursion_ends_the_script_cleanly() {
    let temp = Project::empty();
    let tree = seq(vec![
        function("f", cmd(&["f"])),
        cmd(&["f"]),
        cmd(&["echo", "unreachable"]),
    ]);
    temp.run(&tree)
        .exits_with(1)
        .stdout_eq("")
        .stderr_has("f: recursion too deep");
}

#[test]
fn sourced_file_shares_the_scripts_variables() {
    let temp = Project::empty();
    let lib = temp.tree("lib.json", &seq(vec![assign("greeting", "hello"), cmd(&["return", "3"])]));
    let tree = seq(vec![
        cmd(&[".", lib.to_str().unwrap()]),
        cmd_words(vec![json!("echo"), param("greeting"), param("?")]),
    ]);
    temp.run(&tree).passes().stdout_eq("hello 3\n");
}

#[test]
fn eval_runs_serialized_text() {
    let temp = Project::empty();
    let inner = cmd(&["echo", "evaluated"]).to_string();
    temp.run(&cmd(&["eval", &inner]))
        .passes()
        .stdout_eq("evaluated\n");
}

#[test]
fn subshell_changes_stay_inside() {
    let temp = Project::empty();
    let tree = seq(vec![
        assign("x", "outer"),
        json!({"subshell": seq(vec![assign("x", "inner"), cmd_words(vec![json!("echo"), param("x")])])}),
        cmd_words(vec![json!("echo"), param("x")]),
    ]);
    temp.run(&tree).passes().stdout_eq("inner\nouter\n");
}
