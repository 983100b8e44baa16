//! CLI error handling specs
//!
//! Verify messages and exit codes for trees that cannot be run.

use crate::prelude::*;

#[test]
fn missing_tree_file_names_the_path() {
    let temp = Project::empty();
    temp.tern()
        .args(&["run", "absent.json"])
        .exits_with(1)
        .stderr_has("absent.json");
}

#[test]
fn malformed_json_is_rejected() {
    let temp = Project::empty();
    let path = temp.file("broken.json", "{\"simple\": ");
    temp.tern()
        .args(&["run", path.to_str().unwrap()])
        .exits_with(1)
        .stderr_has("broken.json");
}

#[test]
fn invalid_tree_is_not_run() {
    let temp = Project::empty();
    let tree = seq(vec![
        cmd(&["sh", "-c", "echo ran > ran.txt"]),
        pipe(vec![cmd(&["true"])]),
    ]);
    temp.run(&tree)
        .exits_with(2)
        .stderr_has("pipeline needs at least two stages");
    assert_eq!(temp.read("ran.txt"), "");
}

#[test]
fn unknown_shell_option_is_rejected() {
    let temp = Project::empty();
    let path = temp.tree("t.json", &cmd(&["true"]));
    temp.tern()
        .args(&["run", "-o", "turbo", path.to_str().unwrap()])
        .exits_with(1)
        .stderr_has("turbo: unknown option");
}

#[test]
fn unknown_command_exits_127() {
    let temp = Project::empty();
    temp.run(&cmd(&["tern-no-such-command"]))
        .exits_with(127)
        .stderr_has("tern-no-such-command: not found");
}
