//! `tern check` specs

use crate::prelude::*;

#[test]
fn valid_tree_passes() {
    let temp = Project::empty();
    let path = temp.tree("ok.json", &pipe(vec![cmd(&["ls"]), cmd(&["wc", "-l"])]));
    temp.tern()
        .args(&["check", path.to_str().unwrap()])
        .passes()
        .stdout_has("ok.json: ok");
}

#[test]
fn every_problem_is_listed() {
    let temp = Project::empty();
    let tree = seq(vec![
        pipe(vec![cmd(&["ls"])]),
        function("bad name", cmd(&["true"])),
    ]);
    let path = temp.tree("bad.json", &tree);
    temp.tern()
        .args(&["check", path.to_str().unwrap()])
        .exits_with(1)
        .stderr_has("at least two stages")
        .stderr_has("`bad name` is not a valid function name")
        .stderr_has("2 problem(s) found");
}

#[test]
fn check_does_not_run_the_tree() {
    let temp = Project::empty();
    let path = temp.tree("t.json", &sh("echo ran > ran.txt"));
    temp.tern().args(&["check", path.to_str().unwrap()]).passes();
    assert_eq!(temp.read("ran.txt"), "");
}

#[test]
fn tree_can_come_from_stdin() {
    let temp = Project::empty();
    temp.tern()
        .args(&["check", "-"])
        .stdin(cmd(&["true"]).to_string())
        .passes()
        .stdout_has("-: ok");
}
