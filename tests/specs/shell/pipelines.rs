//! Pipelines through the binary

use crate::prelude::*;

#[test]
fn stages_are_connected() {
    let temp = Project::empty();
    temp.run(&pipe(vec![cmd(&["echo", "hi"]), cmd(&["tr", "a-z", "A-Z"])]))
        .passes()
        .stdout_eq("HI\n");
}

#[test]
fn three_stages() {
    let temp = Project::empty();
    let tree = pipe(vec![
        cmd(&["printf", "c\\nb\\na\\n"]),
        cmd(&["sort"]),
        cmd(&["head", "-n", "2"]),
    ]);
    temp.run(&tree).passes().stdout_eq("a\nb\n");
}

#[test]
fn status_is_the_last_stage_by_default() {
    let temp = Project::empty();
    temp.run(&pipe(vec![sh("exit 5"), cmd(&["true"]), cmd(&["true"])]))
        .exits_with(0);
    temp.run(&pipe(vec![cmd(&["true"]), sh("exit 3")]))
        .exits_with(3);
}

#[test]
fn pipefail_reports_the_rightmost_failure() {
    let temp = Project::empty();
    let first = temp.tree("first.json", &pipe(vec![sh("exit 5"), cmd(&["true"]), cmd(&["true"])]));
    let both = temp.tree("both.json", &pipe(vec![sh("exit 5"), sh("exit 4"), cmd(&["true"])]));
    temp.tern()
        .args(&["run", "-o", "pipefail", first.to_str().unwrap()])
        .exits_with(5);
    temp.tern()
        .args(&["run", "-o", "pipefail", both.to_str().unwrap()])
        .exits_with(4);
}

#[test]
fn function_can_be_a_stage() {
    let temp = Project::empty();
    let tree = seq(vec![
        function("shout", cmd(&["tr", "a-z", "A-Z"])),
        pipe(vec![cmd(&["echo", "quiet"]), cmd(&["shout"])]),
    ]);
    temp.run(&tree).passes().stdout_eq("QUIET\n");
}
