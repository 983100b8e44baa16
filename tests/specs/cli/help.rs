//! CLI help and version specs

use crate::prelude::*;

#[test]
fn no_subcommand_prints_help() {
    let temp = Project::empty();
    temp.tern()
        .passes()
        .stdout_has("Usage:")
        .stdout_has("run")
        .stdout_has("check");
}

#[test]
fn version_is_reported() {
    let temp = Project::empty();
    temp.tern()
        .args(&["--version"])
        .passes()
        .stdout_has("tern ");
}

#[test]
fn run_help_lists_its_options() {
    let temp = Project::empty();
    temp.tern()
        .args(&["run", "--help"])
        .passes()
        .stdout_has("--option")
        .stdout_has("--exec-last");
}
