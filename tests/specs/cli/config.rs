//! Configuration file specs

use crate::prelude::*;

fn failing_pipeline() -> serde_json::Value {
    pipe(vec![sh("exit 4"), cmd(&["true"])])
}

#[test]
fn pipeline_status_is_the_last_stage_without_config() {
    let temp = Project::empty();
    temp.run(&failing_pipeline()).exits_with(0);
}

#[test]
fn user_config_file_is_read() {
    let temp = Project::empty();
    temp.file("config/tern/config.toml", "[options]\npipefail = true\n");
    temp.run(&failing_pipeline()).exits_with(4);
}

#[test]
fn tern_config_overrides_the_user_file() {
    let temp = Project::empty();
    temp.file("config/tern/config.toml", "[options]\npipefail = true\n");
    let other = temp.file("other.toml", "[options]\npipefail = false\n");
    temp.run(&failing_pipeline())
        .env("TERN_CONFIG", &other)
        .exits_with(0);
}

#[test]
fn config_flag_wins_over_everything() {
    let temp = Project::empty();
    let off = temp.file("off.toml", "[options]\npipefail = false\n");
    let on = temp.file("on.toml", "[options]\npipefail = true\n");
    let path = temp.tree("t.json", &failing_pipeline());
    temp.tern()
        .env("TERN_CONFIG", &off)
        .args(&["--config", on.to_str().unwrap(), "run", path.to_str().unwrap()])
        .exits_with(4);
}

#[test]
fn bad_config_is_reported() {
    let temp = Project::empty();
    temp.file("config/tern/config.toml", "max_function_depth = 0\n");
    temp.run(&cmd(&["true"]))
        .exits_with(1)
        .stderr_has("depth limits must be greater than zero");
}

#[test]
fn function_depth_limit_comes_from_config() {
    let temp = Project::empty();
    temp.file("config/tern/config.toml", "max_function_depth = 10\n");
    let tree = seq(vec![function("f", cmd(&["f"])), cmd(&["f"])]);
    temp.run(&tree)
        .exits_with(1)
        .stderr_has("f: recursion too deep");
}

#[test]
fn log_file_receives_engine_events() {
    let temp = Project::empty();
    let log = temp.path().join("logs/tern.log");
    temp.run(&sh("true"))
        .env("TERN_LOG", "tern_shell=debug")
        .env("TERN_LOG_FILE", &log)
        .passes();
    let text = temp.read("logs/tern.log");
    assert!(text.contains("spawned"), "log was:\n{text}");
}
