//! Process replacement and exit status of external commands

use crate::prelude::*;

fn parent_pid(output: &str) -> u32 {
    output.trim().parse().unwrap()
}

#[test]
fn last_command_replaces_the_shell_with_exec_last() {
    let temp = Project::empty();
    let path = temp.tree("t.json", &seq(vec![cmd(&["true"]), sh("echo $PPID")]));
    let run = temp
        .tern()
        .args(&["run", "--exec-last", path.to_str().unwrap()])
        .passes();
    assert_eq!(parent_pid(&run.stdout()), std::process::id());
}

#[test]
fn last_command_is_a_child_by_default() {
    let temp = Project::empty();
    let run = temp.run(&seq(vec![cmd(&["true"]), sh("echo $PPID")])).passes();
    assert_ne!(parent_pid(&run.stdout()), std::process::id());
}

#[test]
fn failed_exec_of_the_last_command_exits_127() {
    use std::os::unix::fs::PermissionsExt;

    let temp = Project::empty();
    let script = temp.file("orphan", "#!/nonexistent/tern-interpreter\necho never\n");
    std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
    let path = temp.tree(
        "t.json",
        &seq(vec![cmd(&["echo", "before"]), cmd(&[script.to_str().unwrap()])]),
    );
    temp.tern()
        .args(&["run", "--exec-last", path.to_str().unwrap()])
        .exits_with(127)
        .stdout_eq("before\n")
        .stderr_has("orphan");
}

#[test]
fn exit_trap_keeps_the_shell_alive() {
    let temp = Project::empty();
    let action = cmd(&["echo", "bye"]).to_string();
    let tree = seq(vec![cmd(&["trap", &action, "EXIT"]), sh("echo $PPID")]);
    let path = temp.tree("t.json", &tree);
    let run = temp
        .tern()
        .args(&["run", "--exec-last", path.to_str().unwrap()])
        .passes();
    let stdout = run.stdout();
    let mut lines = stdout.lines();
    assert_ne!(parent_pid(lines.next().unwrap()), std::process::id());
    assert_eq!(lines.next(), Some("bye"));
}

#[test]
fn exec_builtin_replaces_the_shell() {
    let temp = Project::empty();
    temp.run(&seq(vec![
        cmd(&["exec", "sh", "-c", "exit 6"]),
        cmd(&["echo", "unreachable"]),
    ]))
    .exits_with(6)
    .stdout_eq("");
}

#[test]
fn child_killed_by_signal_reports_128_plus_signal() {
    let temp = Project::empty();
    temp.run(&sh("kill -TERM $$")).exits_with(143);
}

#[test]
fn exported_variables_reach_children() {
    let temp = Project::empty();
    let tree = seq(vec![
        assign("plain", "no"),
        assign("shared", "yes"),
        cmd(&["export", "shared"]),
        sh("echo \"[$plain] [$shared]\""),
    ]);
    temp.run(&tree).passes().stdout_eq("[] [yes]\n");
}
