// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn set_creates_global_and_updates_innermost_binding() {
    let mut vars = Variables::new();
    vars.set("x", "global").unwrap();

    let depth = vars.push_frame();
    vars.set_local("x", Some("local".into())).unwrap();
    assert_eq!(vars.get("x"), Some("local"));

    vars.set("x", "changed").unwrap();
    vars.set("y", "new").unwrap();
    vars.truncate(depth);

    assert_eq!(vars.get("x"), Some("global"));
    assert_eq!(vars.get("y"), Some("new"));
}

#[test]
fn declared_local_shadows_without_value() {
    let mut vars = Variables::new();
    vars.set("x", "outer").unwrap();
    vars.push_frame();
    vars.set_local("x", None).unwrap();
    assert_eq!(vars.get("x"), None);
    assert!(vars.has_local("x"));
}

#[test]
fn readonly_blocks_assignment_and_unset() {
    let mut vars = Variables::new();
    vars.set_readonly("r", Some("1".into())).unwrap();
    assert!(matches!(vars.set("r", "2"), Err(ExecError::ReadOnly { .. })));
    assert!(matches!(vars.unset("r"), Err(ExecError::ReadOnly { .. })));
    assert!(matches!(
        vars.set_local("r", Some("3".into())),
        Err(ExecError::ReadOnly { .. })
    ));
    assert_eq!(vars.get("r"), Some("1"));
}

#[test]
fn temporary_frame_is_exported_and_discarded() {
    let mut vars = Variables::from_env([("PATH".to_string(), "/bin".to_string())]);
    vars.set("plain", "x").unwrap();

    let depth = vars.push_temporary(vec![("LANG".into(), "C".into())]);
    let env = vars.exported();
    assert_eq!(env.get("LANG").map(String::as_str), Some("C"));
    assert_eq!(env.get("PATH").map(String::as_str), Some("/bin"));
    assert!(!env.contains_key("plain"));

    vars.truncate(depth);
    assert!(!vars.exported().contains_key("LANG"));
}

#[test]
fn unexported_local_hides_exported_global_from_children() {
    let mut vars = Variables::from_env([("TERM".to_string(), "xterm".to_string())]);
    vars.push_frame();
    vars.set_local("TERM", Some("dumb".into())).unwrap();
    assert!(!vars.exported().contains_key("TERM"));
}

#[test]
fn truncate_never_drops_globals() {
    let mut vars = Variables::new();
    vars.set("g", "1").unwrap();
    vars.truncate(0);
    assert_eq!(vars.depth(), 1);
    assert_eq!(vars.get("g"), Some("1"));
}

#[test]
fn top_values_reads_innermost_frame_only() {
    let mut vars = Variables::new();
    vars.set("count", "9").unwrap();
    vars.push_frame();
    vars.set_local("count", Some("3".into())).unwrap();
    let names = vec!["count".to_string(), "missing".to_string()];
    let values = vars.top_values(&names);
    assert_eq!(values.len(), 1);
    assert_eq!(values["count"], "3");
}
