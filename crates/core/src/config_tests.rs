// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;
use std::time::Duration;

use super::*;

#[test]
fn empty_document_uses_defaults() {
    let config = ShellConfig::from_toml_str("", Path::new("config.toml")).unwrap();
    assert_eq!(config, ShellConfig::default());
    assert_eq!(config.max_function_depth, 1024);
    assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
}

#[test]
fn parses_options_and_limits() {
    let text = r#"
        interactive = true
        max_function_depth = 64

        [options]
        errexit = true
        pipefail = true
    "#;
    let config = ShellConfig::from_toml_str(text, Path::new("config.toml")).unwrap();
    assert!(config.interactive);
    assert_eq!(config.max_function_depth, 64);
    assert_eq!(config.max_source_depth, DEFAULT_MAX_DEPTH);
    assert!(config.options.errexit);
    assert!(config.options.pipefail);
    assert!(!config.options.monitor);
}

#[test]
fn rejects_unknown_fields() {
    let err = ShellConfig::from_toml_str("bogus = 1", Path::new("x.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got {err:?}");
}

#[test]
fn rejects_zero_depth() {
    let err =
        ShellConfig::from_toml_str("max_function_depth = 0", Path::new("x.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
}

#[test]
fn load_reads_file_and_missing_file_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");

    assert_eq!(
        ShellConfig::load_or_default(&path).unwrap(),
        ShellConfig::default()
    );
    assert!(matches!(
        ShellConfig::load(&path),
        Err(ConfigError::Read { .. })
    ));

    std::fs::write(&path, "name = \"mysh\"\n").unwrap();
    assert_eq!(ShellConfig::load(&path).unwrap().name, "mysh");
}

#[test]
fn fork_retry_doubles_up_to_cap() {
    let delays: Vec<_> = ForkRetry::default().delays().collect();
    assert_eq!(
        delays,
        [1, 2, 4, 8, 16].map(Duration::from_secs).to_vec()
    );

    let short = ForkRetry {
        initial_delay_ms: 10,
        max_delay_ms: 35,
    };
    assert_eq!(short.delays().count(), 2);
}

#[yare::parameterized(
    errexit   = { 'e', "errexit" },
    monitor   = { 'm', "monitor" },
    noclobber = { 'C', "noclobber" },
    xtrace    = { 'x', "xtrace" },
)]
fn option_flags(flag: char, name: &str) {
    assert_eq!(ShellOptions::name_for_flag(flag), Some(name));
    let mut options = ShellOptions::default();
    assert!(options.set(name, true));
    assert_eq!(options.get(name), Some(true));
    assert_eq!(options.flags(), flag.to_string());
}

#[test]
fn unknown_option_names_are_rejected() {
    let mut options = ShellOptions::default();
    assert!(!options.set("emacs", true));
    assert_eq!(options.get("emacs"), None);
    assert_eq!(ShellOptions::name_for_flag('z'), None);
}
