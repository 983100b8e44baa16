// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the CLI crate.

use std::path::PathBuf;

fn non_empty(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.is_empty())
}

// --- Configuration ---

/// Config file named by TERN_CONFIG.
pub fn config_path() -> Option<PathBuf> {
    non_empty("TERN_CONFIG").map(PathBuf::from)
}

// --- Logging ---

/// `EnvFilter` directives from TERN_LOG, e.g. `tern_shell=debug`.
pub fn log_filter() -> Option<String> {
    non_empty("TERN_LOG")
}

/// Log to this file instead of standard error.
pub fn log_file() -> Option<PathBuf> {
    non_empty("TERN_LOG_FILE").map(PathBuf::from)
}
