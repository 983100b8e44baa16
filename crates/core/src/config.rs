// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Interpreter configuration.
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! interactive = false
//! max_function_depth = 1024
//! time_format = "%2lR real"
//!
//! [options]
//! errexit = true
//! pipefail = true
//!
//! [fork_retry]
//! initial_delay_ms = 1000
//! max_delay_ms = 16000
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::time_fmt::DEFAULT_TIME_FORMAT;

/// Nesting limit for function calls and sourced scripts.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Shell options toggled by `set`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellOptions {
    /// `set -e`
    pub errexit: bool,
    /// `set -o pipefail`
    pub pipefail: bool,
    /// `set -m`: job control
    pub monitor: bool,
    /// `set -n`: read but do not execute
    pub noexec: bool,
    /// `set -u`
    pub nounset: bool,
    /// `set -C`
    pub noclobber: bool,
    /// `set -x`
    pub xtrace: bool,
}

impl ShellOptions {
    /// Look an option up by its `set -o` name.
    pub fn get(&self, name: &str) -> Option<bool> {
        Some(match name {
            "errexit" => self.errexit,
            "pipefail" => self.pipefail,
            "monitor" => self.monitor,
            "noexec" => self.noexec,
            "nounset" => self.nounset,
            "noclobber" => self.noclobber,
            "xtrace" => self.xtrace,
            _ => return None,
        })
    }

    /// Set an option by its `set -o` name. Returns `false` for unknown names.
    pub fn set(&mut self, name: &str, value: bool) -> bool {
        let slot = match name {
            "errexit" => &mut self.errexit,
            "pipefail" => &mut self.pipefail,
            "monitor" => &mut self.monitor,
            "noexec" => &mut self.noexec,
            "nounset" => &mut self.nounset,
            "noclobber" => &mut self.noclobber,
            "xtrace" => &mut self.xtrace,
            _ => return false,
        };
        *slot = value;
        true
    }

    /// Map a single-letter `set` flag to its option name.
    pub fn name_for_flag(flag: char) -> Option<&'static str> {
        Some(match flag {
            'e' => "errexit",
            'm' => "monitor",
            'n' => "noexec",
            'u' => "nounset",
            'C' => "noclobber",
            'x' => "xtrace",
            _ => return None,
        })
    }

    /// `$-` style flag string.
    pub fn flags(&self) -> String {
        [
            (self.errexit, 'e'),
            (self.monitor, 'm'),
            (self.noexec, 'n'),
            (self.nounset, 'u'),
            (self.noclobber, 'C'),
            (self.xtrace, 'x'),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, c)| *c)
        .collect()
    }

    pub const NAMES: [&'static str; 7] = [
        "errexit",
        "monitor",
        "noclobber",
        "noexec",
        "nounset",
        "pipefail",
        "xtrace",
    ];
}

/// Backoff applied when the system refuses to create a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ForkRetry {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ForkRetry {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1000,
            max_delay_ms: 16_000,
        }
    }
}

impl ForkRetry {
    /// Delays to sleep between attempts, doubling up to the cap.
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let max = self.max_delay_ms;
        std::iter::successors(Some(self.initial_delay_ms), move |d| {
            d.checked_mul(2).filter(|next| *next <= max)
        })
        .filter(move |d| *d <= max)
        .map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Name used as `$0` and as the diagnostic prefix.
    pub name: String,
    pub interactive: bool,
    pub options: ShellOptions,
    /// Nested function calls allowed before `recursion too deep`.
    ///
    /// Each level costs native stack. The default needs far more than an
    /// 8 MB main thread in debug builds; run the interpreter on a larger
    /// thread (the `tern` binary uses 256 MB) or lower the limit.
    pub max_function_depth: usize,
    /// Nested `.` scripts allowed; same stack cost as functions.
    pub max_source_depth: usize,
    /// Format used when `TIMEFORMAT` is unset.
    pub time_format: String,
    pub fork_retry: ForkRetry,
    /// Let the final command of a script replace the shell process.
    pub exec_last_command: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            name: "tern".to_string(),
            interactive: false,
            options: ShellOptions::default(),
            max_function_depth: DEFAULT_MAX_DEPTH,
            max_source_depth: DEFAULT_MAX_DEPTH,
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            fork_retry: ForkRetry::default(),
            exec_last_command: false,
        }
    }
}

impl ShellConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: ShellConfig = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.check()?;
        Ok(config)
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load `path` when it exists, otherwise fall back to defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// `<config dir>/tern/config.toml`, e.g. `~/.config/tern/config.toml`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tern").join("config.toml"))
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.max_function_depth == 0 || self.max_source_depth == 0 {
            return Err(ConfigError::Invalid(
                "depth limits must be greater than zero".to_string(),
            ));
        }
        if self.fork_retry.initial_delay_ms > self.fork_retry.max_delay_ms {
            return Err(ConfigError::Invalid(
                "fork_retry.initial_delay_ms exceeds max_delay_ms".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
