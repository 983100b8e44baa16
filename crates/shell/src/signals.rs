// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Asynchronous signal notices.
//!
//! Handlers only set an atomic flag. The interpreter drains the flags at safe
//! points ([`Shell::check_signals`](crate::Shell::check_signals)) where it is
//! free to reap children, run traps or unwind.

use std::collections::BTreeMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::FORBIDDEN;
use signal_hook::low_level;
use signal_hook::SigId;
use tracing::debug;

#[derive(Debug)]
struct Watched {
    flag: Arc<AtomicBool>,
    id: SigId,
}

/// Signals with a registered flag. Once watched, a signal stays watched for
/// the life of the watcher; the shell decides what a notice means.
#[derive(Debug, Default)]
pub struct SignalWatcher {
    watched: BTreeMap<i32, Watched>,
}

impl SignalWatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start recording `signal`. Watching twice is a no-op.
    pub fn watch(&mut self, signal: i32) -> io::Result<()> {
        if self.watched.contains_key(&signal) {
            return Ok(());
        }
        if FORBIDDEN.contains(&signal) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("signal {signal} cannot be caught"),
            ));
        }
        let flag = Arc::new(AtomicBool::new(false));
        let id = signal_hook::flag::register(signal, Arc::clone(&flag))?;
        debug!(signal, "watching signal");
        self.watched.insert(signal, Watched { flag, id });
        Ok(())
    }

    /// Signals received since the last call, lowest number first.
    pub fn take_pending(&self) -> Vec<i32> {
        self.watched
            .iter()
            .filter(|(_, watched)| watched.flag.swap(false, Ordering::AcqRel))
            .map(|(signal, _)| *signal)
            .collect()
    }
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        for (_, watched) in std::mem::take(&mut self.watched) {
            low_level::unregister(watched.id);
        }
    }
}

/// Apply the default action of `signal` to this process.
pub fn default_action(signal: i32) {
    if let Err(err) = low_level::emulate_default_handler(signal) {
        debug!(signal, error = %err, "cannot emulate default signal action");
    }
}

#[cfg(test)]
#[path = "signals_tests.rs"]
mod tests;
