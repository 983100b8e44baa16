// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::cell::Cell;

/// How a command name resolved.
///
/// Built-in variants carry an index into the engine's built-in table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    SpecialBuiltin(usize),
    Function,
    Builtin(usize),
    External,
}

/// Per-node cache of the last [`Resolution`].
///
/// Entries are stamped with the engine's resolution generation; a stamp that
/// no longer matches means the entry is stale. The cache never takes part in
/// tree equality.
#[derive(Debug, Clone, Default)]
pub struct CommandCache(Cell<Option<(u64, Resolution)>>);

impl CommandCache {
    /// The cached resolution if it was stored under `generation`.
    pub fn get(&self, generation: u64) -> Option<Resolution> {
        match self.0.get() {
            Some((stamp, resolution)) if stamp == generation => Some(resolution),
            _ => None,
        }
    }

    pub fn set(&self, generation: u64, resolution: Resolution) {
        self.0.set(Some((generation, resolution)));
    }

    pub fn clear(&self) {
        self.0.set(None);
    }
}

impl PartialEq for CommandCache {
    fn eq(&self, _other: &Self) -> bool {
        true
    }
}
