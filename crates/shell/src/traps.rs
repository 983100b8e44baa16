// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trap conditions and the per-scope trap table.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use nix::sys::signal::Signal;
use tern_core::Node;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TrapCondition {
    Exit,
    Err,
    Debug,
    /// Raw signal number.
    Signal(i32),
}

impl TrapCondition {
    /// Parse `EXIT`, `0`, `ERR`, `DEBUG`, `INT`, `SIGINT` or a signal number.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "EXIT" | "0" => return Some(TrapCondition::Exit),
            "ERR" => return Some(TrapCondition::Err),
            "DEBUG" => return Some(TrapCondition::Debug),
            _ => {}
        }
        if let Ok(number) = name.parse::<i32>() {
            return Signal::try_from(number)
                .ok()
                .map(|sig| TrapCondition::Signal(sig as i32));
        }
        let upper = name.to_ascii_uppercase();
        let full = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{upper}")
        };
        full.parse::<Signal>()
            .ok()
            .map(|sig| TrapCondition::Signal(sig as i32))
    }

    pub fn signal(&self) -> Option<i32> {
        match self {
            TrapCondition::Signal(sig) => Some(*sig),
            _ => None,
        }
    }
}

impl fmt::Display for TrapCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrapCondition::Exit => f.write_str("EXIT"),
            TrapCondition::Err => f.write_str("ERR"),
            TrapCondition::Debug => f.write_str("DEBUG"),
            TrapCondition::Signal(sig) => match Signal::try_from(*sig) {
                Ok(signal) => f.write_str(signal.as_str().trim_start_matches("SIG")),
                Err(_) => write!(f, "{sig}"),
            },
        }
    }
}

/// An installed trap. An empty `text` with no action means "ignore".
#[derive(Debug, Clone)]
pub struct Trap {
    pub text: String,
    pub action: Option<Arc<Node>>,
}

impl Trap {
    pub fn ignore() -> Self {
        Self {
            text: String::new(),
            action: None,
        }
    }

    pub fn run(text: impl Into<String>, action: Node) -> Self {
        Self {
            text: text.into(),
            action: Some(Arc::new(action)),
        }
    }

    pub fn is_ignore(&self) -> bool {
        self.action.is_none()
    }
}

#[derive(Debug, Clone, Default)]
pub struct TrapTable {
    traps: BTreeMap<TrapCondition, Trap>,
}

impl TrapTable {
    pub fn get(&self, condition: TrapCondition) -> Option<&Trap> {
        self.traps.get(&condition)
    }

    /// The handler to run for `condition`, if one is installed.
    pub fn action(&self, condition: TrapCondition) -> Option<Arc<Node>> {
        self.traps.get(&condition).and_then(|t| t.action.clone())
    }

    pub fn set(&mut self, condition: TrapCondition, trap: Trap) {
        self.traps.insert(condition, trap);
    }

    pub fn clear(&mut self, condition: TrapCondition) -> Option<Trap> {
        self.traps.remove(&condition)
    }

    pub fn is_empty(&self) -> bool {
        self.traps.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TrapCondition, &Trap)> {
        self.traps.iter()
    }

    /// Copy for a function call: signal traps carry over, EXIT does not.
    pub fn for_function(&self) -> TrapTable {
        let mut table = self.clone();
        table.traps.remove(&TrapCondition::Exit);
        table
    }

    /// Copy for a subshell: only ignored conditions survive.
    pub fn for_subshell(&self) -> TrapTable {
        TrapTable {
            traps: self
                .traps
                .iter()
                .filter(|(_, trap)| trap.is_ignore())
                .map(|(cond, trap)| (*cond, trap.clone()))
                .collect(),
        }
    }

    /// Whether replacing the process image would skip a handler that must
    /// still run (an EXIT trap or a signal trap).
    pub fn forbids_exec(&self) -> bool {
        self.traps.iter().any(|(cond, trap)| {
            !trap.is_ignore() && matches!(cond, TrapCondition::Exit | TrapCondition::Signal(_))
        })
    }
}

#[cfg(test)]
#[path = "traps_tests.rs"]
mod tests;
