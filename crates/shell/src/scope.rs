// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution scopes: positional parameters, traps and loop state.
//!
//! A function call gets a fresh loop state and its own copy of the caller's
//! signal traps; the caller's record is untouched and becomes current again
//! on pop. A sourced script shares the caller's variables, and on pop its
//! loop state and trap table flow back to the caller, so `break` inside a
//! sourced file ends the caller's loop.

use tracing::debug;

use crate::traps::TrapTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeKind {
    TopLevel,
    Function { name: String },
    Source { file: String },
}

/// Loop nesting and pending `break`/`continue`.
///
/// `pending > 0` means that many enclosing loops are being broken out of;
/// `pending < 0` means the `-pending`-th enclosing loop continues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopState {
    pub depth: usize,
    pub pending: i64,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub positionals: Vec<String>,
    /// Whether this scope replaced the caller's positionals.
    own_positionals: bool,
    pub traps: TrapTable,
    pub loops: LoopState,
    /// Variable frame depth to truncate to when the scope ends.
    pub frame_mark: usize,
    /// Names declared with `local -S`.
    pub statics: Vec<String>,
}

/// Proof of a push, consumed by the matching pop.
#[derive(Debug, PartialEq, Eq)]
#[must_use]
pub struct ScopeHandle(usize);

#[derive(Debug, Clone)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new(positionals: Vec<String>) -> Self {
        Self {
            scopes: vec![Scope {
                kind: ScopeKind::TopLevel,
                positionals,
                own_positionals: true,
                traps: TrapTable::default(),
                loops: LoopState::default(),
                frame_mark: 1,
                statics: Vec::new(),
            }],
        }
    }

    pub fn current(&self) -> &Scope {
        let last = self.scopes.len() - 1;
        &self.scopes[last]
    }

    pub fn current_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Enter a function: new positionals, reset loop state, no EXIT trap.
    pub fn push_function(
        &mut self,
        name: &str,
        args: Vec<String>,
        frame_mark: usize,
    ) -> ScopeHandle {
        let traps = self.current().traps.for_function();
        debug!(function = name, depth = self.scopes.len(), "enter function scope");
        self.scopes.push(Scope {
            kind: ScopeKind::Function {
                name: name.to_string(),
            },
            positionals: args,
            own_positionals: true,
            traps,
            loops: LoopState::default(),
            frame_mark,
            statics: Vec::new(),
        });
        ScopeHandle(self.scopes.len() - 1)
    }

    /// Enter a sourced script. Positionals are replaced only when `args`
    /// is given.
    pub fn push_source(&mut self, file: &str, args: Option<Vec<String>>) -> ScopeHandle {
        let parent = self.current();
        let own_positionals = args.is_some();
        let positionals = args.unwrap_or_else(|| parent.positionals.clone());
        let scope = Scope {
            kind: ScopeKind::Source {
                file: file.to_string(),
            },
            positionals,
            own_positionals,
            traps: parent.traps.clone(),
            loops: parent.loops,
            frame_mark: parent.frame_mark,
            statics: Vec::new(),
        };
        debug!(file, depth = self.scopes.len(), "enter source scope");
        self.scopes.push(scope);
        ScopeHandle(self.scopes.len() - 1)
    }

    /// Leave the scope opened by `handle` and return its record.
    ///
    /// Scopes pushed after `handle` and not popped are discarded first.
    pub fn pop(&mut self, handle: ScopeHandle) -> Scope {
        self.truncate(handle.0 + 1);
        let Some(scope) = self.scopes.pop() else {
            return ScopeStack::new(Vec::new()).scopes.remove(0);
        };
        if self.scopes.is_empty() {
            // The top-level scope is never popped.
            self.scopes.push(scope.clone());
            return scope;
        }
        if let ScopeKind::Source { .. } = scope.kind {
            let parent = self.current_mut();
            parent.loops = scope.loops;
            parent.traps = scope.traps.clone();
            if !scope.own_positionals {
                parent.positionals = scope.positionals.clone();
            }
        }
        scope
    }

    /// Discard scopes above `depth` without running any pop logic.
    pub fn truncate(&mut self, depth: usize) {
        self.scopes.truncate(depth.max(1));
    }
}

#[cfg(test)]
#[path = "scope_tests.rs"]
mod tests;
