// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Layered variable store.
//!
//! Frame 0 holds globals. Function calls push a frame for their locals and
//! prefix assignments (`x=1 cmd`) push a temporary exported frame. Lookups
//! walk from the innermost frame outwards, so pushing and popping a scope is
//! O(1) regardless of how many variables exist.

use std::collections::{BTreeMap, HashMap};

use crate::error::ExecError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Var {
    /// `None` for a name declared (e.g. `local x`) but not assigned.
    pub value: Option<String>,
    pub exported: bool,
    pub readonly: bool,
}

#[derive(Debug, Clone, Default)]
struct Frame {
    vars: HashMap<String, Var>,
}

#[derive(Debug, Clone)]
pub struct Variables {
    frames: Vec<Frame>,
}

impl Default for Variables {
    fn default() -> Self {
        Self::new()
    }
}

impl Variables {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    /// Globals seeded from `(name, value)` pairs, all exported.
    pub fn from_env(env: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut vars = Self::new();
        for (name, value) in env {
            vars.frames[0].vars.insert(
                name,
                Var {
                    value: Some(value),
                    exported: true,
                    readonly: false,
                },
            );
        }
        vars
    }

    /// Innermost binding of `name`, set or not.
    pub fn lookup(&self, name: &str) -> Option<&Var> {
        self.frames.iter().rev().find_map(|f| f.vars.get(name))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Var> {
        self.frames.iter_mut().rev().find_map(|f| f.vars.get_mut(name))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.lookup(name).and_then(|v| v.value.as_deref())
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Assign to the innermost binding, creating a global when none exists.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<(), ExecError> {
        let value = value.into();
        match self.lookup_mut(name) {
            Some(var) if var.readonly => Err(ExecError::ReadOnly {
                name: name.to_string(),
            }),
            Some(var) => {
                var.value = Some(value);
                Ok(())
            }
            None => {
                self.frames[0].vars.insert(
                    name.to_string(),
                    Var {
                        value: Some(value),
                        ..Var::default()
                    },
                );
                Ok(())
            }
        }
    }

    /// Create (or overwrite) a binding in the innermost frame.
    pub fn set_local(&mut self, name: &str, value: Option<String>) -> Result<(), ExecError> {
        if self.lookup(name).is_some_and(|v| v.readonly) {
            return Err(ExecError::ReadOnly {
                name: name.to_string(),
            });
        }
        let frame = self.top_mut();
        let var = frame.vars.entry(name.to_string()).or_default();
        if value.is_some() {
            var.value = value;
        }
        Ok(())
    }

    /// Whether the innermost frame already binds `name`.
    pub fn has_local(&self, name: &str) -> bool {
        self.frames
            .last()
            .is_some_and(|frame| frame.vars.contains_key(name))
    }

    /// Mark the innermost binding exported, creating a global if needed.
    pub fn export(&mut self, name: &str, value: Option<String>) -> Result<(), ExecError> {
        if let Some(value) = value {
            self.set(name, value)?;
        }
        match self.lookup_mut(name) {
            Some(var) => var.exported = true,
            None => {
                self.frames[0].vars.insert(
                    name.to_string(),
                    Var {
                        exported: true,
                        ..Var::default()
                    },
                );
            }
        }
        Ok(())
    }

    pub fn set_readonly(&mut self, name: &str, value: Option<String>) -> Result<(), ExecError> {
        if let Some(value) = value {
            self.set(name, value)?;
        }
        match self.lookup_mut(name) {
            Some(var) => var.readonly = true,
            None => {
                self.frames[0].vars.insert(
                    name.to_string(),
                    Var {
                        readonly: true,
                        ..Var::default()
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove the innermost binding of `name`.
    pub fn unset(&mut self, name: &str) -> Result<(), ExecError> {
        for frame in self.frames.iter_mut().rev() {
            if let Some(var) = frame.vars.get(name) {
                if var.readonly {
                    return Err(ExecError::ReadOnly {
                        name: name.to_string(),
                    });
                }
                frame.vars.remove(name);
                break;
            }
        }
        Ok(())
    }

    /// Push a frame; the returned depth is what [`truncate`](Self::truncate)
    /// restores to.
    pub fn push_frame(&mut self) -> usize {
        let depth = self.frames.len();
        self.frames.push(Frame::default());
        depth
    }

    /// Push a frame of exported bindings for `name=value cmd`.
    pub fn push_temporary(&mut self, assignments: Vec<(String, String)>) -> usize {
        let depth = self.push_frame();
        let frame = self.top_mut();
        for (name, value) in assignments {
            frame.vars.insert(
                name,
                Var {
                    value: Some(value),
                    exported: true,
                    readonly: false,
                },
            );
        }
        depth
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Drop frames down to `depth`; frame 0 always survives.
    pub fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth.max(1));
    }

    /// Values of `names` bound in the innermost frame.
    pub fn top_values(&self, names: &[String]) -> HashMap<String, String> {
        let Some(frame) = self.frames.last() else {
            return HashMap::new();
        };
        names
            .iter()
            .filter_map(|name| {
                let value = frame.vars.get(name)?.value.clone()?;
                Some((name.clone(), value))
            })
            .collect()
    }

    /// Environment for child processes: every exported variable with a value.
    pub fn exported(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        for frame in &self.frames {
            for (name, var) in &frame.vars {
                match (&var.value, var.exported) {
                    (Some(value), true) => {
                        env.insert(name.clone(), value.clone());
                    }
                    _ => {
                        env.remove(name);
                    }
                }
            }
        }
        env
    }

    /// Every visible variable with a value, sorted by name.
    pub fn visible(&self) -> BTreeMap<String, &Var> {
        let mut all = BTreeMap::new();
        for frame in &self.frames {
            for (name, var) in &frame.vars {
                all.insert(name.clone(), var);
            }
        }
        all.retain(|_, var| var.value.is_some());
        all
    }

    fn top_mut(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }
}

#[cfg(test)]
#[path = "vars_tests.rs"]
mod tests;
