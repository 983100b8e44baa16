// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Function calls and sourced scripts.

use std::fs;
use std::sync::Arc;

use tern_core::{status, Node};
use tracing::debug;

use crate::error::ExecError;
use crate::shell::{Shell, DEFAULT_PATH};
use crate::traps::TrapCondition;
use crate::unwind::{Catch, CheckpointKind, JumpLevel, Unwind, UnwindKind};

use super::ExecFlags;

impl Shell {
    /// Call function `name` with `args` as its positional parameters.
    pub fn call_function(&mut self, name: &str, args: Vec<String>) -> Result<i32, Unwind> {
        let Some(entry) = self.functions.get(name) else {
            return Err(ExecError::NotFound {
                name: name.to_string(),
            }
            .into());
        };
        if self.fn_depth >= self.config.max_function_depth {
            return Err(Unwind::too_deep(name));
        }
        let body = Arc::clone(&entry.body);
        let id = entry.id();
        let statics = entry.statics.clone();

        let frame = self.vars.push_frame();
        let scope = self.scopes.push_function(name, args, frame);
        for (var, value) in &statics {
            if let Err(err) = self.vars.set_local(var, Some(value.clone())) {
                debug!(function = name, error = %err, "static not restored");
            }
        }
        self.scopes.current_mut().statics = statics.into_keys().collect();

        self.fn_depth += 1;
        let result = self.guarded(CheckpointKind::Function, Catch::Only(JumpLevel::Fun), |sh| {
            sh.execute(&body, ExecFlags::ERREXIT)
        });
        self.fn_depth -= 1;

        let names = self.scopes.current().statics.clone();
        let kept = self.vars.top_values(&names);
        if let Some(entry) = self.functions.get_mut(name) {
            if entry.id() == id {
                entry.statics.extend(kept);
            }
        }
        let popped = self.scopes.pop(scope);
        self.vars.truncate(frame);

        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(unwind)) => unwind.status,
            Err(unwind) => return Err(self.function_unwind(unwind)),
        };
        self.exit_status = status;

        if let Some(action) = popped.traps.action(TrapCondition::Exit) {
            self.run_function_exit_trap(&action)?;
        }
        Ok(status)
    }

    fn run_function_exit_trap(&mut self, action: &Node) -> Result<(), Unwind> {
        let saved = self.exit_status;
        let result = self.guarded(CheckpointKind::Trap, Catch::UpTo(JumpLevel::Trap), |sh| {
            sh.execute(action, ExecFlags::empty())
        });
        self.exit_status = saved;
        result.map(|_| ())
    }

    /// The outermost function boundary turns runaway recursion into a fatal
    /// error.
    fn function_unwind(&mut self, unwind: Unwind) -> Unwind {
        match unwind.kind {
            UnwindKind::TooDeep { name } if self.fn_depth == 0 => {
                self.report(&format_args!("{name}: recursion too deep"));
                Unwind::abort(status::FAILURE, self.fatal_level())
            }
            _ => unwind,
        }
    }

    /// Run the script `name` in the current shell (`.` and `source`).
    pub fn source_file(&mut self, name: &str, args: Option<Vec<String>>) -> Result<i32, Unwind> {
        if self.dot_depth >= self.config.max_source_depth {
            return Err(ExecError::TooDeep {
                name: name.to_string(),
            }
            .into());
        }
        let path_value = self.vars.get("PATH").unwrap_or(DEFAULT_PATH).to_string();
        let Some(path) = self.path.find_file(name, &path_value) else {
            return Err(ExecError::NotFound {
                name: name.to_string(),
            }
            .into());
        };
        let text = fs::read_to_string(&path).map_err(|source| ExecError::Redirect {
            target: name.to_string(),
            source,
        })?;
        let Some(parser) = &self.parser else {
            return Err(ExecError::NoParser(name.to_string()).into());
        };
        let tree = parser
            .parse(&text, &path.to_string_lossy())
            .map_err(|message| ExecError::Parse(format!("{name}: {message}")))?;
        debug!(file = %path.display(), "sourcing");

        let scope = self.scopes.push_source(name, args);
        self.dot_depth += 1;
        let result = self.guarded(CheckpointKind::Source, Catch::Only(JumpLevel::Fun), |sh| {
            sh.execute(&tree, ExecFlags::ERREXIT)
        });
        self.dot_depth -= 1;
        self.scopes.pop(scope);
        match result {
            Ok(Ok(status)) => Ok(status),
            Ok(Err(unwind)) => Ok(unwind.status),
            Err(unwind) => Err(unwind),
        }
    }
}
