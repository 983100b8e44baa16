// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The interpreter context.
//!
//! A [`Shell`] owns every piece of mutable interpreter state: variables,
//! functions, the scope stack, the job table, the descriptor save stack, and
//! the signal flags. It is built with [`ShellBuilder`] and driven through
//! [`Shell::run`] and [`Shell::finish`].

use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use nix::sys::signal::Signal;
use nix::unistd::{getpid, isatty, Pid};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use tern_core::{Location, Node, ShellConfig, ShellOptions};

use crate::builtins::{self, Builtin, BuiltinTable};
use crate::error::ExecError;
use crate::exec::ExecFlags;
use crate::jobs::{JobId, JobTable};
use crate::launcher;
use crate::path::PathResolver;
use crate::pattern::{GlobMatcher, PatternMatcher};
use crate::redirect::{flush_stdio, RedirectionManager};
use crate::scope::ScopeStack;
use crate::signals::{self, SignalWatcher};
use crate::traps::{Trap, TrapCondition};
use crate::unwind::{Catch, CheckpointKind, JumpLevel, Unwind, UnwindKind};
use crate::vars::Variables;

/// `PATH` used when the variable is unset.
pub const DEFAULT_PATH: &str = "/usr/local/bin:/usr/bin:/bin";

/// Turns script text into a command tree. Used by `.`, `eval` and `trap`.
pub trait ScriptParser {
    fn parse(&self, text: &str, file: &str) -> Result<Node, String>;
}

static NEXT_FUNCTION_ID: AtomicU64 = AtomicU64::new(1);

/// A defined function.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub body: Arc<Node>,
    pub location: Location,
    /// Values of `local -S` variables carried between calls.
    pub statics: HashMap<String, String>,
    /// Changes on every (re)definition.
    id: u64,
}

impl FunctionEntry {
    pub fn new(body: Arc<Node>, location: Location) -> Self {
        Self {
            body,
            location,
            statics: HashMap::new(),
            id: NEXT_FUNCTION_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }
}

/// The pipeline whose in-process stage is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PipelineCtx {
    pub job: Option<JobId>,
    pub pgid: Option<Pid>,
}

/// Builder for [`Shell`].
pub struct ShellBuilder {
    config: ShellConfig,
    arg0: Option<String>,
    args: Vec<String>,
    env: Option<Vec<(String, String)>>,
    builtins: Vec<Arc<dyn Builtin>>,
    parser: Option<Box<dyn ScriptParser>>,
    matcher: Box<dyn PatternMatcher>,
    seed: Option<u64>,
}

impl Default for ShellBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellBuilder {
    pub fn new() -> Self {
        Self {
            config: ShellConfig::default(),
            arg0: None,
            args: Vec::new(),
            env: None,
            builtins: Vec::new(),
            parser: None,
            matcher: Box::new(GlobMatcher),
            seed: None,
        }
    }

    pub fn config(mut self, config: ShellConfig) -> Self {
        self.config = config;
        self
    }

    /// `$0`; defaults to the configured shell name.
    pub fn arg0(mut self, arg0: impl Into<String>) -> Self {
        self.arg0 = Some(arg0.into());
        self
    }

    /// Positional parameters `$1`..
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Initial exported variables. Defaults to the process environment.
    pub fn env<I, K, V>(mut self, env: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            env.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Add or replace a built-in.
    pub fn builtin(mut self, builtin: impl Builtin + 'static) -> Self {
        self.builtins.push(Arc::new(builtin));
        self
    }

    pub fn parser(mut self, parser: impl ScriptParser + 'static) -> Self {
        self.parser = Some(Box::new(parser));
        self
    }

    pub fn matcher(mut self, matcher: impl PatternMatcher + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    /// Fixed seed for `RANDOM`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Shell {
        let env = self
            .env
            .unwrap_or_else(|| std::env::vars().collect::<Vec<_>>());
        let mut vars = Variables::from_env(env);
        if !vars.is_set("PATH") {
            let _ = vars.set("PATH", DEFAULT_PATH);
        }

        let mut table = builtins::standard();
        for builtin in self.builtins {
            table.register(builtin);
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut shell = Shell {
            options: self.config.options,
            arg0: self.arg0.unwrap_or_else(|| self.config.name.clone()),
            config: self.config,
            exit_status: 0,
            vars,
            functions: HashMap::new(),
            scopes: ScopeStack::new(self.args),
            jobs: JobTable::new(),
            redirects: RedirectionManager::new(),
            checkpoints: Vec::new(),
            builtins: table,
            path: PathResolver::new(),
            matcher: self.matcher,
            parser: self.parser,
            signals: SignalWatcher::new(),
            rng,
            generation: 0,
            fn_depth: 0,
            dot_depth: 0,
            subshell_depth: 0,
            timing: 0,
            in_trap: false,
            pipeline: None,
            lineno: 0,
            pid: getpid(),
            last_bg_pid: None,
            last_arg: String::new(),
            current_command: None,
            error_count: 0,
            exited: None,
        };
        if let Err(err) = shell.signals.watch(Signal::SIGCHLD as i32) {
            debug!(error = %err, "cannot watch SIGCHLD");
        }
        if shell.config.interactive {
            if let Err(err) = shell.signals.watch(Signal::SIGINT as i32) {
                debug!(error = %err, "cannot watch SIGINT");
            }
        }
        if shell.job_control() {
            launcher::ignore_stop_signals();
        }
        debug!(
            interactive = shell.config.interactive,
            builtins = shell.builtins.len(),
            "shell ready"
        );
        shell
    }
}

pub struct Shell {
    pub(crate) config: ShellConfig,
    pub(crate) options: ShellOptions,
    pub(crate) exit_status: i32,
    pub(crate) vars: Variables,
    pub(crate) functions: HashMap<String, FunctionEntry>,
    pub(crate) scopes: ScopeStack,
    pub(crate) jobs: JobTable,
    pub(crate) redirects: RedirectionManager,
    pub(crate) checkpoints: Vec<CheckpointKind>,
    pub(crate) builtins: BuiltinTable,
    pub(crate) path: PathResolver,
    pub(crate) matcher: Box<dyn PatternMatcher>,
    pub(crate) parser: Option<Box<dyn ScriptParser>>,
    pub(crate) signals: SignalWatcher,
    pub(crate) rng: StdRng,
    /// Bumped whenever a command name may resolve differently.
    pub(crate) generation: u64,
    pub(crate) fn_depth: usize,
    pub(crate) dot_depth: usize,
    pub(crate) subshell_depth: usize,
    /// Nesting of `time`.
    pub(crate) timing: usize,
    pub(crate) in_trap: bool,
    pub(crate) pipeline: Option<PipelineCtx>,
    pub(crate) lineno: u32,
    pub(crate) arg0: String,
    pub(crate) pid: Pid,
    pub(crate) last_bg_pid: Option<Pid>,
    /// `$_`
    pub(crate) last_arg: String,
    pub(crate) current_command: Option<String>,
    pub(crate) error_count: usize,
    /// Set once the shell has decided to exit.
    pub(crate) exited: Option<i32>,
}

impl fmt::Debug for Shell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shell")
            .field("exit_status", &self.exit_status)
            .field("options", &self.options)
            .field("fn_depth", &self.fn_depth)
            .field("subshell_depth", &self.subshell_depth)
            .field("jobs", &self.jobs.len())
            .finish_non_exhaustive()
    }
}

/// State a checkpoint restores when an unwind passes through it.
struct Marks {
    fds: crate::redirect::FdMark,
    scope_depth: usize,
    frame_depth: usize,
    loops: crate::scope::LoopState,
    fn_depth: usize,
    dot_depth: usize,
    in_trap: bool,
    pipeline: Option<PipelineCtx>,
}

impl Shell {
    pub fn builder() -> ShellBuilder {
        ShellBuilder::new()
    }

    /// Run a tree as a script or one interactive command. Unwinds are
    /// absorbed here; after an exit, further calls do nothing.
    ///
    /// Execution recurses on the calling thread's stack. With the default
    /// depth limits call this from a thread with a large stack (see
    /// [`ShellConfig::max_function_depth`]).
    pub fn run(&mut self, tree: &Node) -> i32 {
        if let Some(status) = self.exited {
            return status;
        }
        let mut flags = ExecFlags::ERREXIT;
        if !self.config.interactive && self.config.exec_last_command {
            flags |= ExecFlags::NO_FORK;
        }
        let result = self.guarded(CheckpointKind::TopLevel, Catch::All, |sh| {
            sh.execute(tree, flags)
        });
        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(unwind)) | Err(unwind) => self.absorb_top_level(unwind),
        };
        self.exit_status = status;
        status
    }

    fn absorb_top_level(&mut self, unwind: Unwind) -> i32 {
        let interactive = self.config.interactive;
        let status = match unwind.kind {
            UnwindKind::Error(err) => {
                self.report(&err);
                if !interactive || err.is_fatal() {
                    self.exited = Some(err.status());
                }
                return err.status();
            }
            UnwindKind::Interrupt if interactive => {
                let _ = writeln!(io::stderr());
                return unwind.status;
            }
            _ => unwind.status,
        };
        if !interactive || unwind.level >= JumpLevel::ErrExit {
            debug!(status, reason = %unwind, "shell exiting");
            self.exited = Some(status);
        }
        status
    }

    /// Run the EXIT trap and return the final exit status.
    pub fn finish(&mut self) -> i32 {
        let mut status = self.exited.unwrap_or(self.exit_status);
        self.exit_status = status;
        if let Some(trap_status) = self.run_exit_trap() {
            status = trap_status;
        }
        self.exited = Some(status);
        flush_stdio();
        status & 0xff
    }

    /// Run and consume the current scope's EXIT trap. Returns a new status
    /// when the trap called `exit`.
    pub(crate) fn run_exit_trap(&mut self) -> Option<i32> {
        let trap = self.scopes.current_mut().traps.clear(TrapCondition::Exit)?;
        let action = trap.action?;
        self.run_trap_action(TrapCondition::Exit, &action)
            .err()
            .map(|unwind| unwind.status)
    }

    /// Run `f` under a checkpoint. The outer `Result` carries unwinds the
    /// checkpoint does not catch; the inner one carries caught unwinds.
    /// Either way descriptors, scopes and variable frames are restored to
    /// their state on entry.
    pub fn guarded<T>(
        &mut self,
        kind: CheckpointKind,
        catch: Catch,
        f: impl FnOnce(&mut Shell) -> Result<T, Unwind>,
    ) -> Result<Result<T, Unwind>, Unwind> {
        let marks = Marks {
            fds: self.redirects.mark(),
            scope_depth: self.scopes.depth(),
            frame_depth: self.vars.depth(),
            loops: self.scopes.current().loops,
            fn_depth: self.fn_depth,
            dot_depth: self.dot_depth,
            in_trap: self.in_trap,
            pipeline: self.pipeline,
        };
        self.checkpoints.push(kind);
        let result = f(self);
        self.checkpoints.pop();
        match result {
            Ok(value) => Ok(Ok(value)),
            Err(unwind) => {
                self.restore_marks(marks);
                if catch.catches(unwind.level) {
                    debug!(?kind, reason = %unwind, "unwind caught");
                    Ok(Err(unwind))
                } else {
                    Err(unwind)
                }
            }
        }
    }

    fn restore_marks(&mut self, marks: Marks) {
        self.redirects.restore(marks.fds);
        self.scopes.truncate(marks.scope_depth);
        self.vars.truncate(marks.frame_depth);
        self.scopes.current_mut().loops = marks.loops;
        self.fn_depth = marks.fn_depth;
        self.dot_depth = marks.dot_depth;
        self.in_trap = marks.in_trap;
        self.pipeline = marks.pipeline;
    }

    pub(crate) fn in_checkpoint(&self, kind: CheckpointKind) -> bool {
        self.checkpoints.contains(&kind)
    }

    /// Level at which a fatal error unwinds.
    pub(crate) fn fatal_level(&self) -> JumpLevel {
        if self.config.interactive {
            JumpLevel::Cmd
        } else {
            JumpLevel::Exit
        }
    }

    /// Print a diagnostic and turn a surfaced error into a status or, for
    /// fatal errors, an abort.
    pub(crate) fn fail(&mut self, err: ExecError) -> Result<i32, Unwind> {
        self.report(&err);
        let status = err.status();
        if err.is_fatal() {
            return Err(Unwind::abort(status, self.fatal_level()));
        }
        Ok(status)
    }

    /// Write `tern: line N: message` to standard error.
    pub(crate) fn report(&mut self, message: &dyn fmt::Display) {
        self.error_count += 1;
        let location = Location::line(self.lineno);
        warn!(line = self.lineno, "{message}");
        let mut stderr = io::stderr().lock();
        let _ = if location.is_unknown() {
            writeln!(stderr, "{}: {message}", self.config.name)
        } else {
            writeln!(stderr, "{}: {location}: {message}", self.config.name)
        };
        let _ = stderr.flush();
    }

    /// Drain signal notices. Runs at safe points only.
    pub fn check_signals(&mut self) -> Result<(), Unwind> {
        for signal in self.signals.take_pending() {
            let condition = TrapCondition::Signal(signal);
            let trap = self.scopes.current().traps.get(condition).cloned();
            if signal == Signal::SIGCHLD as i32 {
                self.jobs.notify();
                if trap.as_ref().is_some_and(|t| !t.is_ignore()) {
                    self.run_trap(condition)?;
                }
                continue;
            }
            match trap {
                Some(trap) if trap.is_ignore() => {}
                Some(_) => {
                    self.run_trap(condition)?;
                }
                None if self.config.interactive => {
                    if signal == Signal::SIGINT as i32 {
                        return Err(Unwind::interrupt(signal));
                    }
                }
                None => {
                    debug!(signal, "no trap, taking default action");
                    flush_stdio();
                    signals::default_action(signal);
                }
            }
        }
        Ok(())
    }

    /// Run the trap for `condition` in the current scope, if any. `$?` is
    /// preserved across the handler.
    pub(crate) fn run_trap(&mut self, condition: TrapCondition) -> Result<Option<i32>, Unwind> {
        if self.in_trap && matches!(condition, TrapCondition::Err | TrapCondition::Debug) {
            return Ok(None);
        }
        let Some(action) = self.scopes.current().traps.action(condition) else {
            return Ok(None);
        };
        self.run_trap_action(condition, &action).map(Some)
    }

    fn run_trap_action(&mut self, condition: TrapCondition, action: &Node) -> Result<i32, Unwind> {
        debug!(%condition, "running trap");
        let saved_status = self.exit_status;
        let saved_lineno = self.lineno;
        let was_in_trap = std::mem::replace(&mut self.in_trap, true);
        let result = self.guarded(CheckpointKind::Trap, Catch::UpTo(JumpLevel::Trap), |sh| {
            sh.execute(action, ExecFlags::empty())
        });
        self.in_trap = was_in_trap;
        self.lineno = saved_lineno;
        let status = match result {
            Ok(Ok(status)) => status,
            Ok(Err(unwind)) => unwind.status,
            Err(unwind) => return Err(unwind),
        };
        self.exit_status = saved_status;
        Ok(status)
    }

    /// Install or replace a trap, watching the signal when needed.
    pub fn set_trap(&mut self, condition: TrapCondition, trap: Trap) -> Result<(), ExecError> {
        if let Some(signal) = condition.signal() {
            self.signals
                .watch(signal)
                .map_err(|_| ExecError::BadTrap(condition.to_string()))?;
        }
        self.scopes.current_mut().traps.set(condition, trap);
        Ok(())
    }

    pub fn clear_trap(&mut self, condition: TrapCondition) {
        self.scopes.current_mut().traps.clear(condition);
    }

    pub(crate) fn job_control(&self) -> bool {
        self.options.monitor && self.config.interactive && isatty(0).unwrap_or(false)
    }

    /// Define or replace a function.
    pub fn define_function(&mut self, name: impl Into<String>, body: Arc<Node>, location: Location) {
        let name = name.into();
        debug!(function = %name, "defined function");
        self.functions
            .insert(name, FunctionEntry::new(body, location));
        self.generation += 1;
    }

    /// Add or replace a built-in after construction.
    pub fn register_builtin(&mut self, builtin: impl Builtin + 'static) {
        self.builtins.register(Arc::new(builtin));
        self.generation += 1;
    }

    pub fn var(&self, name: &str) -> Option<&str> {
        self.vars.get(name)
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<String>) -> Result<(), ExecError> {
        self.vars.set(name, value)?;
        if name == "PATH" {
            self.path.forget();
            self.generation += 1;
        }
        Ok(())
    }

    pub fn vars(&self) -> &Variables {
        &self.vars
    }

    pub fn exit_status(&self) -> i32 {
        self.exit_status
    }

    pub fn has_exited(&self) -> bool {
        self.exited.is_some()
    }

    pub fn options(&self) -> &ShellOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut ShellOptions {
        &mut self.options
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn positionals(&self) -> &[String] {
        &self.scopes.current().positionals
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    pub fn jobs(&self) -> &JobTable {
        &self.jobs
    }

    pub fn last_background_pid(&self) -> Option<Pid> {
        self.last_bg_pid
    }

    /// Diagnostics printed so far.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// Current function nesting.
    pub fn function_depth(&self) -> usize {
        self.fn_depth
    }

    pub(crate) fn reseed(&mut self) {
        self.rng = StdRng::from_entropy();
    }
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
